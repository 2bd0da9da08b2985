//! Host UI toggle events and the surfaces that answer them.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::coordinator::ResourceBinding;
use super::LifecycleError;

/// UI toggle events raised by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostToggle {
    MainUi,
    ConfigUi,
}

/// Role of a UI surface, derived from its type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRole {
    Primary,
    Secondary,
}

impl ResourceRole {
    /// `…MainWindow` is primary, `…ConfigWindow` is secondary.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        if short.ends_with("MainWindow") {
            Some(ResourceRole::Primary)
        } else if short.ends_with("ConfigWindow") {
            Some(ResourceRole::Secondary)
        } else {
            None
        }
    }

    pub fn toggle(&self) -> HostToggle {
        match self {
            ResourceRole::Primary => HostToggle::MainUi,
            ResourceRole::Secondary => HostToggle::ConfigUi,
        }
    }
}

/// A UI surface the host can show or hide.
pub trait UiSurface: Send + Sync {
    fn type_name(&self) -> &str;
    fn toggle(&self);
}

pub type ToggleHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscriber lists per toggle event.
#[derive(Default)]
pub struct ToggleBus {
    handlers: DashMap<HostToggle, Vec<(SubscriptionId, ToggleHandler)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ToggleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleBus")
            .field("main_ui", &self.subscriber_count(HostToggle::MainUi))
            .field("config_ui", &self.subscriber_count(HostToggle::ConfigUi))
            .finish()
    }
}

impl ToggleBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, toggle: HostToggle, handler: ToggleHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.entry(toggle).or_default().push((id, handler));
        id
    }

    pub fn unsubscribe(&self, toggle: HostToggle, id: SubscriptionId) -> bool {
        match self.handlers.get_mut(&toggle) {
            Some(mut list) => {
                let before = list.len();
                list.retain(|(existing, _)| *existing != id);
                list.len() != before
            }
            None => false,
        }
    }

    /// Invoke every handler for `toggle`; returns how many ran.
    pub fn raise(&self, toggle: HostToggle) -> usize {
        // Handlers run outside the shard lock so they may (un)subscribe.
        let handlers: Vec<ToggleHandler> = self
            .handlers
            .get(&toggle)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler();
        }
        tracing::debug!(?toggle, handlers = handlers.len(), "Toggle raised");
        handlers.len()
    }

    pub fn subscriber_count(&self, toggle: HostToggle) -> usize {
        self.handlers.get(&toggle).map_or(0, |list| list.len())
    }
}

/// Binding that routes the surface's role toggle to [`UiSurface::toggle`]
/// while attached.
pub fn surface_binding(
    bus: Arc<ToggleBus>,
    surface: Arc<dyn UiSurface>,
) -> Result<ResourceBinding, LifecycleError> {
    let type_name = surface.type_name().to_string();
    let toggle = ResourceRole::from_type_name(&type_name)
        .ok_or_else(|| LifecycleError::UnknownRole(type_name.clone()))?
        .toggle();
    let subscription: Arc<Mutex<Option<SubscriptionId>>> = Arc::default();

    let attach = {
        let bus = bus.clone();
        let subscription = subscription.clone();
        move || {
            let surface = surface.clone();
            let id = bus.subscribe(toggle, Arc::new(move || surface.toggle()));
            *subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
            Ok(())
        }
    };
    let detach = move || {
        let id = subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = id {
            bus.unsubscribe(toggle, id);
        }
    };

    Ok(ResourceBinding::new(type_name, attach, detach))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleCoordinator;
    use std::sync::atomic::AtomicUsize;

    struct Window {
        name: &'static str,
        toggled: AtomicUsize,
    }

    impl Window {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                toggled: AtomicUsize::new(0),
            })
        }
    }

    impl UiSurface for Window {
        fn type_name(&self) -> &str {
            self.name
        }

        fn toggle(&self) {
            self.toggled.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_role_from_type_name() {
        assert_eq!(ResourceRole::from_type_name("StatsMainWindow"), Some(ResourceRole::Primary));
        assert_eq!(
            ResourceRole::from_type_name("plugin::ui::ConfigWindow"),
            Some(ResourceRole::Secondary)
        );
        assert_eq!(ResourceRole::from_type_name("Overlay"), None);
        assert_eq!(ResourceRole::Secondary.toggle(), HostToggle::ConfigUi);
    }

    #[test]
    fn test_unknown_surface_is_rejected() {
        let bus = Arc::new(ToggleBus::new());
        let err = surface_binding(bus, Window::new("Overlay")).unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownRole(name) if name == "Overlay"));
    }

    #[test]
    fn test_surfaces_follow_coordinator() {
        let bus = Arc::new(ToggleBus::new());
        let main = Window::new("MainWindow");
        let config = Window::new("ConfigWindow");
        let coordinator = LifecycleCoordinator::new("windows")
            .with_binding(surface_binding(bus.clone(), main.clone()).unwrap())
            .with_binding(surface_binding(bus.clone(), config.clone()).unwrap());

        assert_eq!(bus.raise(HostToggle::MainUi), 0);

        coordinator.start().unwrap();
        assert_eq!(bus.raise(HostToggle::MainUi), 1);
        assert_eq!(bus.raise(HostToggle::ConfigUi), 1);
        assert_eq!(main.toggled.load(Ordering::SeqCst), 1);
        assert_eq!(config.toggled.load(Ordering::SeqCst), 1);

        coordinator.stop();
        assert_eq!(bus.subscriber_count(HostToggle::MainUi), 0);
        assert_eq!(bus.raise(HostToggle::ConfigUi), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_id() {
        let bus = ToggleBus::new();
        let id = bus.subscribe(HostToggle::MainUi, Arc::new(|| {}));
        assert!(bus.unsubscribe(HostToggle::MainUi, id));
        assert!(!bus.unsubscribe(HostToggle::MainUi, id));
        assert!(!bus.unsubscribe(HostToggle::ConfigUi, id));
    }
}
