//! Named command handlers.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::coordinator::ResourceBinding;
use super::LifecycleError;

/// Handler invoked with the command's argument string.
pub type CommandHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Command name → handler table. Names compare case-insensitively.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: DashMap<String, CommandHandler>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, handler: CommandHandler) -> Result<(), LifecycleError> {
        match self.handlers.entry(command_key(name)) {
            Entry::Occupied(_) => Err(LifecycleError::DuplicateCommand(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(command = %name, "Command registered");
                Ok(())
            }
        }
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.handlers.remove(&command_key(name)).is_some()
    }

    /// Run the handler for `name`; `false` when none is registered.
    pub fn invoke(&self, name: &str, args: &str) -> bool {
        let handler = self.handlers.get(&command_key(name)).map(|h| h.value().clone());
        match handler {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&command_key(name))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

fn command_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Binding that registers `handler` under `name` while attached.
pub fn command_binding(
    registry: Arc<CommandRegistry>,
    name: impl Into<String>,
    handler: CommandHandler,
) -> ResourceBinding {
    let name = name.into();
    let attach = {
        let registry = registry.clone();
        let name = name.clone();
        move || registry.register(&name, handler.clone())
    };
    let detach = {
        let name = name.clone();
        move || {
            registry.unregister(&name);
        }
    };
    ResourceBinding::new(name, attach, detach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleCoordinator;
    use std::sync::Mutex;

    #[test]
    fn test_register_invoke_unregister() {
        let registry = CommandRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry
            .register("/stats", Arc::new(move |args: &str| sink.lock().unwrap().push(args.to_string())))
            .unwrap();

        assert!(registry.invoke("/STATS", "reset"));
        assert!(!registry.invoke("/other", ""));
        assert_eq!(*seen.lock().unwrap(), vec!["reset"]);

        assert!(registry.unregister("/stats"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = CommandRegistry::new();
        registry.register("/a", Arc::new(|_: &str| {})).unwrap();
        let err = registry.register("/A", Arc::new(|_: &str| {})).unwrap_err();
        assert!(matches!(err, LifecycleError::DuplicateCommand(_)));
    }

    #[test]
    fn test_duplicate_rolls_back_coordinator() {
        let registry = Arc::new(CommandRegistry::new());
        let coordinator = LifecycleCoordinator::new("commands")
            .with_binding(command_binding(registry.clone(), "/one", Arc::new(|_: &str| {})))
            .with_binding(command_binding(registry.clone(), "/ONE", Arc::new(|_: &str| {})));

        assert!(coordinator.start().is_err());
        assert!(registry.is_empty());
    }
}
