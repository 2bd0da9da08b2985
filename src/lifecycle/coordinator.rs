//! Start/stop coordination for groups of host resources.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use super::host::HostSignal;
use super::LifecycleError;

type AttachFn = Box<dyn Fn() -> Result<(), LifecycleError> + Send + Sync>;
type DetachFn = Box<dyn Fn() + Send + Sync>;

/// A resource and the pair of hooks that wire it to the host.
pub struct ResourceBinding {
    name: String,
    attach: AttachFn,
    detach: DetachFn,
}

impl ResourceBinding {
    pub fn new<A, D>(name: impl Into<String>, attach: A, detach: D) -> Self
    where
        A: Fn() -> Result<(), LifecycleError> + Send + Sync + 'static,
        D: Fn() + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            attach: Box::new(attach),
            detach: Box::new(detach),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Attaches its bindings on host start and detaches them on host stop.
#[derive(Debug)]
pub struct LifecycleCoordinator {
    name: String,
    bindings: Vec<ResourceBinding>,
    // Number of bindings currently attached; always a prefix of `bindings`.
    attached: Mutex<usize>,
}

impl LifecycleCoordinator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            attached: Mutex::new(0),
        }
    }

    pub fn with_binding(mut self, binding: ResourceBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn add(&mut self, binding: ResourceBinding) {
        self.bindings.push(binding);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_running(&self) -> bool {
        !self.bindings.is_empty() && *self.attached() == self.bindings.len()
    }

    /// Attach every binding in registration order.
    ///
    /// On failure, bindings attached so far are detached again and the
    /// error is returned.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let mut attached = self.attached();
        if *attached == self.bindings.len() && *attached > 0 {
            return Ok(());
        }

        for binding in &self.bindings[*attached..] {
            if let Err(e) = (binding.attach)() {
                warn!(coordinator = %self.name, resource = %binding.name, error = %e, "Attach failed, rolling back");
                detach_all(&self.name, &self.bindings[..*attached]);
                *attached = 0;
                return Err(e);
            }
            debug!(coordinator = %self.name, resource = %binding.name, "Resource attached");
            *attached += 1;
        }

        info!(coordinator = %self.name, resources = *attached, "Coordinator started");
        Ok(())
    }

    /// Detach attached bindings in reverse order.
    pub fn stop(&self) {
        let mut attached = self.attached();
        if *attached == 0 {
            return;
        }
        detach_all(&self.name, &self.bindings[..*attached]);
        *attached = 0;
        info!(coordinator = %self.name, "Coordinator stopped");
    }

    /// Follow host signals until the host goes away, then stop.
    pub async fn run(&self, mut signals: broadcast::Receiver<HostSignal>) {
        loop {
            match signals.recv().await {
                Ok(HostSignal::Start) => {
                    if let Err(e) = self.start() {
                        error!(coordinator = %self.name, error = %e, "Coordinator failed to start");
                    }
                }
                Ok(HostSignal::Stop) => self.stop(),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(coordinator = %self.name, skipped, "Missed host signals");
                }
                Err(RecvError::Closed) => break,
            }
        }
        self.stop();
    }

    fn attached(&self) -> MutexGuard<'_, usize> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn detach_all(coordinator: &str, bindings: &[ResourceBinding]) {
    for binding in bindings.iter().rev() {
        (binding.detach)();
        debug!(coordinator = %coordinator, resource = %binding.name, "Resource detached");
    }
}
