//! In-memory sink.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Sink, SinkControl};
use crate::event::{EventProperty, LogLevel, StateValue, StructuredEvent};

/// Keeps emitted events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StructuredEvent>>,
    control: SinkControl,
}

impl MemorySink {
    pub fn new(control: SinkControl) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            control,
        }
    }

    pub fn control(&self) -> &SinkControl {
        &self.control
    }

    pub fn events(&self) -> Vec<StructuredEvent> {
        self.lock().clone()
    }

    /// Remove and return everything captured so far.
    pub fn take(&self) -> Vec<StructuredEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StructuredEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for MemorySink {
    fn is_enabled(&self, level: LogLevel) -> bool {
        self.control.is_enabled(level)
    }

    fn emit(&self, event: StructuredEvent) {
        self.lock().push(event);
    }

    fn bind_property(&self, name: &str, value: &StateValue, destructure: bool) -> Option<EventProperty> {
        self.control.bind(name, value, destructure)
    }
}
