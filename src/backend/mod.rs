//! Structured-logging backend.
//!
//! # Data Flow
//! ```text
//! bridge::EventTranslator
//!     → Sink::is_enabled(level)          (checked before any work)
//!     → Sink::bind_property(name, value) (fallback capture path)
//!     → Sink::emit(StructuredEvent)
//!         → json.rs    (compact JSON lines to stderr/stdout)
//!         → memory.rs  (in-process capture)
//!         → tracing.rs (forward into the tracing subscriber)
//! ```
//!
//! # Design Decisions
//! - Sinks share a [`SinkControl`]; hot reload swaps its settings atomically
//! - A minimum level of `None` turns a sink off entirely

pub mod capture;
pub mod json;
pub mod memory;
pub mod tracing;

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::config::schema::{BridgeConfig, SinkKind};
use crate::event::{EventProperty, LogLevel, StateValue, StructuredEvent};

pub use capture::CaptureLimits;
pub use json::{JsonLineSink, LineWriter, StderrWriter, StdoutWriter};
pub use memory::MemorySink;
pub use self::tracing::TracingSink;

/// Destination for translated events.
pub trait Sink: Send + Sync {
    /// Whether events at `level` would be kept.
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Hand off a finished event.
    fn emit(&self, event: StructuredEvent);

    /// Capture `value` as a property named `name`.
    ///
    /// Returns `None` when the property cannot be bound; callers drop it.
    fn bind_property(
        &self,
        name: &str,
        value: &StateValue,
        destructure: bool,
    ) -> Option<EventProperty> {
        capture::bind_property(name, value, destructure, &CaptureLimits::default())
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn is_enabled(&self, level: LogLevel) -> bool {
        (**self).is_enabled(level)
    }

    fn emit(&self, event: StructuredEvent) {
        (**self).emit(event)
    }

    fn bind_property(
        &self,
        name: &str,
        value: &StateValue,
        destructure: bool,
    ) -> Option<EventProperty> {
        (**self).bind_property(name, value, destructure)
    }
}

/// Build the sink selected by `logging.sink`, sharing `control`.
pub fn sink_from_config(kind: SinkKind, control: SinkControl) -> Arc<dyn Sink> {
    match kind {
        SinkKind::Stderr => Arc::new(JsonLineSink::new(StderrWriter, control)),
        SinkKind::Stdout => Arc::new(JsonLineSink::new(StdoutWriter, control)),
        SinkKind::Tracing => Arc::new(TracingSink::new(control)),
    }
}

/// Runtime-adjustable sink settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSettings {
    pub minimum_level: LogLevel,
    pub limits: CaptureLimits,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

impl SinkSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            minimum_level: config.logging.minimum_level,
            limits: CaptureLimits::from(&config.capture),
        }
    }
}

/// Shared handle to [`SinkSettings`]; clones observe the same settings.
#[derive(Debug, Clone)]
pub struct SinkControl {
    settings: Arc<ArcSwap<SinkSettings>>,
}

impl SinkControl {
    pub fn new(settings: SinkSettings) -> Self {
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(SinkSettings::from_config(config))
    }

    pub fn settings(&self) -> Arc<SinkSettings> {
        self.settings.load_full()
    }

    pub fn minimum_level(&self) -> LogLevel {
        self.settings.load().minimum_level
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level >= self.minimum_level()
    }

    /// Replace all settings from a freshly loaded configuration.
    pub fn apply(&self, config: &BridgeConfig) {
        let next = SinkSettings::from_config(config);
        let previous = self.settings.swap(Arc::new(next.clone()));
        if previous.minimum_level != next.minimum_level {
            ::tracing::info!(
                from = %previous.minimum_level,
                to = %next.minimum_level,
                "Sink minimum level changed"
            );
        }
    }

    pub fn set_minimum_level(&self, level: LogLevel) {
        self.settings.rcu(|current| SinkSettings {
            minimum_level: level,
            limits: current.limits.clone(),
        });
    }

    pub(crate) fn bind(&self, name: &str, value: &StateValue, destructure: bool) -> Option<EventProperty> {
        capture::bind_property(name, value, destructure, &self.settings.load().limits)
    }
}

impl Default for SinkControl {
    fn default() -> Self {
        Self::new(SinkSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let control = SinkControl::default();
        assert!(!control.is_enabled(LogLevel::Debug));
        assert!(control.is_enabled(LogLevel::Information));
        assert!(control.is_enabled(LogLevel::Critical));
        assert!(!control.is_enabled(LogLevel::None));
    }

    #[test]
    fn test_none_minimum_disables_everything() {
        let control = SinkControl::default();
        control.set_minimum_level(LogLevel::None);
        for level in LogLevel::EMITTING {
            assert!(!control.is_enabled(level));
        }
    }

    #[test]
    fn test_sink_from_config_shares_control() {
        let control = SinkControl::default();
        let sink = sink_from_config(SinkKind::Tracing, control.clone());
        assert!(!sink.is_enabled(LogLevel::Debug));
        control.set_minimum_level(LogLevel::Debug);
        assert!(sink.is_enabled(LogLevel::Debug));
    }

    #[test]
    fn test_clones_share_settings() {
        let control = SinkControl::default();
        let observer = control.clone();

        let mut config = BridgeConfig::default();
        config.logging.minimum_level = LogLevel::Trace;
        config.capture.max_depth = 3;
        control.apply(&config);

        assert!(observer.is_enabled(LogLevel::Trace));
        assert_eq!(observer.settings().limits.max_depth, 3);
    }
}
