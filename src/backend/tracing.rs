//! Sink that forwards rendered events into `tracing`.
//!
//! Lets a host route translated events through the same subscriber as its
//! own diagnostics. Events are recorded under the `logbridge::events` target
//! with the template, the properties as JSON, and the correlation ids.

use super::{Sink, SinkControl};
use crate::event::{EventProperty, LogLevel, StateValue, StructuredEvent};

pub const EVENT_TARGET: &str = "logbridge::events";

#[derive(Debug, Default, Clone)]
pub struct TracingSink {
    control: SinkControl,
}

impl TracingSink {
    pub fn new(control: SinkControl) -> Self {
        Self { control }
    }
}

impl Sink for TracingSink {
    fn is_enabled(&self, level: LogLevel) -> bool {
        self.control.is_enabled(level)
    }

    fn emit(&self, event: StructuredEvent) {
        let message = event.render_message();
        let template = event.message_template.text();
        let properties = serde_json::Value::Object(
            event
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        );
        let trace_id = event.trace_id.map(|t| t.to_string()).unwrap_or_default();
        let span_id = event.span_id.map(|s| s.to_string()).unwrap_or_default();
        let exception = event.exception.as_ref().map(ToString::to_string).unwrap_or_default();

        macro_rules! forward {
            ($level:expr) => {
                ::tracing::event!(
                    target: EVENT_TARGET,
                    $level,
                    template,
                    %properties,
                    trace_id = %trace_id,
                    span_id = %span_id,
                    exception = %exception,
                    "{}",
                    message
                )
            };
        }

        match event.level {
            LogLevel::Trace => forward!(::tracing::Level::TRACE),
            LogLevel::Debug => forward!(::tracing::Level::DEBUG),
            LogLevel::Information => forward!(::tracing::Level::INFO),
            LogLevel::Warning => forward!(::tracing::Level::WARN),
            LogLevel::Error | LogLevel::Critical => forward!(::tracing::Level::ERROR),
            LogLevel::None => {}
        }
    }

    fn bind_property(&self, name: &str, value: &StateValue, destructure: bool) -> Option<EventProperty> {
        self.control.bind(name, value, destructure)
    }
}
