//! Structured events.
//!
//! # Data Flow
//! ```text
//! LogCall (front-end)
//!     → bridge::EventTranslator
//!     → StructuredEvent { template, properties, level, ids }
//!     → backend::Sink::emit
//! ```
//!
//! # Design Decisions
//! - Events are built once and never mutated after hand-off
//! - Properties are a map: a later binding with the same name replaces the earlier one
//! - Correlation ids are optional; no active trace means no ids

pub mod level;
pub mod value;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::observability::tracing::{SpanId, TraceId};
use crate::template::MessageTemplate;

pub use level::{LogLevel, ParseLevelError};
pub use value::{ObjectValue, PropertyValue, ScalarValue, StateValue, StructureValue};

/// Numeric id and optional name identifying a kind of log event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventId {
    pub id: i32,
    pub name: Option<String>,
}

impl EventId {
    pub fn new(id: i32) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// True when the id carries nothing worth recording.
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.name.is_none()
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// How a property's value was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    AsScalar,
    Destructure,
    Stringify,
}

/// A named, captured property.
#[derive(Debug, Clone, PartialEq)]
pub struct EventProperty {
    pub name: String,
    pub value: PropertyValue,
    pub capture: CaptureMode,
}

impl EventProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue, capture: CaptureMode) -> Self {
        Self {
            name: name.into(),
            value,
            capture,
        }
    }
}

/// Snapshot of an error attached to a log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub message: String,
    /// Messages of the `source()` chain, outermost first.
    pub causes: Vec<String>,
}

impl ExceptionInfo {
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }
}

impl std::fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// A fully translated log event, ready for a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub exception: Option<ExceptionInfo>,
    pub message_template: Arc<MessageTemplate>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
}

impl StructuredEvent {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Render the template against the event's properties.
    pub fn render_message(&self) -> String {
        self.message_template.render(&self.properties)
    }

    /// Compact JSON form: `@`-prefixed well-known fields followed by the
    /// properties. Property names starting with `@` are escaped as `@@`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "@t".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        map.insert(
            "@mt".to_string(),
            Value::String(self.message_template.text().to_string()),
        );
        map.insert("@m".to_string(), Value::String(self.render_message()));
        if self.level != LogLevel::Information {
            map.insert("@l".to_string(), Value::String(self.level.to_string()));
        }
        if let Some(exception) = &self.exception {
            map.insert("@x".to_string(), Value::String(exception.to_string()));
        }
        if let Some(trace_id) = &self.trace_id {
            map.insert("@tr".to_string(), Value::String(trace_id.to_string()));
        }
        if let Some(span_id) = &self.span_id {
            map.insert("@sp".to_string(), Value::String(span_id.to_string()));
        }
        for (name, value) in &self.properties {
            let key = if name.starts_with('@') {
                format!("@{}", name)
            } else {
                name.clone()
            };
            map.insert(key, value.to_json());
        }
        Value::Object(map)
    }
}
