//! Generic property binder.
//!
//! Turns front-end values into captured [`PropertyValue`]s:
//! - scalars stay scalars
//! - sequences and maps are captured element by element
//! - objects are destructured into structures when asked, otherwise kept as
//!   their printed form
//!
//! Capture is bounded by [`CaptureLimits`]; values nested deeper than
//! `max_depth` become null.

use crate::config::schema::CaptureConfig;
use crate::event::{CaptureMode, EventProperty, PropertyValue, ScalarValue, StateValue, StructureValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLimits {
    pub max_depth: usize,
    pub max_string_length: Option<usize>,
    pub max_collection_count: Option<usize>,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for CaptureLimits {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_string_length: config.max_string_length,
            max_collection_count: config.max_collection_count,
        }
    }
}

/// Bind `value` under `name`. Blank names cannot be bound.
pub fn bind_property(
    name: &str,
    value: &StateValue,
    destructure: bool,
    limits: &CaptureLimits,
) -> Option<EventProperty> {
    if name.trim().is_empty() {
        return None;
    }
    let capture = if destructure {
        CaptureMode::Destructure
    } else {
        CaptureMode::AsScalar
    };
    Some(EventProperty::new(
        name,
        capture_value(value, destructure, limits, 0),
        capture,
    ))
}

/// The value's printed form as a string scalar; null stays null.
pub fn stringify(value: &StateValue) -> PropertyValue {
    match value {
        StateValue::Null => PropertyValue::null(),
        StateValue::Str(s) => PropertyValue::string(s.as_str()),
        other => PropertyValue::string(other.to_string()),
    }
}

fn capture_value(
    value: &StateValue,
    destructure: bool,
    limits: &CaptureLimits,
    depth: usize,
) -> PropertyValue {
    if depth > limits.max_depth {
        return PropertyValue::null();
    }
    let take = limits.max_collection_count.unwrap_or(usize::MAX);
    match value {
        StateValue::Null => PropertyValue::null(),
        StateValue::Bool(b) => PropertyValue::Scalar(ScalarValue::Bool(*b)),
        StateValue::Int(i) => PropertyValue::Scalar(ScalarValue::Int(*i)),
        StateValue::Long(i) => PropertyValue::Scalar(ScalarValue::Long(*i)),
        StateValue::UInt(u) => PropertyValue::Scalar(ScalarValue::UInt(*u)),
        StateValue::Float(x) => PropertyValue::Scalar(ScalarValue::Float(*x)),
        StateValue::Str(s) => PropertyValue::string(truncate(s, limits)),
        StateValue::Seq(items) => PropertyValue::Sequence(
            items
                .iter()
                .take(take)
                .map(|item| capture_value(item, destructure, limits, depth + 1))
                .collect(),
        ),
        StateValue::Map(entries) => PropertyValue::Dictionary(
            entries
                .iter()
                .take(take)
                .map(|(k, v)| (k.clone(), capture_value(v, destructure, limits, depth + 1)))
                .collect(),
        ),
        StateValue::Object(obj) if destructure => PropertyValue::Structure(StructureValue {
            type_tag: Some(obj.type_name.clone()),
            properties: obj
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), capture_value(v, destructure, limits, depth + 1)))
                .collect(),
        }),
        StateValue::Object(_) => PropertyValue::Captured(truncate(&value.to_string(), limits)),
    }
}

fn truncate(s: &str, limits: &CaptureLimits) -> String {
    match limits.max_string_length {
        Some(max) if s.chars().count() > max => {
            let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
            out.push('…');
            out
        }
        _ => s.to_string(),
    }
}
