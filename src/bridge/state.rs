//! Front-end log state.
//!
//! A log call carries either a list of keyed properties (what a front-end
//! produces for `"Hello {Name}"`-style calls, or any other keyed state) or a
//! single opaque value. The translator inspects nothing else.

use std::error::Error as StdError;

use crate::event::{CaptureMode, StateValue};
use crate::template::{MessageTemplate, PropertyToken, TemplateToken};

/// Key under which a front-end passes the unformatted message template.
pub const ORIGINAL_FORMAT_KEY: &str = "{OriginalFormat}";

/// Prefix marking a key whose value should be destructured.
pub const DESTRUCTURE_SIGIL: char = '@';

/// Prefix marking a key whose value should be stringified.
pub const STRINGIFY_SIGIL: char = '$';

/// Renders a state (and optionally an error) into a message.
///
/// Returning `None` means "nothing to say"; the translator then falls back
/// to the raw state.
pub type Formatter =
    dyn Fn(Option<&LogState>, Option<&(dyn StdError + 'static)>) -> Option<String> + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
pub enum LogState {
    Properties(PropertyList),
    Value(StateValue),
}

/// Ordered keyed properties.
///
/// `type_name` names the state's own (non-generic) type, if it has one. When
/// no template is supplied, that name becomes the event's single property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    pub type_name: Option<String>,
    pub entries: Vec<(String, StateValue)>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl LogState {
    /// State for a templated call: one entry per hole, in template order,
    /// paired positionally with `args`, followed by the template itself.
    ///
    /// Holes keep their `@`/`$` prefix in the key. Holes without a matching
    /// argument get null; surplus arguments are dropped.
    pub fn formatted(template: &str, args: Vec<StateValue>) -> Self {
        let parsed = MessageTemplate::parse(template);
        let mut args = args.into_iter();
        let mut entries: Vec<(String, StateValue)> = parsed
            .properties()
            .map(|hole| (state_key(hole), args.next().unwrap_or(StateValue::Null)))
            .collect();
        entries.push((ORIGINAL_FORMAT_KEY.to_string(), StateValue::Str(template.to_string())));
        LogState::Properties(PropertyList {
            type_name: None,
            entries,
        })
    }

    pub fn value(value: impl Into<StateValue>) -> Self {
        LogState::Value(value.into())
    }

    /// True only for an opaque null value.
    pub fn is_null(&self) -> bool {
        matches!(self, LogState::Value(StateValue::Null))
    }

    pub fn original_format(&self) -> Option<&str> {
        match self {
            LogState::Properties(list) => list.get(ORIGINAL_FORMAT_KEY).and_then(StateValue::as_str),
            LogState::Value(_) => None,
        }
    }

    /// The state as a plain value, for binding when no formatter output exists.
    pub fn to_value(&self) -> StateValue {
        match self {
            LogState::Value(v) => v.clone(),
            LogState::Properties(list) => StateValue::Map(list.entries.clone()),
        }
    }
}

impl From<PropertyList> for LogState {
    fn from(list: PropertyList) -> Self {
        LogState::Properties(list)
    }
}

impl From<StateValue> for LogState {
    fn from(value: StateValue) -> Self {
        LogState::Value(value)
    }
}

/// Default formatter.
///
/// Keyed state with a template renders the template with each value's plain
/// text (`(null)` for null). An opaque non-null value renders as itself.
/// Anything else yields `None`.
pub fn format_state(
    state: Option<&LogState>,
    _exception: Option<&(dyn StdError + 'static)>,
) -> Option<String> {
    match state? {
        LogState::Value(StateValue::Null) => None,
        LogState::Value(v) => Some(v.to_string()),
        LogState::Properties(list) => {
            let template = list.get(ORIGINAL_FORMAT_KEY)?.as_str()?;
            Some(render_plain(template, list))
        }
    }
}

/// Key a front-end uses for `hole`: its name with the capture sigil restored.
fn state_key(hole: &PropertyToken) -> String {
    match hole.capture {
        CaptureMode::Destructure => format!("{}{}", DESTRUCTURE_SIGIL, hole.name),
        CaptureMode::Stringify => format!("{}{}", STRINGIFY_SIGIL, hole.name),
        CaptureMode::AsScalar => hole.name.clone(),
    }
}

fn render_plain(template: &str, list: &PropertyList) -> String {
    let parsed = MessageTemplate::parse(template);
    let mut out = String::with_capacity(template.len());
    for token in parsed.tokens() {
        match token {
            TemplateToken::Text(text) => out.push_str(text),
            TemplateToken::Property(hole) => {
                match list.get(&state_key(hole)) {
                    Some(StateValue::Null) => out.push_str("(null)"),
                    Some(StateValue::Seq(items)) => {
                        let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                        out.push_str(&joined.join(", "));
                    }
                    Some(value) => out.push_str(&value.to_string()),
                    None => out.push_str(&hole.raw),
                }
            }
        }
    }
    out
}
