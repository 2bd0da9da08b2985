//! Log call → structured event translation.
//!
//! # Responsibilities
//! - Pick the message template (supplied, type-name fallback, or generic)
//! - Bind every state entry as a property, honouring `@` / `$` key prefixes
//! - Attach event id, exception and ambient trace ids
//! - Prefix the template with `[plugin] [category] `
//!
//! # Design Decisions
//! - Never fails: malformed state degrades to a single-property template
//! - Enabled check happens before any allocation
//! - Plain scalars with well-formed names skip the sink's binder

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::sigil::SigilCache;
use super::state::{LogState, PropertyList, DESTRUCTURE_SIGIL, ORIGINAL_FORMAT_KEY, STRINGIFY_SIGIL};
use super::LogCall;
use crate::backend::{capture, Sink};
use crate::cache::DEFAULT_CAPACITY;
use crate::config::schema::CacheConfig;
use crate::event::{
    EventId, ExceptionInfo, LogLevel, PropertyValue, ScalarValue, StateValue, StructureValue,
    StructuredEvent,
};
use crate::observability::tracing::{NoTraceContext, TraceContextSource};
use crate::template::{escape_literal, is_valid_property_name, TemplateCache};

/// Property carrying the event id structure.
pub const EVENT_ID_PROPERTY: &str = "EventId";

/// Turns front-end log calls into [`StructuredEvent`]s for a [`Sink`].
///
/// Holds the `@`/`$` key caches and the prefixed-template cache shared by
/// every logger of a registry.
pub struct EventTranslator {
    destructure_keys: SigilCache,
    stringify_keys: SigilCache,
    templates: TemplateCache,
    trace_source: Arc<dyn TraceContextSource>,
}

impl std::fmt::Debug for EventTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTranslator")
            .field("destructure_keys", &self.destructure_keys.len())
            .field("stringify_keys", &self.stringify_keys.len())
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

impl EventTranslator {
    /// Create a translator with default cache capacities.
    pub fn new(trace_source: Arc<dyn TraceContextSource>) -> Self {
        Self::with_capacities(trace_source, DEFAULT_CAPACITY, DEFAULT_CAPACITY)
    }

    /// Create a translator whose key caches hold `sigil_capacity` entries
    /// each and whose template cache holds `template_capacity`.
    pub fn with_capacities(
        trace_source: Arc<dyn TraceContextSource>,
        sigil_capacity: usize,
        template_capacity: usize,
    ) -> Self {
        Self {
            destructure_keys: SigilCache::new(DESTRUCTURE_SIGIL, sigil_capacity),
            stringify_keys: SigilCache::new(STRINGIFY_SIGIL, sigil_capacity),
            templates: TemplateCache::new(template_capacity),
            trace_source,
        }
    }

    /// Create a translator sized from the `[cache]` config section.
    pub fn from_config(config: &CacheConfig, trace_source: Arc<dyn TraceContextSource>) -> Self {
        Self::with_capacities(trace_source, config.sigil_capacity, config.template_capacity)
    }

    pub fn destructure_keys(&self) -> &SigilCache {
        &self.destructure_keys
    }

    pub fn stringify_keys(&self) -> &SigilCache {
        &self.stringify_keys
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Translate one log call. `None` when the level is not enabled.
    pub fn translate(
        &self,
        sink: &dyn Sink,
        plugin: &str,
        category: &str,
        call: &LogCall<'_>,
    ) -> Option<StructuredEvent> {
        if call.level == LogLevel::None || !sink.is_enabled(call.level) {
            return None;
        }

        let mut properties = BTreeMap::new();
        let mut template: Option<String> = None;

        if let Some(LogState::Properties(list)) = call.state {
            template = self.bind_entries(sink, list, &mut properties);

            if template.is_none() {
                if let Some(name) = list.type_name.as_deref().and_then(type_property_name) {
                    template = Some(format!("{{{}:l}}", name));
                    bind_loggable(sink, name, call, &mut properties);
                }
            }
        }

        let template = template.unwrap_or_else(|| {
            let name = match call.state {
                Some(state) if !state.is_null() => "State",
                _ => "Message",
            };
            bind_loggable(sink, name, call, &mut properties);
            format!("{{{}:l}}", name)
        });

        if !call.event_id.is_empty() {
            properties.insert(
                EVENT_ID_PROPERTY.to_string(),
                event_id_structure(call.event_id),
            );
        }

        let context = self.trace_source.current();

        let full = format!(
            "[{}] [{}] {}",
            escape_literal(plugin),
            escape_literal(category),
            template
        );

        Some(StructuredEvent {
            timestamp: Utc::now(),
            level: call.level,
            exception: call.exception.map(ExceptionInfo::from_error),
            message_template: self.templates.parse(&full),
            properties,
            trace_id: context.map(|c| c.trace_id),
            span_id: context.map(|c| c.span_id),
        })
    }

    /// Bind keyed entries; returns the supplied template, if any.
    fn bind_entries(
        &self,
        sink: &dyn Sink,
        list: &PropertyList,
        properties: &mut BTreeMap<String, PropertyValue>,
    ) -> Option<String> {
        let mut template = None;
        for (key, value) in &list.entries {
            if key == ORIGINAL_FORMAT_KEY {
                if let StateValue::Str(text) = value {
                    template = Some(text.clone());
                    continue;
                }
            }

            if key.starts_with(DESTRUCTURE_SIGIL) {
                let name = self.destructure_keys.strip(key);
                if let Some(bound) = sink.bind_property(&name, value, true) {
                    properties.insert(bound.name, bound.value);
                }
            } else if key.starts_with(STRINGIFY_SIGIL) {
                let name = self.stringify_keys.strip(key);
                properties.insert(name.to_string(), capture::stringify(value));
            } else if let Some(scalar) = fast_scalar(value).filter(|_| is_valid_property_name(key)) {
                properties.insert(key.clone(), PropertyValue::Scalar(scalar));
            } else if let Some(bound) = sink.bind_property(key, value, false) {
                properties.insert(bound.name, bound.value);
            }
        }
        template
    }
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self::new(Arc::new(NoTraceContext))
    }
}

fn fast_scalar(value: &StateValue) -> Option<ScalarValue> {
    match value {
        StateValue::Null => Some(ScalarValue::Null),
        StateValue::Str(s) => Some(ScalarValue::Str(s.clone())),
        StateValue::Int(i) => Some(ScalarValue::Int(*i)),
        StateValue::Long(i) => Some(ScalarValue::Long(*i)),
        _ => None,
    }
}

/// Property name for a state's type: the last path segment without generic
/// arguments, or `None` when that still cannot name a template hole.
fn type_property_name(type_name: &str) -> Option<&str> {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let name = base.rsplit("::").next().unwrap_or(base).trim();
    is_valid_property_name(name).then_some(name)
}

/// Bind the formatter's output (or the raw state) under `name`.
fn bind_loggable(
    sink: &dyn Sink,
    name: &str,
    call: &LogCall<'_>,
    properties: &mut BTreeMap<String, PropertyValue>,
) {
    let value = match (call.formatter)(call.state, None) {
        Some(text) => StateValue::Str(text),
        None => call.state.map_or(StateValue::Null, LogState::to_value),
    };
    if let Some(bound) = sink.bind_property(name, &value, false) {
        properties.insert(bound.name, bound.value);
    }
}

fn event_id_structure(event_id: &EventId) -> PropertyValue {
    let mut parts = Vec::with_capacity(2);
    if event_id.id != 0 {
        parts.push(("Id".to_string(), PropertyValue::Scalar(ScalarValue::Int(event_id.id))));
    }
    if let Some(name) = &event_id.name {
        parts.push(("Name".to_string(), PropertyValue::string(name.as_str())));
    }
    PropertyValue::Structure(StructureValue {
        type_tag: None,
        properties: parts,
    })
}
