//! Per-category loggers and the log call they accept.

use std::error::Error as StdError;
use std::sync::Arc;

use super::state::{format_state, Formatter, LogState};
use super::translator::EventTranslator;
use crate::backend::Sink;
use crate::event::{EventId, LogLevel, StateValue};

/// One log invocation as handed over by a front-end.
#[derive(Clone, Copy)]
pub struct LogCall<'a> {
    pub level: LogLevel,
    pub event_id: &'a EventId,
    pub state: Option<&'a LogState>,
    pub exception: Option<&'a (dyn StdError + 'static)>,
    pub formatter: &'a Formatter,
}

static NO_EVENT_ID: EventId = EventId { id: 0, name: None };

impl<'a> LogCall<'a> {
    /// A call with no event id, no exception and the default formatter.
    pub fn new(level: LogLevel, state: Option<&'a LogState>) -> Self {
        Self {
            level,
            event_id: &NO_EVENT_ID,
            state,
            exception: None,
            formatter: &format_state,
        }
    }

    pub fn with_event_id(mut self, event_id: &'a EventId) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn with_exception(mut self, exception: &'a (dyn StdError + 'static)) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_formatter(mut self, formatter: &'a Formatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl std::fmt::Debug for LogCall<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCall")
            .field("level", &self.level)
            .field("event_id", &self.event_id)
            .field("state", &self.state)
            .field("exception", &self.exception.map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

/// Logger bound to one category.
///
/// Obtained from [`LoggerRegistry`](super::LoggerRegistry); cheap to clone
/// through its `Arc`.
pub struct CategoryLogger {
    category: String,
    plugin: Arc<str>,
    translator: Arc<EventTranslator>,
    sink: Arc<dyn Sink>,
}

impl std::fmt::Debug for CategoryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryLogger")
            .field("category", &self.category)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

impl CategoryLogger {
    pub fn new(
        category: impl Into<String>,
        plugin: Arc<str>,
        translator: Arc<EventTranslator>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            category: category.into(),
            plugin,
            translator,
            sink,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && self.sink.is_enabled(level)
    }

    pub fn log(&self, call: &LogCall<'_>) {
        if let Some(event) =
            self.translator
                .translate(self.sink.as_ref(), &self.plugin, &self.category, call)
        {
            self.sink.emit(event);
        }
    }

    pub fn log_state(
        &self,
        level: LogLevel,
        event_id: &EventId,
        state: &LogState,
        exception: Option<&(dyn StdError + 'static)>,
    ) {
        let mut call = LogCall::new(level, Some(state)).with_event_id(event_id);
        call.exception = exception;
        self.log(&call);
    }

    /// Log a message template with positional arguments.
    pub fn log_template(&self, level: LogLevel, template: &str, args: Vec<StateValue>) {
        if !self.is_enabled(level) {
            return;
        }
        let state = LogState::formatted(template, args);
        self.log(&LogCall::new(level, Some(&state)));
    }

    pub fn trace(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Trace, template, args)
    }

    pub fn debug(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Debug, template, args)
    }

    pub fn information(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Information, template, args)
    }

    pub fn warning(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Warning, template, args)
    }

    pub fn error(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Error, template, args)
    }

    pub fn critical(&self, template: &str, args: Vec<StateValue>) {
        self.log_template(LogLevel::Critical, template, args)
    }

    /// Log an error together with a message template.
    pub fn exception(
        &self,
        level: LogLevel,
        error: &(dyn StdError + 'static),
        template: &str,
        args: Vec<StateValue>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let state = LogState::formatted(template, args);
        self.log(&LogCall::new(level, Some(&state)).with_exception(error));
    }
}

/// Build a `Vec<StateValue>` from heterogeneous arguments.
///
/// ```
/// use logbridge::state_args;
/// use logbridge::event::StateValue;
///
/// let args = state_args!["World", 42, true];
/// assert_eq!(args[1], StateValue::Int(42));
/// ```
#[macro_export]
macro_rules! state_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::event::StateValue::from($arg)),*]
    };
}
