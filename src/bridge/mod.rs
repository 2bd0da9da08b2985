//! Log-call translation bridge.
//!
//! # Data Flow
//! ```text
//! front-end call (level, event id, state, exception, formatter)
//!     → LoggerRegistry::get_or_create(category)   (registry.rs)
//!     → CategoryLogger::log(&LogCall)             (logger.rs)
//!     → EventTranslator::translate                (translator.rs)
//!         → SigilCache strips `@` / `$` keys      (sigil.rs)
//!         → Sink::bind_property for non-trivial values
//!     → Sink::emit(StructuredEvent)
//! ```
//!
//! # Design Decisions
//! - State is a closed enum ([`LogState`]); nothing is discovered at runtime
//! - The translator owns its caches; loggers share one translator
//! - One logger per category, case-insensitive

pub mod logger;
pub mod registry;
pub mod sigil;
pub mod state;
pub mod translator;

use std::sync::Arc;

use crate::backend::Sink;
use crate::config::schema::BridgeConfig;
use crate::observability::tracing::TraceContextSource;

pub use logger::{CategoryLogger, LogCall};
pub use registry::LoggerRegistry;
pub use sigil::SigilCache;
pub use state::{format_state, Formatter, LogState, PropertyList, ORIGINAL_FORMAT_KEY};
pub use translator::EventTranslator;

/// Registry wired from configuration: plugin name and cache sizes.
pub fn registry_from_config(
    config: &BridgeConfig,
    sink: Arc<dyn Sink>,
    trace_source: Arc<dyn TraceContextSource>,
) -> LoggerRegistry {
    let translator = EventTranslator::from_config(&config.cache, trace_source);
    LoggerRegistry::new(config.plugin.name.clone(), Arc::new(translator), sink)
}
