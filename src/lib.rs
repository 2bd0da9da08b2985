//! Structured-log translation bridge.
//!
//! Converts loosely-typed log calls (level, event id, keyed state, error)
//! into templated structured events and hands them to a backend sink.

pub mod backend;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod observability;
pub mod template;

pub use backend::{Sink, SinkControl};
pub use bridge::{CategoryLogger, EventTranslator, LogCall, LogState, LoggerRegistry};
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use event::{EventId, LogLevel, StateValue, StructuredEvent};
