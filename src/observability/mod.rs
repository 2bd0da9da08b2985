//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Bridge internals:
//!     → logging.rs (own diagnostics via tracing-subscriber)
//!
//! Translated events:
//!     → tracing.rs (trace/span ids of the current tracing span stamped on each event)
//! ```
//!
//! # Design Decisions
//! - Diagnostics and translated events never share a pipeline implicitly
//! - Correlation ids come from a pluggable source so tests can pin them

pub mod logging;
pub mod tracing;

pub use self::logging::init_diagnostics;
pub use self::tracing::{
    NoTraceContext, SpanId, SpanTraceContext, TraceContext, TraceContextLayer, TraceContextSource,
    TraceId,
};
