//! Trace correlation.
//!
//! # Responsibilities
//! - Stamp each `tracing` span with a trace and span id
//! - Report the ids of the current span to the bridge
//! - Read W3C `traceparent` values handed in by callers
//!
//! # Design Decisions
//! - The bridge depends only on [`TraceContextSource`]; hosts pick the source
//! - No active activity means no ids, never zeroed placeholders

use std::fmt;
use std::str::FromStr;

use ::tracing::field::{Field, Visit};
use ::tracing::span::{Attributes, Id};
use ::tracing::{Span, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, Registry};
use uuid::Uuid;

/// 128-bit trace identifier, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

/// 64-bit span identifier, rendered as 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl TraceId {
    /// Returns `None` for the all-zero id, which W3C reserves as invalid.
    pub fn new(raw: u128) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn random() -> Self {
        // v4 UUIDs always carry version bits, so the value is never zero.
        Self(Uuid::new_v4().as_u128())
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl SpanId {
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn random() -> Self {
        Self(fastrand::u64(1..))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Error for malformed trace identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trace context: {0}")]
pub struct TraceParseError(String);

impl FromStr for TraceId {
    type Err = TraceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(TraceParseError(format!("trace id must be 32 hex digits, got '{}'", s)));
        }
        u128::from_str_radix(s, 16)
            .ok()
            .and_then(TraceId::new)
            .ok_or_else(|| TraceParseError(format!("bad trace id '{}'", s)))
    }
}

impl FromStr for SpanId {
    type Err = TraceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 {
            return Err(TraceParseError(format!("span id must be 16 hex digits, got '{}'", s)));
        }
        u64::from_str_radix(s, 16)
            .ok()
            .and_then(SpanId::new)
            .ok_or_else(|| TraceParseError(format!("bad span id '{}'", s)))
    }
}

/// The active trace and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

impl TraceContext {
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
        }
    }

    /// Same trace, fresh span.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
        }
    }

    /// Parse a W3C `traceparent` value (`00-<trace>-<span>-<flags>`).
    pub fn from_traceparent(header: &str) -> Result<Self, TraceParseError> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        match parts.as_slice() {
            ["00", trace, span, flags] if flags.len() == 2 => Ok(Self {
                trace_id: trace.parse()?,
                span_id: span.parse()?,
            }),
            _ => Err(TraceParseError(format!("unsupported traceparent '{}'", header))),
        }
    }

    pub fn to_traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.span_id)
    }
}

/// Source of the ambient trace context for the calling thread.
pub trait TraceContextSource: Send + Sync {
    fn current(&self) -> Option<TraceContext>;
}

/// A source that never reports an active trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTraceContext;

impl TraceContextSource for NoTraceContext {
    fn current(&self) -> Option<TraceContext> {
        None
    }
}

/// Span field carrying an inbound W3C `traceparent`.
pub const TRACEPARENT_FIELD: &str = "traceparent";

/// `tracing-subscriber` layer that gives every new span a [`TraceContext`].
///
/// A span continues its parent's trace with a fresh span id. A span opened
/// with a `traceparent` field continues that remote trace instead, and a span
/// with neither starts a new root.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceContextLayer;

impl<S> Layer<S> for TraceContextLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut remote = TraceparentVisitor::default();
        attrs.record(&mut remote);

        let inherited = match span.parent() {
            Some(parent) => {
                let extensions = parent.extensions();
                let context = extensions.get::<TraceContext>().map(TraceContext::child);
                context
            }
            None => None,
        };

        let context = remote
            .0
            .or(inherited)
            .unwrap_or_else(TraceContext::new_root);
        span.extensions_mut().insert(context);
    }
}

#[derive(Default)]
struct TraceparentVisitor(Option<TraceContext>);

impl TraceparentVisitor {
    fn accept(&mut self, value: &str) {
        self.0 = TraceContext::from_traceparent(value)
            .ok()
            .map(|remote| remote.child());
    }
}

impl Visit for TraceparentVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == TRACEPARENT_FIELD {
            self.accept(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == TRACEPARENT_FIELD {
            self.accept(&format!("{:?}", value));
        }
    }
}

/// Reads the trace context of the current `tracing` span.
///
/// Spans only carry a context when the active subscriber is built on
/// [`Registry`] with a [`TraceContextLayer`]. Because the context lives on
/// the span, it follows a task through `.instrument(..)` across awaits.
///
/// ```
/// use logbridge::observability::tracing::{SpanTraceContext, TraceContextLayer, TraceContextSource};
/// use tracing_subscriber::prelude::*;
///
/// let subscriber = tracing_subscriber::registry().with(TraceContextLayer);
/// tracing::subscriber::with_default(subscriber, || {
///     assert!(SpanTraceContext.current().is_none());
///     let span = tracing::info_span!("request");
///     let _entered = span.enter();
///     assert!(SpanTraceContext.current().is_some());
/// });
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanTraceContext;

impl SpanTraceContext {
    /// The context stamped on `span`, if any.
    pub fn of(span: &Span) -> Option<TraceContext> {
        span.with_subscriber(|(id, dispatch)| {
            let registry = dispatch.downcast_ref::<Registry>()?;
            let data = registry.span(id)?;
            let extensions = data.extensions();
            let context = extensions.get::<TraceContext>().copied();
            context
        })
        .flatten()
    }
}

impl TraceContextSource for SpanTraceContext {
    fn current(&self) -> Option<TraceContext> {
        Self::of(&Span::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_widths() {
        let trace = TraceId::new(0xab).unwrap();
        let span = SpanId::new(0xcd).unwrap();
        assert_eq!(trace.to_string().len(), 32);
        assert_eq!(span.to_string(), "00000000000000cd");
    }

    #[test]
    fn test_zero_ids_rejected() {
        assert!(TraceId::new(0).is_none());
        assert!(SpanId::new(0).is_none());
    }

    #[test]
    fn test_traceparent_roundtrip() {
        let header = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        let ctx = TraceContext::from_traceparent(header).unwrap();
        assert_eq!(ctx.trace_id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.to_traceparent(), header);

        assert!(TraceContext::from_traceparent("01-abc-def-00").is_err());
        assert!(TraceContext::from_traceparent(
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01"
        )
        .is_err());
    }

    fn subscriber() -> impl Subscriber + Send + Sync {
        use tracing_subscriber::prelude::*;
        tracing_subscriber::registry().with(TraceContextLayer)
    }

    #[test]
    fn test_nested_spans_share_trace() {
        ::tracing::subscriber::with_default(subscriber(), || {
            let source = SpanTraceContext;
            let root = ::tracing::info_span!("root");
            let _root = root.enter();
            let outer = source.current().unwrap();
            {
                let child = ::tracing::info_span!("child");
                let _child = child.enter();
                let current = source.current().unwrap();
                assert_eq!(current.trace_id, outer.trace_id);
                assert_ne!(current.span_id, outer.span_id);
            }
            assert_eq!(source.current(), Some(outer));
        });
    }

    #[test]
    fn test_no_span_no_context() {
        ::tracing::subscriber::with_default(subscriber(), || {
            assert!(SpanTraceContext.current().is_none());
        });
        // Spans under a subscriber without the layer carry nothing either.
        ::tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = ::tracing::info_span!("unstamped");
            let _entered = span.enter();
            assert!(SpanTraceContext.current().is_none());
        });
    }

    #[test]
    fn test_traceparent_field_continues_remote_trace() {
        let header = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        ::tracing::subscriber::with_default(subscriber(), || {
            let span = ::tracing::info_span!("inbound", traceparent = header);
            let ctx = SpanTraceContext::of(&span).unwrap();
            assert_eq!(ctx.trace_id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
            assert_ne!(ctx.span_id.to_string(), "00f067aa0ba902b7");

            let span = ::tracing::info_span!("inbound", traceparent = %header);
            let ctx = SpanTraceContext::of(&span).unwrap();
            assert_eq!(ctx.trace_id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");

            let span = ::tracing::info_span!("inbound", traceparent = "garbage");
            assert!(SpanTraceContext::of(&span).is_some());
        });
    }

    #[tokio::test]
    async fn test_context_follows_instrumented_task() {
        use ::tracing::Instrument;

        let _default = ::tracing::subscriber::set_default(subscriber());
        let span = ::tracing::info_span!("task");
        let expected = SpanTraceContext::of(&span).unwrap();
        let seen = async {
            tokio::task::yield_now().await;
            SpanTraceContext.current()
        }
        .instrument(span)
        .await;
        assert_eq!(seen, Some(expected));
    }
}
