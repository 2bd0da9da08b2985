//! Diagnostics for the bridge itself.
//!
//! The bridge reports its own activity (logger creation, config reloads,
//! lifecycle transitions) through `tracing`. Translated application events
//! go to a [`crate::backend::Sink`] instead and only reach `tracing` when the
//! host selects the tracing sink.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::tracing::TraceContextLayer;
use crate::config::schema::DiagnosticsConfig;

static DIAGNOSTICS_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once for the process.
///
/// `RUST_LOG` wins over the configured filter. Later calls are no-ops. Spans
/// get trace ids from [`TraceContextLayer`], which
/// [`super::SpanTraceContext`] reads back for translated events.
pub fn init_diagnostics(config: &DiagnosticsConfig) {
    DIAGNOSTICS_INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let result = if config.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(TraceContextLayer)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(TraceContextLayer)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("diagnostics init skipped: {err}");
        }
    });
}
