//! Crate-level error type.

use crate::config::ConfigError;
use crate::event::ParseLevelError;
use crate::lifecycle::LifecycleError;
use crate::observability::tracing::TraceParseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    TraceContext(#[from] TraceParseError),

    #[error(transparent)]
    Level(#[from] ParseLevelError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
