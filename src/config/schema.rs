//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::event::LogLevel;

/// Root configuration for the bridge host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Identity stamped on every translated event.
    pub plugin: PluginConfig,

    /// Sink selection and enabled threshold.
    pub logging: LoggingConfig,

    /// Limits applied when the sink captures property values.
    pub capture: CaptureConfig,

    /// Sizes of the translator's bounded caches.
    pub cache: CacheConfig,

    /// The bridge's own diagnostics output.
    pub diagnostics: DiagnosticsConfig,
}

/// Plugin identity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Name shown as the first bracketed segment of every message.
    pub name: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            name: "logbridge".to_string(),
        }
    }
}

/// Where translated events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stderr,
    Stdout,
    /// Forward rendered events into the `tracing` subscriber.
    Tracing,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Least severe level the sink accepts (trace, debug, information, ...).
    pub minimum_level: LogLevel,

    /// Output sink.
    pub sink: SinkKind,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            minimum_level: LogLevel::Information,
            sink: SinkKind::Stderr,
        }
    }
}

/// Property capture limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Nesting depth beyond which destructured values become null.
    pub max_depth: usize,

    /// Strings longer than this are truncated with a trailing ellipsis.
    pub max_string_length: Option<usize>,

    /// Sequences and maps keep at most this many elements.
    pub max_collection_count: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_string_length: None,
            max_collection_count: None,
        }
    }
}

/// Bounded cache sizes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries kept by each `@` / `$` key-stripping cache.
    pub sigil_capacity: usize,

    /// Parsed templates kept for reuse.
    pub template_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sigil_capacity: DEFAULT_CAPACITY,
            template_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Diagnostics configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,

    /// Emit diagnostics as JSON lines.
    pub json: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
