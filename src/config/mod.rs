//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! logbridge.toml            (base)
//! logbridge.<env>.json      (environment)
//! user override (any fmt)   (last wins)
//!     → loader.rs (parse each layer, deep merge)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!
//! On change:
//!     watcher.rs detects change in any layer
//!     → loader.rs reloads all layers
//!     → validation.rs validates
//!     → host swaps sink settings (backend::SinkControl)
//! ```
//!
//! # Design Decisions
//! - Every layer is optional; no files means defaults
//! - The plugin name and cache sizes are read once at construction; only the
//!   sink threshold and capture limits follow reloads
//! - A reload that fails to parse or validate keeps the current settings

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, ConfigSources, LayerKind};
pub use schema::{BridgeConfig, CaptureConfig, DiagnosticsConfig, LoggingConfig, SinkKind};
pub use watcher::ConfigWatcher;
