//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Host (host.rs):
//!     HostLifecycle::start / stop → broadcast HostSignal
//!
//! Coordinators (coordinator.rs):
//!     HostSignal::Start → attach every binding in order
//!     HostSignal::Stop  → detach in reverse order
//!
//! Bindings:
//!     toggle.rs   → UI surfaces subscribed to host toggle events by role
//!     commands.rs → command handlers registered by name
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → HostLifecycle::stop
//! ```
//!
//! # Design Decisions
//! - Bindings are explicit (name, attach, detach) triples
//! - A failed attach rolls back everything attached before it
//! - Start and stop are idempotent

pub mod commands;
pub mod coordinator;
pub mod host;
pub mod signals;
pub mod toggle;

pub use commands::{command_binding, CommandHandler, CommandRegistry};
pub use coordinator::{LifecycleCoordinator, ResourceBinding};
pub use host::{HostLifecycle, HostSignal};
pub use toggle::{surface_binding, HostToggle, ResourceRole, ToggleBus, UiSurface};

/// Errors raised while wiring resources to the host.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Failed to attach '{resource}': {message}")]
    Attach { resource: String, message: String },

    #[error("No role for resource type '{0}'")]
    UnknownRole(String),

    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),
}
