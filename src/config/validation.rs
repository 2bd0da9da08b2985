//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (depths, cache sizes, string limits)
//! - Check the diagnostics filter parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, including on hot reload

use tracing_subscriber::EnvFilter;

use crate::config::schema::BridgeConfig;

const MAX_CAPTURE_DEPTH: usize = 64;
const MAX_CACHE_CAPACITY: usize = 100_000;
/// Room for at least one kept character plus the ellipsis.
const MIN_STRING_LENGTH: usize = 2;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = config.plugin.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::new("plugin.name", "must not be empty"));
    } else if name.chars().any(char::is_control) {
        errors.push(ValidationError::new(
            "plugin.name",
            "must not contain control characters",
        ));
    }

    if config.capture.max_depth == 0 || config.capture.max_depth > MAX_CAPTURE_DEPTH {
        errors.push(ValidationError::new(
            "capture.max_depth",
            format!("must be between 1 and {}", MAX_CAPTURE_DEPTH),
        ));
    }
    if matches!(config.capture.max_string_length, Some(n) if n < MIN_STRING_LENGTH) {
        errors.push(ValidationError::new(
            "capture.max_string_length",
            format!("must be at least {} when set", MIN_STRING_LENGTH),
        ));
    }
    if config.capture.max_collection_count == Some(0) {
        errors.push(ValidationError::new(
            "capture.max_collection_count",
            "must be positive when set",
        ));
    }

    if config.cache.sigil_capacity > MAX_CACHE_CAPACITY {
        errors.push(ValidationError::new(
            "cache.sigil_capacity",
            format!("must not exceed {}", MAX_CACHE_CAPACITY),
        ));
    }
    if config.cache.template_capacity > MAX_CACHE_CAPACITY {
        errors.push(ValidationError::new(
            "cache.template_capacity",
            format!("must not exceed {}", MAX_CACHE_CAPACITY),
        ));
    }

    if let Err(e) = EnvFilter::try_new(&config.diagnostics.filter) {
        errors.push(ValidationError::new("diagnostics.filter", e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
