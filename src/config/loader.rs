//! Configuration loading from disk.
//!
//! Configuration comes from up to three optional layers, merged in order:
//! the base file, an environment-specific file, then a user-editable
//! override. Each layer may be TOML, JSON or YAML (chosen by extension).
//! Tables merge key by key; any other value in a later layer replaces the
//! earlier one.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the active environment (`development`, ...).
pub const ENVIRONMENT_VAR: &str = "LOGBRIDGE_ENVIRONMENT";

/// File stem used by [`ConfigSources::conventional`].
pub const CONFIG_STEM: &str = "logbridge";

const EXTENSIONS: [&str; 4] = ["toml", "json", "yaml", "yml"];

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Invalid configuration: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    fn parse(&self, content: &str) -> Result<Value, String> {
        match self {
            ConfigFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => {
                serde_yaml_ng::from_str::<Value>(content).map_err(|e| e.to_string())
            }
        }
    }
}

/// Position of a layer in the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerKind {
    Base,
    Environment,
    UserOverride,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub kind: LayerKind,
    pub path: PathBuf,
}

/// The ordered set of files a configuration is assembled from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    layers: Vec<ConfigLayer>,
}

impl ConfigSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer. Layers are kept sorted by kind, so later kinds win
    /// regardless of insertion order.
    pub fn with_layer(mut self, kind: LayerKind, path: impl Into<PathBuf>) -> Self {
        self.layers.push(ConfigLayer {
            kind,
            path: path.into(),
        });
        self.layers.sort_by_key(|layer| layer.kind);
        self
    }

    /// Standard layout inside `dir`: `logbridge.<ext>`, then
    /// `logbridge.<environment>.<ext>`, then the optional user override.
    ///
    /// For each of the first two, the first existing extension is used; when
    /// none exists the `.toml` name is kept so a watcher can pick it up later.
    pub fn conventional(
        dir: &Path,
        environment: Option<&str>,
        user_override: Option<PathBuf>,
    ) -> Self {
        let mut sources = Self::new().with_layer(LayerKind::Base, find_layer_file(dir, CONFIG_STEM));
        if let Some(env) = environment.map(str::trim).filter(|e| !e.is_empty()) {
            let stem = format!("{}.{}", CONFIG_STEM, env);
            sources = sources.with_layer(LayerKind::Environment, find_layer_file(dir, &stem));
        }
        if let Some(path) = user_override {
            sources = sources.with_layer(LayerKind::UserOverride, path);
        }
        sources
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.layers.iter().map(|layer| layer.path.as_path())
    }

    /// Merge every existing layer into one validated configuration.
    ///
    /// Missing files are skipped; malformed ones are an error.
    pub fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let mut merged = Value::Object(serde_json::Map::new());
        for layer in &self.layers {
            match read_layer(&layer.path)? {
                Some(value) => {
                    tracing::debug!(path = %layer.path.display(), kind = ?layer.kind, "Config layer applied");
                    merge_values(&mut merged, value);
                }
                None => {
                    tracing::debug!(path = %layer.path.display(), kind = ?layer.kind, "Config layer absent");
                }
            }
        }

        let config: BridgeConfig = serde_json::from_value(merged)?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Read the active environment name from [`ENVIRONMENT_VAR`].
pub fn environment_from_env() -> Option<String> {
    std::env::var(ENVIRONMENT_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Load and validate configuration from a single file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let value = read_layer(path)?.ok_or_else(|| ConfigError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "config file not found"),
    })?;
    let config: BridgeConfig = serde_json::from_value(value)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Deep-merge `overlay` into `base`.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn read_layer(path: &Path) -> Result<Option<Value>, ConfigError> {
    let format =
        ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    format
        .parse(&content)
        .map(Some)
        .map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
}

fn find_layer_file(dir: &Path, stem: &str) -> PathBuf {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| dir.join(format!("{}.toml", stem)))
}
