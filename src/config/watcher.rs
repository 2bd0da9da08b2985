//! Configuration file watcher for hot reload.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{ConfigError, ConfigSources};
use crate::config::schema::BridgeConfig;

/// A watcher that reloads the layered configuration when any layer changes.
pub struct ConfigWatcher {
    sources: ConfigSources,
    update_tx: mpsc::UnboundedSender<BridgeConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(sources: ConfigSources) -> (Self, mpsc::UnboundedReceiver<BridgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self { sources, update_tx }, update_rx)
    }

    /// Start watching in a background thread.
    ///
    /// Layer files may not exist yet, so their parent directories are watched
    /// and events are filtered down to the layer paths. Keep the returned
    /// watcher alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, ConfigError> {
        let tx = self.update_tx;
        let sources = self.sources;
        let watched: Vec<PathBuf> = sources.paths().map(Path::to_path_buf).collect();
        let dirs: BTreeSet<PathBuf> = watched
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .map(|d| if d.as_os_str().is_empty() { PathBuf::from(".") } else { d })
            .collect();
        let callback_sources = sources.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let relevant = event.paths.iter().any(|p| is_layer_path(p, &watched));
                    if !relevant || event.kind.is_access() {
                        return;
                    }
                    tracing::info!(paths = ?event.paths, "Config layer change detected, reloading...");
                    match callback_sources.load() {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(layers = sources.layers().len(), dirs = ?dirs, "Config watcher started");
        Ok(watcher)
    }
}

fn is_layer_path(path: &Path, layers: &[PathBuf]) -> bool {
    layers.iter().any(|layer| {
        path == layer
            || (path.file_name() == layer.file_name()
                && path.parent().and_then(|p| p.canonicalize().ok())
                    == layer.parent().and_then(|p| p.canonicalize().ok()))
    })
}
