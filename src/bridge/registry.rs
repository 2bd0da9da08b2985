//! Category → logger registry.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::logger::CategoryLogger;
use super::translator::EventTranslator;
use crate::backend::Sink;

/// Hands out one [`CategoryLogger`] per category name.
///
/// Names compare case-insensitively. Concurrent first requests for the same
/// name construct exactly one logger.
pub struct LoggerRegistry {
    plugin: Arc<str>,
    translator: Arc<EventTranslator>,
    sink: Arc<dyn Sink>,
    loggers: DashMap<String, Arc<CategoryLogger>>,
    created: AtomicUsize,
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("plugin", &self.plugin)
            .field("loggers", &self.loggers.len())
            .finish_non_exhaustive()
    }
}

impl LoggerRegistry {
    /// Create an empty registry whose loggers tag events with `plugin`.
    pub fn new(
        plugin: impl Into<String>,
        translator: Arc<EventTranslator>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            plugin: Arc::from(plugin.into()),
            translator,
            sink,
            loggers: DashMap::new(),
            created: AtomicUsize::new(0),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn translator(&self) -> &Arc<EventTranslator> {
        &self.translator
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// The logger for `category`, created on first request.
    pub fn get_or_create(&self, category: &str) -> Arc<CategoryLogger> {
        let key = category_key(category);
        if let Some(existing) = self.loggers.get(&key) {
            return existing.value().clone();
        }

        let mut created = false;
        let logger = self
            .loggers
            .entry(key)
            .or_insert_with(|| {
                created = true;
                self.created.fetch_add(1, Ordering::Relaxed);
                Arc::new(CategoryLogger::new(
                    category,
                    self.plugin.clone(),
                    self.translator.clone(),
                    self.sink.clone(),
                ))
            })
            .value()
            .clone();

        // Shard lock released above; subscribers may call back into the registry.
        if created {
            debug!(category = %category, "Logger created");
        }
        logger
    }

    pub fn contains(&self, category: &str) -> bool {
        self.loggers.contains_key(&category_key(category))
    }

    /// Drop every cached logger. Later requests create fresh ones.
    pub fn clear(&self) {
        self.loggers.clear();
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    /// Total loggers constructed over the registry's lifetime.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Category names as first requested, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .iter()
            .map(|entry| entry.value().category().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Per-character lowercase fold. `str::to_lowercase` maps a word-final
/// sigma to `ς`, which would split `ΟΔΟΣ` from `οδοσ`.
fn category_key(category: &str) -> String {
    category.chars().flat_map(char::to_lowercase).collect()
}
