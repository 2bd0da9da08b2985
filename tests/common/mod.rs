//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use logbridge::backend::{JsonLineSink, LineWriter, MemorySink, SinkControl};
use logbridge::bridge::{EventTranslator, LoggerRegistry};
use logbridge::observability::{NoTraceContext, TraceContextSource};

/// Registry over an in-memory sink accepting every level.
#[allow(dead_code)]
pub fn memory_bridge(plugin: &str) -> (LoggerRegistry, Arc<MemorySink>) {
    memory_bridge_with(plugin, Arc::new(NoTraceContext))
}

#[allow(dead_code)]
pub fn memory_bridge_with(
    plugin: &str,
    trace_source: Arc<dyn TraceContextSource>,
) -> (LoggerRegistry, Arc<MemorySink>) {
    let control = SinkControl::default();
    control.set_minimum_level(logbridge::LogLevel::Trace);
    let sink = Arc::new(MemorySink::new(control));
    let registry = LoggerRegistry::new(
        plugin,
        Arc::new(EventTranslator::new(trace_source)),
        sink.clone(),
    );
    (registry, sink)
}

/// Collects written lines; clones share the same buffer.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct CapturedLines(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl CapturedLines {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl LineWriter for CapturedLines {
    fn write_line(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Registry over a JSON line sink writing into memory.
#[allow(dead_code)]
pub fn json_bridge(plugin: &str, control: SinkControl) -> (LoggerRegistry, CapturedLines) {
    let lines = CapturedLines::default();
    let sink = Arc::new(JsonLineSink::new(lines.clone(), control));
    let registry = LoggerRegistry::new(plugin, Arc::new(EventTranslator::default()), sink);
    (registry, lines)
}

/// Write a config file into `dir` and return its path.
#[allow(dead_code)]
pub fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
