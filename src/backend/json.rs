//! Compact JSON line sink.

use std::io::Write;

use super::{Sink, SinkControl};
use crate::event::{EventProperty, LogLevel, StateValue, StructuredEvent};

/// A destination for pre-formatted lines.
pub trait LineWriter: Send + Sync {
    /// Write a line to the destination.
    fn write_line(&self, line: &str);
}

/// Writes lines to stderr.
#[derive(Debug, Default)]
pub struct StderrWriter;

impl LineWriter for StderrWriter {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Writes lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutWriter;

impl LineWriter for StdoutWriter {
    fn write_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(error) = stdout.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Emits each event as one JSON object per line.
pub struct JsonLineSink<W> {
    writer: W,
    control: SinkControl,
}

impl<W: LineWriter> JsonLineSink<W> {
    pub fn new(writer: W, control: SinkControl) -> Self {
        Self { writer, control }
    }

    pub fn control(&self) -> &SinkControl {
        &self.control
    }
}

impl<W: LineWriter> Sink for JsonLineSink<W> {
    fn is_enabled(&self, level: LogLevel) -> bool {
        self.control.is_enabled(level)
    }

    fn emit(&self, event: StructuredEvent) {
        let line = serde_json::to_string(&event.to_json()).map_or_else(
            |_| {
                "{\"@l\":\"Error\",\"@mt\":\"log serialization failed\",\"@m\":\"log serialization failed\"}\n"
                    .to_string()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        );
        self.writer.write_line(&line);
    }

    fn bind_property(&self, name: &str, value: &StateValue, destructure: bool) -> Option<EventProperty> {
        self.control.bind(name, value, destructure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MessageTemplate;
    use chrono::Utc;
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct MemoryWriter {
        lines: Mutex<Vec<String>>,
    }

    impl LineWriter for Arc<MemoryWriter> {
        fn write_line(&self, line: &str) {
            self.lines.lock().expect("memory writer lock").push(line.to_string());
        }
    }

    #[test]
    fn test_writes_one_json_line_per_event() -> Result<(), Box<dyn std::error::Error>> {
        let writer = Arc::new(MemoryWriter::default());
        let sink = JsonLineSink::new(writer.clone(), SinkControl::default());

        let mut properties = BTreeMap::new();
        properties.insert("Name".to_string(), crate::event::PropertyValue::string("World"));
        sink.emit(StructuredEvent {
            timestamp: Utc::now(),
            level: LogLevel::Information,
            exception: None,
            message_template: Arc::new(MessageTemplate::parse("Hello {Name}")),
            properties,
            trace_id: None,
            span_id: None,
        });

        let lines = writer.lines.lock().expect("memory writer lock").clone();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with('\n'));
        let payload: Value = serde_json::from_str(lines[0].trim())?;
        assert_eq!(payload["@m"], Value::String("Hello \"World\"".into()));
        assert!(payload.get("@l").is_none());
        Ok(())
    }

    #[test]
    fn test_binder_uses_control_limits() {
        let control = SinkControl::default();
        let mut config = crate::config::BridgeConfig::default();
        config.capture.max_string_length = Some(3);
        control.apply(&config);

        let sink = JsonLineSink::new(StderrWriter, control);
        let prop = sink.bind_property("S", &StateValue::from("abcdef"), false).unwrap();
        assert_eq!(prop.value.as_str(), Some("ab…"));
    }
}
