//! End-to-end tests: registry → logger → translator → sink.

use std::sync::Arc;
use std::thread;

use logbridge::backend::SinkControl;
use logbridge::bridge::{LogCall, LogState, PropertyList, ORIGINAL_FORMAT_KEY};
use logbridge::event::{ObjectValue, PropertyValue, ScalarValue, StateValue};
use logbridge::observability::{SpanTraceContext, TraceContextLayer};
use tracing_subscriber::prelude::*;
use logbridge::{state_args, EventId, LogLevel};
use serde_json::Value;

mod common;

#[test]
fn test_same_logger_for_case_variants() {
    let (registry, _) = common::memory_bridge("Plugin");
    let names = ["Orders.Service", "orders.service", "ORDERS.SERVICE", "Orders.SERVICE"];
    let first = registry.get_or_create(names[0]);
    for name in &names[1..] {
        assert!(Arc::ptr_eq(&first, &registry.get_or_create(name)));
    }
    assert_eq!(registry.created_count(), 1);
}

#[test]
fn test_concurrent_logging_builds_one_logger_per_category() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let category = if i % 2 == 0 { "Worker" } else { "worker" };
                    registry
                        .get_or_create(category)
                        .information("Item {Worker} {Index}", state_args![worker, i]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.created_count(), 1);
    assert_eq!(sink.len(), 8 * 50);
}

#[test]
fn test_original_format_round_trip() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let state = LogState::from(
        PropertyList::new()
            .with(ORIGINAL_FORMAT_KEY, "Hello {Name}")
            .with("Name", "World"),
    );
    registry
        .get_or_create("Greeter")
        .log(&LogCall::new(LogLevel::Information, Some(&state)));

    let event = sink.take().pop().unwrap();
    assert_eq!(event.message_template.text(), "[Plugin] [Greeter] Hello {Name}");
    assert_eq!(
        event.property("Name"),
        Some(&PropertyValue::Scalar(ScalarValue::Str("World".into())))
    );
}

#[test]
fn test_destructured_payload() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let payload = ObjectValue::new("Payload")
        .field("Id", 9)
        .field("Tags", vec!["a", "b"]);
    let state = LogState::from(
        PropertyList::new()
            .with("@Payload", payload)
            .with(ORIGINAL_FORMAT_KEY, "Got {@Payload}"),
    );
    registry
        .get_or_create("Inbox")
        .log(&LogCall::new(LogLevel::Information, Some(&state)));

    let event = sink.take().pop().unwrap();
    let Some(PropertyValue::Structure(st)) = event.property("Payload") else {
        panic!("expected destructured payload, got {:?}", event.property("Payload"));
    };
    assert_eq!(st.type_tag.as_deref(), Some("Payload"));
    assert!(matches!(st.get("Tags"), Some(PropertyValue::Sequence(tags)) if tags.len() == 2));
    assert_eq!(
        event.render_message(),
        "[Plugin] [Inbox] Got Payload { Id: 9, Tags: [\"a\", \"b\"] }"
    );
}

#[test]
fn test_none_level_never_emits() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let logger = registry.get_or_create("Quiet");
    let state = LogState::value("ignored");
    logger.log(&LogCall::new(LogLevel::None, Some(&state)));
    logger.log_template(LogLevel::None, "ignored {X}", state_args![1]);
    assert!(sink.is_empty());
}

#[test]
fn test_repeat_translation_differs_only_in_timestamp() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let logger = registry.get_or_create("Repeat");
    let state = LogState::formatted(
        "{User} updated {@Doc} with {$Flags}",
        state_args![
            "ann",
            ObjectValue::new("Doc").field("Rev", 3i64),
            vec![true, false]
        ],
    );
    let event_id = EventId::named(17, "Update");
    let call = LogCall::new(LogLevel::Warning, Some(&state)).with_event_id(&event_id);

    logger.log(&call);
    logger.log(&call);
    let mut events = sink.take();
    let second = events.pop().unwrap();
    let mut first = events.pop().unwrap();
    first.timestamp = second.timestamp;
    assert_eq!(first, second);
}

#[test]
fn test_trace_ids_follow_spans() {
    let (registry, sink) = common::memory_bridge_with("Plugin", Arc::new(SpanTraceContext));
    let logger = registry.get_or_create("Traced");

    let subscriber = tracing_subscriber::registry().with(TraceContextLayer);
    tracing::subscriber::with_default(subscriber, || {
        let root = tracing::info_span!("root").entered();
        logger.information("outer", vec![]);
        {
            let _child = tracing::info_span!("child").entered();
            logger.information("inner", vec![]);
        }
        drop(root);
        logger.information("after", vec![]);
    });

    let events = sink.take();
    assert_eq!(events[0].trace_id, events[1].trace_id);
    assert_ne!(events[0].span_id, events[1].span_id);
    assert!(events[2].trace_id.is_none());
}

#[test]
fn test_json_line_output() {
    let control = SinkControl::default();
    let (registry, lines) = common::json_bridge("Shop", control.clone());
    let logger = registry.get_or_create("Checkout");

    logger.information("Order {OrderId} placed by {Customer}", state_args![1001, "ann"]);
    logger.debug("filtered out", vec![]);
    control.set_minimum_level(LogLevel::Debug);
    logger.debug("now visible {Flag}", state_args![true]);

    let lines = lines.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.ends_with('\n')));

    let first: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["@mt"], "[Shop] [Checkout] Order {OrderId} placed by {Customer}");
    assert_eq!(first["@m"], "[Shop] [Checkout] Order 1001 placed by \"ann\"");
    assert_eq!(first["OrderId"], 1001);
    assert!(first.get("@l").is_none());

    let second: Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(second["@l"], "Debug");
    assert_eq!(second["Flag"], true);
}

#[test]
fn test_exception_chain_in_output() {
    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestFailed(#[source] std::io::Error);

    let (registry, sink) = common::memory_bridge("Plugin");
    let err = RequestFailed(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"));
    registry
        .get_or_create("Http")
        .exception(LogLevel::Error, &err, "GET {Url}", state_args!["/status"]);

    let event = sink.take().pop().unwrap();
    let json = event.to_json();
    assert_eq!(json["@x"], "request failed\n  caused by: timed out");
    assert_eq!(json["@l"], "Error");
}

#[test]
fn test_unbindable_properties_are_dropped_not_fatal() {
    let (registry, sink) = common::memory_bridge("Plugin");
    let state = LogState::from(
        PropertyList::new()
            .with(" ", 1)
            .with("@", StateValue::Null)
            .with("Kept", 2),
    );
    registry
        .get_or_create("Odd")
        .log(&LogCall::new(LogLevel::Information, Some(&state)));

    let event = sink.take().pop().unwrap();
    assert!(event.property(" ").is_none());
    assert!(event.property("").is_none());
    assert_eq!(event.property("Kept"), Some(&PropertyValue::Scalar(ScalarValue::Int(2))));
    assert_eq!(event.message_template.text(), "[Plugin] [Odd] {State:l}");
}
