//! Bus, log and persistence working together.

use std::sync::Arc;

use assert_matches::assert_matches;
use eventure::render::render_cascade;
use eventure::{
    demo, Event, EventBus, EventData, EventError, EventLog, IdGenerator, PublishOptions,
};
use parking_lot::Mutex;
use serde_json::json;

fn data(value: serde_json::Value) -> EventData {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn published_events_can_be_recorded_and_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");

    let log = Arc::new(EventLog::new());
    let bus = EventBus::with_log(&log);

    let recorder = Arc::clone(&log);
    let _sub = bus.subscribe("*", move |event| recorder.append(event.clone()));

    let created = bus.publish("user.created", data(json!({"user_id": 1})));
    log.advance_tick();
    let welcomed = bus.publish_with(
        "user.welcomed",
        data(json!({"user_id": 1})),
        PublishOptions::default().caused_by(&created),
    );
    log.advance_tick();
    let _unrelated = bus.publish("order.created", EventData::new());

    assert_eq!(created.id(), "0-FCFB-1");
    assert_eq!(welcomed.tick(), 1);
    assert_eq!(log.len(), 3);
    log.save(&path).unwrap();

    let restored = EventLog::load(&path).unwrap();
    assert_eq!(restored.events(), log.events());
    assert_eq!(restored.current_tick(), 2);
    assert_eq!(
        restored.get_event_cascade(created.id()),
        vec![created.clone(), welcomed]
    );

    // New events on the restored log never reuse a loaded ID.
    let again = restored.add_event("order.created", EventData::new(), None);
    assert_eq!(again.id(), "2-CBEE-2");
}

#[test]
fn user_prefix_sees_only_user_events() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = bus.subscribe("user.*", move |e: &Event| {
        sink.lock().push(e.event_type().to_string());
    });

    for event_type in ["user.created", "user.updated", "order.created"] {
        let _ = bus.publish(event_type, EventData::new());
    }
    assert_eq!(*seen.lock(), ["user.created", "user.updated"]);
}

#[test]
fn logs_sharing_a_generator_never_collide() {
    let ids = Arc::new(IdGenerator::new());
    let left = EventLog::with_generator(Arc::clone(&ids));
    let right = EventLog::with_generator(Arc::clone(&ids));
    let bus = EventBus::with_generator(ids);

    let a = left.add_event("a", EventData::new(), None);
    let b = right.add_event("a", EventData::new(), None);
    let c = bus.publish("a", EventData::new());
    assert_eq!([a.id(), b.id(), c.id()], ["0-CCBC-1", "0-CCBC-2", "0-CCBC-3"]);
}

#[test]
fn demo_log_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.jsonl");

    let run = demo::run(6, Arc::new(IdGenerator::new()));
    run.log.save(&path).unwrap();
    let loaded = EventLog::load(&path).unwrap();

    assert_eq!(loaded.events(), run.log.events());
    // Highest event tick is the one `demo.finished` was stamped with.
    assert_eq!(loaded.current_tick(), 6);

    let root = loaded.get_events_at_tick(0)[0].clone();
    let tree = render_cascade(&loaded, root.id()).unwrap();
    assert_eq!(tree.lines().count(), 4);
    assert!(tree.lines().last().unwrap().contains("enemy.defeated"));
}

#[test]
fn truncated_file_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");

    let log = EventLog::new();
    let _ = log.add_event("a", EventData::new(), None);
    let _ = log.add_event("a", EventData::new(), None);
    log.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, &text[..text.len() - 10]).unwrap();

    assert_matches!(EventLog::load(&path), Err(EventError::Decode { line: 2, .. }));
}
