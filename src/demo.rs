//! Small deterministic simulation wiring a bus to a log.
//!
//! Each tick the driver records a `world.tick` event and dispatches it.
//! Handlers react by recording and dispatching follow-up events, so every
//! persisted event carries its cause:
//!
//! ```text
//! world.tick
//! └── enemy.spawned          (even ticks)
//!     └── player.attacked
//!         └── enemy.defeated (every fourth tick)
//! ```
//!
//! Events are appended before they are dispatched, which keeps the log in
//! causal order even though handlers run nested.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use eventure_bus::EventBus;
use eventure_core::{Event, EventData, IdGenerator};
use eventure_log::EventLog;
use serde_json::{json, Value};
use tracing::info;

fn payload(value: Value) -> EventData {
    match value {
        Value::Object(map) => map,
        _ => EventData::new(),
    }
}

/// Record `event_type` in `log` as a child of `parent`, then dispatch it.
fn emit(
    bus: &Weak<EventBus>,
    log: &EventLog,
    event_type: &str,
    data: Value,
    parent: &Event,
) {
    let event = log.add_event(event_type, payload(data), Some(parent));
    if let Some(bus) = bus.upgrade() {
        bus.dispatch(&event);
    }
}

/// Outcome of [`run`].
#[derive(Debug)]
pub struct DemoRun {
    /// Everything recorded during the run.
    pub log: Arc<EventLog>,
    /// Handler invocations seen by the `"*"` subscriber.
    pub deliveries: usize,
}

/// Drive `ticks` ticks of the simulation, drawing IDs from `ids`.
pub fn run(ticks: u64, ids: Arc<IdGenerator>) -> DemoRun {
    let log = Arc::new(EventLog::with_generator(ids));
    let bus = Arc::new(EventBus::with_log(&log));
    let deliveries = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&deliveries);
    let _all = bus.subscribe("*", move |_| {
        let _ = counter.fetch_add(1, Ordering::Relaxed);
    });

    let (weak, sink) = (Arc::downgrade(&bus), Arc::clone(&log));
    let _spawner = bus.subscribe("world.tick", move |event| {
        if event.tick() % 2 == 0 {
            let enemy = format!("goblin-{}", event.tick());
            emit(&weak, &sink, "enemy.spawned", json!({"enemy": enemy, "hp": 10}), event);
        }
    });

    let (weak, sink) = (Arc::downgrade(&bus), Arc::clone(&log));
    let _fighter = bus.subscribe("enemy.spawned", move |event| {
        let target = event.data().get("enemy").cloned().unwrap_or(Value::Null);
        emit(&weak, &sink, "player.attacked", json!({"target": target, "damage": 4}), event);
    });

    let (weak, sink) = (Arc::downgrade(&bus), Arc::clone(&log));
    let _finisher = bus.subscribe("player.*", move |event| {
        if event.tick() % 4 == 0 {
            let target = event.data().get("target").cloned().unwrap_or(Value::Null);
            emit(&weak, &sink, "enemy.defeated", json!({"enemy": target}), event);
        }
    });

    for step in 0..ticks {
        let tick_event = log.add_event("world.tick", payload(json!({"step": step})), None);
        bus.dispatch(&tick_event);
        log.advance_tick();
    }

    let finished = bus.publish("demo.finished", payload(json!({"ticks": ticks})));
    log.append(finished);

    let deliveries = deliveries.load(Ordering::Relaxed);
    info!(ticks, events = log.len(), deliveries, "demo finished");
    DemoRun { log, deliveries }
}
