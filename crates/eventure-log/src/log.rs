//! The [`EventLog`] store: append, tick control and point/range lookups.

use std::ops::RangeBounds;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use eventure_core::{now_timestamp, Event, EventData, IdGenerator};
use parking_lot::RwLock;
use tracing::debug;

/// Ordered, append-only store of events plus the current tick.
///
/// Insertion order is authoritative; events are never reordered or mutated
/// once appended. All methods take `&self`, so a log can be shared as
/// `Arc<EventLog>` and observed by an `EventBus`.
pub struct EventLog {
    events: RwLock<Vec<Event>>,
    tick: AtomicU64,
    ids: Arc<IdGenerator>,
}

impl EventLog {
    /// Empty log at tick 0 with its own ID generator.
    pub fn new() -> Self {
        Self::with_generator(Arc::new(IdGenerator::new()))
    }

    /// Empty log at tick 0 drawing IDs from `ids`.
    ///
    /// Logs that share a generator never issue the same ID for the same
    /// `(tick, type)`.
    pub fn with_generator(ids: Arc<IdGenerator>) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            tick: AtomicU64::new(0),
            ids,
        }
    }

    /// The generator this log draws IDs from.
    pub fn id_generator(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    /// Current tick. Side-effect free.
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    /// Advance the tick by exactly one.
    pub fn advance_tick(&self) {
        let previous = self.tick.fetch_add(1, Ordering::AcqRel);
        debug!(tick = previous + 1, "tick advanced");
    }

    /// Raise the tick to at least `tick`. Never moves it backwards.
    pub(crate) fn raise_tick_to(&self, tick: u64) {
        let _ = self.tick.fetch_max(tick, Ordering::AcqRel);
    }

    /// Create an event at the current tick, stamped now, and append it.
    ///
    /// `parent`, when given, becomes the new event's `parent_id`.
    pub fn add_event(
        &self,
        event_type: impl Into<String>,
        data: EventData,
        parent: Option<&Event>,
    ) -> Event {
        let event = Event::new(
            self.current_tick(),
            now_timestamp(),
            event_type,
            data,
            parent.map(|p| p.id().to_string()),
            &self.ids,
        );
        self.append(event.clone());
        event
    }

    /// Append an already-built event, e.g. one returned by a bus publish.
    ///
    /// The log's tick is left alone; referential integrity of `parent_id` is
    /// not checked.
    pub fn append(&self, event: Event) {
        debug!(
            event_id = event.id(),
            event_type = event.event_type(),
            tick = event.tick(),
            parent_id = event.parent_id(),
            "event appended"
        );
        self.events.write().push(event);
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// `true` when no events have been appended.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Snapshot of every event in log order.
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events recorded at `tick`, in log order.
    pub fn get_events_at_tick(&self, tick: u64) -> Vec<Event> {
        self.filtered(|e| e.tick() == tick)
    }

    /// Events whose tick falls in `range`, in log order.
    pub fn get_events_in_range(&self, range: impl RangeBounds<u64>) -> Vec<Event> {
        self.filtered(|e| range.contains(&e.tick()))
    }

    /// First event with the given ID.
    pub fn get_event_by_id(&self, id: &str) -> Option<Event> {
        self.events.read().iter().find(|e| e.id() == id).cloned()
    }

    /// Direct children of `id`, in log order.
    pub fn get_children(&self, id: &str) -> Vec<Event> {
        self.filtered(|e| e.parent_id() == Some(id))
    }

    fn filtered(&self, pred: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events.read().iter().filter(|&e| pred(e)).cloned().collect()
    }

    /// Run `f` over the events without cloning them.
    pub(crate) fn with_events<R>(&self, f: impl FnOnce(&[Event]) -> R) -> R {
        f(&self.events.read())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("current_tick", &self.current_tick())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
