//! The [`EventBus`] dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use eventure_core::{now_timestamp, Event, EventData, IdGenerator};
use eventure_log::EventLog;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::pattern::Pattern;

/// Subscriber callback.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

struct Slot {
    pattern: Pattern,
    entries: Vec<Entry>,
}

/// Raw pattern string -> handlers, in pattern-registration order.
///
/// Keys are never removed, so a pattern keeps its position even after its
/// last handler unsubscribes.
type Table = IndexMap<String, Slot>;

/// Per-call overrides for [`EventBus::publish_with`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PublishOptions<'a> {
    /// Tick to stamp; defaults to the attached log's tick, else 0.
    pub tick: Option<u64>,
    /// Timestamp to stamp; defaults to now.
    pub timestamp: Option<f64>,
    /// Event that caused this one.
    pub parent: Option<&'a Event>,
}

impl<'a> PublishOptions<'a> {
    /// Stamp an explicit tick.
    pub fn at_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Stamp an explicit timestamp.
    pub fn at_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Record `parent` as the cause.
    pub fn caused_by(mut self, parent: &'a Event) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Synchronous publish/subscribe hub.
///
/// Handlers run inline on the publisher's call stack. The table lock is held
/// only while collecting matching handlers, so handlers may publish,
/// subscribe, or unsubscribe re-entrantly; table changes made during a
/// dispatch apply from the next one.
///
/// The bus never appends to a log. An attached log is read for its tick only.
///
/// Event IDs come from one generator at a time. Attaching a log with a
/// different generator carries every counter over to the log's generator
/// and switches to it, so no ID the bus has issued is ever issued again,
/// whether the log is later rebound, cleared, or dropped.
pub struct EventBus {
    table: Arc<Mutex<Table>>,
    next_subscription: AtomicU64,
    ids: RwLock<Arc<IdGenerator>>,
    log: RwLock<Option<Weak<EventLog>>>,
}

impl EventBus {
    /// Bus with no log and its own ID generator.
    pub fn new() -> Self {
        Self::with_generator(Arc::new(IdGenerator::new()))
    }

    /// Bus with no log, drawing IDs from `ids`.
    pub fn with_generator(ids: Arc<IdGenerator>) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table::new())),
            next_subscription: AtomicU64::new(1),
            ids: RwLock::new(ids),
            log: RwLock::new(None),
        }
    }

    /// Bus attached to `log`.
    pub fn with_log(log: &Arc<EventLog>) -> Self {
        let bus = Self::with_generator(Arc::clone(log.id_generator()));
        bus.set_log(log);
        bus
    }

    /// Attach `log`, replacing any previous one.
    ///
    /// The bus keeps a weak reference; dropping the log detaches it. From now
    /// on IDs come from the log's generator, seeded with every sequence the
    /// bus has issued so far.
    pub fn set_log(&self, log: &Arc<EventLog>) {
        {
            let mut ids = self.ids.write();
            if !Arc::ptr_eq(&ids, log.id_generator()) {
                log.id_generator().absorb(&ids);
                *ids = Arc::clone(log.id_generator());
            }
        }
        *self.log.write() = Some(Arc::downgrade(log));
        debug!(tick = log.current_tick(), "event log attached to bus");
    }

    /// Detach the current log, if any.
    ///
    /// The bus keeps drawing IDs from the generator it last used.
    pub fn clear_log(&self) {
        *self.log.write() = None;
    }

    /// The attached log, if one is set and still alive.
    pub fn log(&self) -> Option<Arc<EventLog>> {
        self.log.read().as_ref().and_then(Weak::upgrade)
    }

    /// Generator the bus currently draws IDs from.
    pub fn id_generator(&self) -> Arc<IdGenerator> {
        Arc::clone(&self.ids.read())
    }

    /// Register a closure under `pattern`.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_handler(pattern, Arc::new(handler))
    }

    /// Register a shared handler under `pattern`.
    ///
    /// The same handler may be registered under several patterns (or several
    /// times under one); it then runs once per registration that matches.
    pub fn subscribe_handler(&self, pattern: &str, handler: Handler) -> Subscription {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.table
            .lock()
            .entry(pattern.to_string())
            .or_insert_with(|| Slot {
                pattern: Pattern::parse(pattern),
                entries: Vec::new(),
            })
            .entries
            .push(Entry { id, handler });
        debug!(pattern, subscription_id = id, "subscribed");

        Subscription {
            table: Arc::downgrade(&self.table),
            pattern: pattern.to_string(),
            id,
        }
    }

    /// Build an event and dispatch it. Does not append to any log.
    pub fn publish(&self, event_type: impl Into<String>, data: EventData) -> Event {
        self.publish_with(event_type, data, PublishOptions::default())
    }

    /// [`publish`](Self::publish) with explicit tick, timestamp or parent.
    pub fn publish_with(
        &self,
        event_type: impl Into<String>,
        data: EventData,
        opts: PublishOptions<'_>,
    ) -> Event {
        let event = {
            let log = self.log();
            let tick = opts
                .tick
                .or_else(|| log.as_deref().map(EventLog::current_tick))
                .unwrap_or(0);
            let ids = self.id_generator();
            Event::new(
                tick,
                opts.timestamp.unwrap_or_else(now_timestamp),
                event_type,
                data,
                opts.parent.map(|p| p.id().to_string()),
                &ids,
            )
        };
        self.dispatch(&event);
        event
    }

    /// Deliver an existing event to every matching handler.
    ///
    /// Order: exact-type handlers, then each matching prefix pattern in the
    /// order patterns were first registered, then `"*"` handlers.
    pub fn dispatch(&self, event: &Event) {
        let handlers = self.matching_handlers(event.event_type());
        debug!(
            event_id = event.id(),
            event_type = event.event_type(),
            tick = event.tick(),
            handlers = handlers.len(),
            "dispatching event"
        );
        for handler in &handlers {
            handler(event);
        }
        trace!(event_id = event.id(), "dispatch complete");
    }

    fn matching_handlers(&self, event_type: &str) -> Vec<Handler> {
        let table = self.table.lock();
        let mut out = Vec::new();
        let mut take = |slot: &Slot| {
            out.extend(slot.entries.iter().map(|e| Arc::clone(&e.handler)));
        };

        if let Some(slot) = table.get(event_type) {
            take(slot);
        }
        for slot in table.values() {
            if matches!(slot.pattern, Pattern::Prefix(_)) && slot.pattern.matches(event_type) {
                take(slot);
            }
        }
        if let Some(slot) = table.get("*") {
            take(slot);
        }
        out
    }

    /// Total registrations across all patterns.
    pub fn subscriber_count(&self) -> usize {
        self.table.lock().values().map(|s| s.entries.len()).sum()
    }

    /// Every pattern ever subscribed, in first-registration order.
    pub fn patterns(&self) -> Vec<String> {
        self.table.lock().keys().cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("patterns", &self.patterns())
            .field("subscriber_count", &self.subscriber_count())
            .field("log_attached", &self.log().is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to one registration made by [`EventBus::subscribe`].
///
/// Dropping the handle leaves the handler registered.
#[derive(Clone)]
pub struct Subscription {
    table: Weak<Mutex<Table>>,
    pattern: String,
    id: u64,
}

impl Subscription {
    /// Pattern this registration was made under.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Remove exactly this registration. Later calls, or calls after the bus
    /// is gone, do nothing.
    pub fn unsubscribe(&self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = table.lock();
        if let Some(slot) = table.get_mut(&self.pattern) {
            let before = slot.entries.len();
            slot.entries.retain(|e| e.id != self.id);
            if slot.entries.len() < before {
                debug!(pattern = %self.pattern, subscription_id = self.id, "unsubscribed");
            }
        }
    }

    /// `true` while the handler is still registered on a live bus.
    pub fn is_active(&self) -> bool {
        self.table.upgrade().is_some_and(|table| {
            table
                .lock()
                .get(&self.pattern)
                .is_some_and(|slot| slot.entries.iter().any(|e| e.id == self.id))
        })
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pattern", &self.pattern)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
