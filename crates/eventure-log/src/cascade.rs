//! Causal traversal over `parent_id` links.
//!
//! The log does not enforce referential integrity, so parent chains may
//! dangle, loop, or (with duplicate caller-supplied IDs) converge. Every walk
//! here keeps a visited set; a node reached twice is reported, never
//! re-expanded.

use std::collections::{HashMap, HashSet};

use eventure_core::{Event, IdParts};
use tracing::warn;

use crate::log::EventLog;

/// Structural problem found while walking parent links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeAnomaly {
    /// `id` was reached a second time, via `parent_id`.
    Revisited {
        /// Event reached again.
        id: String,
        /// Parent through which it was reached the second time.
        parent_id: String,
    },
}

/// Result of [`EventLog::cascade_report`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CascadeReport {
    /// Root plus descendants, sorted by tick, type hash, then sequence.
    pub events: Vec<Event>,
    /// Revisits encountered during the walk. Empty for a well-formed tree.
    pub anomalies: Vec<CascadeAnomaly>,
}

impl CascadeReport {
    /// `true` when the walk saw a tree.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Ordering key: tick, then the type-hash and sequence parsed from the ID.
///
/// IDs outside the generated format use the whole ID in place of the hash.
fn cascade_key(event: &Event) -> (u64, String, u64) {
    match IdParts::parse(event.id()) {
        Some(parts) => (event.tick(), parts.type_hash, parts.sequence),
        None => (event.tick(), event.id().to_string(), 0),
    }
}

impl EventLog {
    /// The event `root_id` plus every event descended from it.
    ///
    /// Sorted by `(tick, type_hash, sequence)`, not by traversal order. An
    /// unknown `root_id` yields an empty `Vec`.
    pub fn get_event_cascade(&self, root_id: &str) -> Vec<Event> {
        self.cascade_report(root_id).events
    }

    /// [`get_event_cascade`](Self::get_event_cascade) plus any structural
    /// anomalies met on the way.
    pub fn cascade_report(&self, root_id: &str) -> CascadeReport {
        self.with_events(|events| {
            let Some(root) = events.iter().find(|e| e.id() == root_id) else {
                return CascadeReport::default();
            };

            let mut children: HashMap<&str, Vec<&Event>> = HashMap::new();
            for event in events {
                if let Some(parent) = event.parent_id() {
                    children.entry(parent).or_default().push(event);
                }
            }

            let mut visited: HashSet<&str> = HashSet::from([root.id()]);
            let mut collected = vec![root];
            let mut anomalies = Vec::new();
            // Depth-first, children pushed reversed so they pop in log order.
            let mut stack: Vec<&str> = vec![root.id()];

            while let Some(parent_id) = stack.pop() {
                let Some(kids) = children.get(parent_id) else {
                    continue;
                };
                for &child in kids.iter().rev() {
                    if !visited.insert(child.id()) {
                        warn!(
                            root_id,
                            event_id = child.id(),
                            parent_id,
                            "event revisited during cascade walk"
                        );
                        anomalies.push(CascadeAnomaly::Revisited {
                            id: child.id().to_string(),
                            parent_id: parent_id.to_string(),
                        });
                        continue;
                    }
                    collected.push(child);
                    stack.push(child.id());
                }
            }

            let mut events: Vec<Event> = collected.into_iter().cloned().collect();
            events.sort_by_cached_key(cascade_key);
            CascadeReport { events, anomalies }
        })
    }

    /// Chain from the outermost known ancestor down to `id`, inclusive.
    ///
    /// Stops at a root, at a dangling `parent_id`, or at a loop. Unknown `id`
    /// yields an empty `Vec`.
    pub fn get_ancestors(&self, id: &str) -> Vec<Event> {
        self.with_events(|events| {
            let by_id: HashMap<&str, &Event> =
                events.iter().rev().map(|e| (e.id(), e)).collect();

            let mut chain = Vec::new();
            let mut seen = HashSet::new();
            let mut cursor = by_id.get(id).copied();
            while let Some(event) = cursor {
                if !seen.insert(event.id()) {
                    warn!(event_id = id, looped_at = event.id(), "parent chain loops");
                    break;
                }
                chain.push(event.clone());
                cursor = event.parent_id().and_then(|p| by_id.get(p).copied());
            }
            chain.reverse();
            chain
        })
    }
}
