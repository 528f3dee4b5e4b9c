//! The [`Event`] value type and its wire format.
//!
//! Events are persisted as one JSON object per line:
//!
//! ```text
//! {"tick":0,"timestamp":1739534400.25,"type":"user.created","data":{"id":1},"event_id":"0-FCFB-1","parent_id":null}
//! ```
//!
//! The in-memory field is `id`; on the wire it is `event_id`. Files written by
//! other producers of this format load unchanged.

use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ids::{IdGenerator, IdParts};

/// Event payload. Opaque to the bus and the log; key order is preserved.
pub type EventData = serde_json::Map<String, Value>;

/// Current wall-clock time as UTC seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// JSON has no encoding for NaN or infinities; refuse them instead of
/// writing `null`, which would not decode.
fn finite_timestamp<S: Serializer>(timestamp: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !timestamp.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "timestamp must be finite, got {timestamp}"
        )));
    }
    serializer.serialize_f64(*timestamp)
}

/// One immutable state-change record.
///
/// Fields are private; once built an event never changes. Causal links are
/// expressed through [`parent_id`](Self::parent_id), which may name an event
/// the log has never seen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    tick: u64,
    #[serde(serialize_with = "finite_timestamp")]
    timestamp: f64,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
    #[serde(rename = "event_id")]
    id: String,
    #[serde(default)]
    parent_id: Option<String>,
}

impl Event {
    /// Build an event, drawing its ID from `ids`.
    pub fn new(
        tick: u64,
        timestamp: f64,
        event_type: impl Into<String>,
        data: EventData,
        parent_id: Option<String>,
        ids: &IdGenerator,
    ) -> Self {
        let event_type = event_type.into();
        let id = ids.generate_id(tick, &event_type);
        Self {
            tick,
            timestamp,
            event_type,
            data,
            id,
            parent_id,
        }
    }

    /// Build an event with a caller-supplied ID. No sequence is consumed.
    pub fn with_id(
        tick: u64,
        timestamp: f64,
        event_type: impl Into<String>,
        data: EventData,
        id: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            tick,
            timestamp,
            event_type: event_type.into(),
            data,
            id: id.into(),
            parent_id,
        }
    }

    /// Logical time bucket.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Wall-clock UTC seconds. Provenance only, never used for ordering.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Dot-segmented type, e.g. `"user.created"`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Unique ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// ID of the event that caused this one, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// `true` when the event has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Structured components of the ID, when it has the generated shape.
    pub fn id_parts(&self) -> Option<IdParts> {
        IdParts::parse(&self.id)
    }

    /// Encode as a single-line JSON object.
    ///
    /// Fails when the timestamp is NaN or infinite.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from a JSON object produced by [`to_json`](Self::to_json).
    ///
    /// `event_id` is required: a record without one is an error, never
    /// given a freshly generated ID.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
