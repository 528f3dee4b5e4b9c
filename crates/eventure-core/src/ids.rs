//! Structured event identifiers.
//!
//! Every generated ID has the shape `"{tick}-{typeHash}-{sequence}"`:
//!
//! - `tick` is the logical time bucket the event belongs to
//! - `typeHash` is a short uppercase alphabetic tag derived from the event
//!   type (see [`type_hash`])
//! - `sequence` is a 1-based counter scoped to the `(tick, typeHash)` pair
//!
//! Sequence state lives in an [`IdGenerator`]. Each generator is independent,
//! so two logs in one process never cross-contaminate their counters.
//! [`IdGenerator::global`] exists for callers that want one process-wide table.
//!
//! Distinct event types can hash to the same tag. They then share a sequence
//! counter: the IDs stay unique, but two different types may look alike at a
//! glance. Widen the tag with [`IdGenerator::with_type_hash_len`] when that
//! matters.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use md5::{Digest, Md5};
use parking_lot::Mutex;
use tracing::debug;

/// Tag width used by [`type_hash`].
pub const DEFAULT_TYPE_HASH_LEN: usize = 4;

/// Derive the 4-character tag for an event type.
///
/// The MD5 digest of `event_type` is rendered as lowercase hex, the digits are
/// dropped, and the first four remaining letters are uppercased. If the digest
/// contains fewer than four letters the tag is simply shorter.
pub fn type_hash(event_type: &str) -> String {
    type_hash_with_len(event_type, DEFAULT_TYPE_HASH_LEN)
}

/// [`type_hash`] with a caller-chosen tag width.
pub fn type_hash_with_len(event_type: &str, len: usize) -> String {
    let digest = Md5::digest(event_type.as_bytes());
    let mut hex = String::with_capacity(32);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex.chars()
        .filter(char::is_ascii_alphabetic)
        .take(len)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// The three components of a generated event ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdParts {
    /// Tick the event was generated at.
    pub tick: u64,
    /// Alphabetic type tag.
    pub type_hash: String,
    /// 1-based sequence within `(tick, type_hash)`.
    pub sequence: u64,
}

impl IdParts {
    /// Split an ID of the form `"{tick}-{typeHash}-{sequence}"`.
    ///
    /// Returns `None` for caller-supplied IDs that do not follow the format.
    pub fn parse(id: &str) -> Option<Self> {
        let mut parts = id.split('-');
        let tick = parts.next()?.parse().ok()?;
        let type_hash = parts.next()?;
        let sequence = parts.next()?.parse().ok()?;
        if parts.next().is_some() || !type_hash.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self {
            tick,
            type_hash: type_hash.to_string(),
            sequence,
        })
    }
}

impl fmt::Display for IdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tick, self.type_hash, self.sequence)
    }
}

impl FromStr for IdParts {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("not a structured event id: {s}"))
    }
}

/// Issues structured event IDs from a `tick -> typeHash -> sequence` table.
///
/// Thread-safe; share it behind an `Arc` between a log and a bus so both draw
/// from the same counters.
pub struct IdGenerator {
    type_hash_len: usize,
    sequences: Mutex<HashMap<u64, HashMap<String, u64>>>,
}

impl IdGenerator {
    /// Create an empty generator with the default tag width.
    pub fn new() -> Self {
        Self::with_type_hash_len(DEFAULT_TYPE_HASH_LEN)
    }

    /// Create an empty generator with a custom tag width.
    pub fn with_type_hash_len(type_hash_len: usize) -> Self {
        Self {
            type_hash_len,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide generator.
    ///
    /// Nothing in eventure uses it implicitly; pass it to
    /// `EventLog::with_generator` to share counters across every log in the
    /// process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<IdGenerator>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(IdGenerator::new())))
    }

    /// Tag width this generator produces.
    pub fn type_hash_len(&self) -> usize {
        self.type_hash_len
    }

    /// Tag for `event_type` at this generator's width.
    pub fn type_hash(&self, event_type: &str) -> String {
        type_hash_with_len(event_type, self.type_hash_len)
    }

    /// Next sequence number for `(tick, type_hash)`, starting at 1.
    pub fn next_sequence(&self, tick: u64, type_hash: &str) -> u64 {
        let mut sequences = self.sequences.lock();
        let counter = sequences
            .entry(tick)
            .or_default()
            .entry(type_hash.to_string())
            .or_insert(0);
        *counter += 1;
        *counter
    }

    /// Last sequence issued (or observed) for `(tick, type_hash)`.
    pub fn last_sequence(&self, tick: u64, type_hash: &str) -> Option<u64> {
        self.sequences
            .lock()
            .get(&tick)
            .and_then(|by_hash| by_hash.get(type_hash))
            .copied()
    }

    /// Generate a fresh `"{tick}-{typeHash}-{sequence}"` ID.
    pub fn generate_id(&self, tick: u64, event_type: &str) -> String {
        let type_hash = self.type_hash(event_type);
        let sequence = self.next_sequence(tick, &type_hash);
        IdParts {
            tick,
            type_hash,
            sequence,
        }
        .to_string()
    }

    /// Record an existing ID so later IDs for the same key never repeat it.
    ///
    /// Returns `false` when `id` is not in the structured format, in which
    /// case the table is left untouched.
    pub fn observe(&self, id: &str) -> bool {
        let Some(parts) = IdParts::parse(id) else {
            return false;
        };
        let mut sequences = self.sequences.lock();
        let counter = sequences
            .entry(parts.tick)
            .or_default()
            .entry(parts.type_hash)
            .or_insert(0);
        *counter = (*counter).max(parts.sequence);
        true
    }

    /// Raise every counter to at least the value `other` holds for it.
    ///
    /// Afterwards this generator never reissues an ID `other` has issued or
    /// observed.
    pub fn absorb(&self, other: &IdGenerator) {
        if std::ptr::eq(self, other) {
            return;
        }
        let theirs = other.sequences.lock().clone();
        let mut sequences = self.sequences.lock();
        for (tick, by_hash) in theirs {
            let ours = sequences.entry(tick).or_default();
            for (type_hash, last) in by_hash {
                let counter = ours.entry(type_hash).or_insert(0);
                *counter = (*counter).max(last);
            }
        }
    }

    /// Forget every counter. IDs issued afterwards start again at 1.
    pub fn reset(&self) {
        let mut sequences = self.sequences.lock();
        debug!(ticks = sequences.len(), "id sequences reset");
        sequences.clear();
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("type_hash_len", &self.type_hash_len)
            .field("ticks", &self.sequences.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn type_hash_is_four_uppercase_letters() {
        for t in ["user.created", "order.completed", "tick", "a", ""] {
            let h = type_hash(t);
            assert!(h.len() <= 4, "{t}: {h}");
            assert!(h.chars().all(|c| c.is_ascii_uppercase()), "{t}: {h}");
        }
        assert_eq!(type_hash("user.created").len(), 4);
    }

    #[test]
    fn type_hash_is_deterministic() {
        assert_eq!(type_hash("user.created"), type_hash("user.created"));
        assert_eq!(IdGenerator::new().type_hash("x.y"), type_hash("x.y"));
    }

    #[test]
    fn type_hash_follows_md5_letters() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e -> letters d,d,c,d,...
        assert_eq!(type_hash(""), "DDCD");
        // md5("user.created") = f97c823442f25b71...
        assert_eq!(type_hash("user.created"), "FCFB");
        assert_eq!(type_hash("order.completed"), "DADC");
    }

    #[test]
    fn widened_hash_extends_the_default_one() {
        let short = type_hash("user.created");
        let wide = type_hash_with_len("user.created", 8);
        assert!(wide.starts_with(&short));
        assert!(wide.len() > short.len());
    }

    #[test]
    fn sequence_starts_at_one_per_key() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_sequence(0, "ABCD"), 1);
        assert_eq!(ids.next_sequence(0, "ABCD"), 2);
        assert_eq!(ids.next_sequence(0, "EFAB"), 1);
        assert_eq!(ids.next_sequence(1, "ABCD"), 1);
        assert_eq!(ids.last_sequence(0, "ABCD"), Some(2));
        assert_eq!(ids.last_sequence(9, "ABCD"), None);
    }

    #[test]
    fn generate_id_format() {
        let ids = IdGenerator::new();
        let hash = type_hash("user.created");
        assert_eq!(ids.generate_id(3, "user.created"), format!("3-{hash}-1"));
        assert_eq!(ids.generate_id(3, "user.created"), format!("3-{hash}-2"));
        assert_eq!(ids.generate_id(4, "user.created"), format!("4-{hash}-1"));
    }

    #[test]
    fn generators_are_independent() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        assert_eq!(a.generate_id(0, "x"), b.generate_id(0, "x"));
    }

    #[test]
    fn reset_restarts_sequences() {
        let ids = IdGenerator::new();
        let first = ids.generate_id(0, "user.created");
        ids.reset();
        assert_eq!(ids.generate_id(0, "user.created"), first);
    }

    #[test]
    fn observe_advances_past_existing_ids() {
        let ids = IdGenerator::new();
        let hash = type_hash("user.created");
        assert!(ids.observe(&format!("2-{hash}-5")));
        assert_eq!(ids.generate_id(2, "user.created"), format!("2-{hash}-6"));
        // Lower observations never move the counter backwards.
        assert!(ids.observe(&format!("2-{hash}-1")));
        assert_eq!(ids.generate_id(2, "user.created"), format!("2-{hash}-7"));
    }

    #[test]
    fn colliding_types_share_one_counter() {
        // Both digests start with the letters f,e,a,f.
        assert_eq!(type_hash("type.15"), "FEAF");
        assert_eq!(type_hash("type.26"), "FEAF");

        let ids = IdGenerator::new();
        assert_eq!(ids.generate_id(7, "type.15"), "7-FEAF-1");
        assert_eq!(ids.generate_id(7, "type.26"), "7-FEAF-2");
        assert_eq!(ids.generate_id(7, "type.15"), "7-FEAF-3");

        assert_eq!(type_hash_with_len("type.15", 8), "FEAFEBDA");
        assert_eq!(type_hash_with_len("type.26", 8), "FEAFBFDA");
        let wide = IdGenerator::with_type_hash_len(8);
        assert_eq!(wide.generate_id(7, "type.15"), "7-FEAFEBDA-1");
        assert_eq!(wide.generate_id(7, "type.26"), "7-FEAFBFDA-1");
    }

    #[test]
    fn absorb_takes_the_higher_counter() {
        let ours = IdGenerator::new();
        let theirs = IdGenerator::new();
        let _ = ours.generate_id(0, "a");
        for _ in 0..3 {
            let _ = theirs.generate_id(0, "a");
        }
        let _ = theirs.generate_id(5, "x");

        ours.absorb(&theirs);
        assert_eq!(ours.generate_id(0, "a"), "0-CCBC-4");
        assert_eq!(ours.generate_id(5, "x"), "5-DDEC-2");

        // Absorbing a lower table never moves counters back.
        ours.absorb(&IdGenerator::new());
        assert_eq!(ours.generate_id(0, "a"), "0-CCBC-5");
        ours.absorb(&ours);
        assert_eq!(ours.last_sequence(0, "CCBC"), Some(5));
        assert_eq!(theirs.last_sequence(0, "CCBC"), Some(3));
    }

    #[test]
    fn observe_ignores_unstructured_ids() {
        let ids = IdGenerator::new();
        assert!(!ids.observe("custom-id"));
        assert!(!ids.observe("evt_0190"));
        assert_eq!(ids.last_sequence(0, "custom"), None);
    }

    #[test]
    fn id_parts_parse_and_display() {
        let parts = IdParts::parse("12-ABCD-3").unwrap();
        assert_eq!(parts.tick, 12);
        assert_eq!(parts.type_hash, "ABCD");
        assert_eq!(parts.sequence, 3);
        assert_eq!(parts.to_string(), "12-ABCD-3");
        assert_eq!("12-ABCD-3".parse::<IdParts>().unwrap(), parts);
    }

    #[test]
    fn id_parts_rejects_other_shapes() {
        for bad in ["", "abc", "1-ABCD", "1-ABCD-x", "x-ABCD-1", "1-AB1D-1", "1-A-2-3"] {
            assert!(IdParts::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn global_is_shared() {
        let a = IdGenerator::global();
        let b = IdGenerator::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_generation_stays_unique() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| ids.generate_id(0, "load.test"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    proptest! {
        #[test]
        fn generated_ids_never_repeat(
            calls in proptest::collection::vec((0u64..4, "[a-z]{1,6}(\\.[a-z]{1,6})?"), 1..64),
        ) {
            let ids = IdGenerator::new();
            let mut seen = HashSet::new();
            for (tick, event_type) in &calls {
                let id = ids.generate_id(*tick, event_type);
                prop_assert!(seen.insert(id.clone()), "repeated {}", id);
                let parts = IdParts::parse(&id).unwrap();
                prop_assert_eq!(parts.tick, *tick);
            }
        }
    }
}
