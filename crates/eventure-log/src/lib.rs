//! # eventure-log
//!
//! Append-only event store with causal queries.
//!
//! - [`EventLog`] owns an ordered `Vec<Event>` and the current tick
//! - Cascade and ancestor walks over `parent_id` links ([`cascade`])
//! - Newline-delimited JSON save/load ([`persist`])
//!
//! ## Crate Position
//!
//! Depends on `eventure-core`. Observed (never mutated) by `eventure-bus`.

#![deny(unsafe_code)]

pub mod cascade;
pub mod log;
pub mod persist;

pub use cascade::{CascadeAnomaly, CascadeReport};
pub use log::EventLog;
