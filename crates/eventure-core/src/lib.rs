//! # eventure-core
//!
//! Foundation types shared by every eventure crate:
//!
//! - **Events**: [`event::Event`], the immutable record of one state change,
//!   with its newline-delimited JSON wire format
//! - **IDs**: [`ids::IdGenerator`] and [`ids::type_hash`], producing
//!   `"{tick}-{typeHash}-{sequence}"` identifiers
//! - **Errors**: [`errors::EventError`] for persistence I/O and decoding
//! - **Logging**: [`logging::init_logging`] to install a `tracing` subscriber
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `eventure-log`, `eventure-bus` and the
//! `eventure` facade.

#![deny(unsafe_code)]

pub mod errors;
pub mod event;
pub mod ids;
pub mod logging;

pub use errors::{EventError, Result};
pub use event::{now_timestamp, Event, EventData};
pub use ids::{type_hash, type_hash_with_len, IdGenerator, IdParts, DEFAULT_TYPE_HASH_LEN};
