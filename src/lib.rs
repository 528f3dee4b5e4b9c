//! # eventure
//!
//! Tick-ordered in-process events with causal replay.
//!
//! Re-exports the workspace crates under one roof:
//!
//! - [`Event`], [`IdGenerator`] from `eventure-core`
//! - [`EventLog`] from `eventure-log`
//! - [`EventBus`] from `eventure-bus`
//! - [`EventureSettings`] from `eventure-settings`
//!
//! plus a text renderer for cascades and ticks ([`render`]) and the
//! simulation driven by `eventure demo` ([`demo`]).

#![deny(unsafe_code)]

pub mod demo;
pub mod render;

pub use eventure_bus::{EventBus, Handler, Pattern, PublishOptions, Subscription};
pub use eventure_core::logging::{init_logging, LogConfig, LoggingError};
pub use eventure_core::{
    now_timestamp, type_hash, type_hash_with_len, Event, EventData, EventError, IdGenerator,
    IdParts, DEFAULT_TYPE_HASH_LEN,
};
pub use eventure_log::{CascadeAnomaly, CascadeReport, EventLog};
pub use eventure_settings::{EventureSettings, SettingsError};
