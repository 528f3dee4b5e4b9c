//! # eventure-bus
//!
//! In-process publish/subscribe for [`Event`](eventure_core::Event)s.
//!
//! Handlers subscribe to an exact type (`"user.created"`), a dot-prefix
//! (`"user.*"`) or everything (`"*"`). Publishing builds an event, stamped
//! with the attached log's tick when one is set, and calls every matching
//! handler synchronously before returning it.
//!
//! ```ignore
//! let log = Arc::new(EventLog::new());
//! let bus = EventBus::with_log(&log);
//! let _sub = bus.subscribe("user.*", |e| println!("{}", e.id()));
//! let event = bus.publish("user.created", EventData::new());
//! log.append(event);
//! ```
//!
//! ## Crate Position
//!
//! Depends on `eventure-core` and `eventure-log`.

#![deny(unsafe_code)]

pub mod bus;
pub mod pattern;

pub use bus::{EventBus, Handler, PublishOptions, Subscription};
pub use pattern::Pattern;
