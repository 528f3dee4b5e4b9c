//! # eventure-settings
//!
//! Configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`EventureSettings::default()`]
//! 2. **User file**: `~/.eventure/settings.json` (or `$EVENTURE_HOME/settings.json`),
//!    deep-merged over defaults
//! 3. **Environment variables**: `EVENTURE_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use eventure_settings::load_settings;
//!
//! let settings = load_settings()?;
//! println!("log level: {}", settings.logging.level);
//! # Ok::<(), eventure_settings::SettingsError>(())
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    load_settings_with, settings_path,
};
pub use types::{EventureSettings, IdSettings, LoggingSettings, StorageSettings, MAX_TYPE_HASH_LEN};
