//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`EventureSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `EVENTURE_*` environment overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{EventureSettings, MAX_TYPE_HASH_LEN};

/// Resolve the settings file path.
///
/// `$EVENTURE_HOME/settings.json` when `EVENTURE_HOME` is set, otherwise
/// `~/.eventure/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(home) = read_env_string("EVENTURE_HOME") {
        return PathBuf::from(home).join("settings.json");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".eventure").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<EventureSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. An unreadable file or invalid JSON is an
/// error.
pub fn load_settings_from_path(path: &Path) -> Result<EventureSettings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// [`load_settings_from_path`] with an injectable environment lookup.
pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EventureSettings> {
    let defaults = serde_json::to_value(EventureSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: EventureSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `EVENTURE_*` overrides read from the process environment.
pub fn apply_env_overrides(settings: &mut EventureSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply `EVENTURE_*` overrides from an arbitrary lookup.
///
/// Invalid values are logged and ignored, leaving the file/default value.
pub fn apply_overrides(settings: &mut EventureSettings, env: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

    if let Some(v) = lookup("EVENTURE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = lookup("EVENTURE_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => warn!(key = "EVENTURE_LOG_JSON", value = %v, "invalid boolean env var, ignoring"),
        }
    }
    if let Some(v) = lookup("EVENTURE_LOG_PATH") {
        settings.storage.log_path = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("EVENTURE_TYPE_HASH_LEN") {
        match parse_usize_range(&v, 1, MAX_TYPE_HASH_LEN) {
            Some(n) => settings.ids.type_hash_len = n,
            None => {
                warn!(key = "EVENTURE_TYPE_HASH_LEN", value = %v, "invalid usize env var, ignoring");
            }
        }
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
