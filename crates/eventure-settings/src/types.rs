//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every section is `#[serde(default)]`,
//! so a settings file only needs the keys it overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Widest type tag an MD5 digest can yield.
pub const MAX_TYPE_HASH_LEN: usize = 32;

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "ids": { "typeHashLen": 6 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventureSettings {
    /// Settings schema version.
    pub version: String,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Event file locations.
    pub storage: StorageSettings,
    /// Event ID generation.
    pub ids: IdSettings,
}

impl Default for EventureSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            logging: LoggingSettings::default(),
            storage: StorageSettings::default(),
            ids: IdSettings::default(),
        }
    }
}

impl EventureSettings {
    /// Reject values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<()> {
        let len = self.ids.type_hash_len;
        if !(1..=MAX_TYPE_HASH_LEN).contains(&len) {
            return Err(SettingsError::InvalidValue(format!(
                "ids.typeHashLen must be 1..={MAX_TYPE_HASH_LEN}, got {len}"
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level. `RUST_LOG` still wins when set.
    pub level: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
    /// Per-module level overrides, e.g. `{"eventure_bus": "trace"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

/// Event file locations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Event file used when a command is given no explicit path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

/// Event ID generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdSettings {
    /// Width of the alphabetic type tag in generated IDs.
    pub type_hash_len: usize,
}

impl Default for IdSettings {
    fn default() -> Self {
        Self { type_hash_len: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let settings = EventureSettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.json);
        assert!(settings.storage.log_path.is_none());
        assert_eq!(settings.ids.type_hash_len, 4);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn camel_case_on_disk() {
        let json = serde_json::to_value(EventureSettings::default()).unwrap();
        assert_eq!(json["ids"]["typeHashLen"], 4);
        assert!(json["logging"].get("moduleLevels").is_some());
        assert!(json["storage"].get("logPath").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: EventureSettings =
            serde_json::from_str(r#"{"ids": {"typeHashLen": 6}}"#).unwrap();
        assert_eq!(settings.ids.type_hash_len, 6);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn validate_rejects_zero_width_hash() {
        let mut settings = EventureSettings::default();
        settings.ids.type_hash_len = 0;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
        settings.ids.type_hash_len = MAX_TYPE_HASH_LEN + 1;
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn validate_rejects_blank_level() {
        let mut settings = EventureSettings::default();
        settings.logging.level = "  ".into();
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(msg)) if msg.contains("logging.level"));
    }
}
