//! `tracing` subscriber bootstrap.
//!
//! Library code only emits `tracing` events; binaries call [`init_logging`]
//! once at startup. `RUST_LOG`, when set, wins over the configured level.
//! Output goes to stderr so command output on stdout stays clean.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
    /// Per-module overrides, e.g. `("eventure_bus", "trace")`.
    pub module_levels: Vec<(String, String)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            module_levels: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Render as an `EnvFilter` directive string.
    pub fn filter_directives(&self) -> String {
        let mut directives = self.level.to_lowercase();
        for (module, level) in &self.module_levels {
            directives.push(',');
            directives.push_str(module);
            directives.push('=');
            directives.push_str(&level.to_lowercase());
        }
        directives
    }
}

/// Failures installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The configured level or module overrides do not parse.
    #[error("invalid log filter {directives:?}: {source}")]
    InvalidFilter {
        /// Directive string that was rejected.
        directives: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// Another global subscriber was installed first.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Install the global `tracing` subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = config.filter_directives();
            EnvFilter::try_new(&directives)
                .map_err(|source| LoggingError::InvalidFilter { directives, source })?
        }
    };

    let (json_layer, text_layer) = if config.json {
        (
            Some(fmt::layer().json().with_target(true).with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(fmt::layer().with_target(true).with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_plain_info() {
        let config = LogConfig::default();
        assert_eq!(config.filter_directives(), "info");
        assert!(!config.json);
    }

    #[test]
    fn module_levels_are_appended() {
        let config = LogConfig {
            level: "WARN".into(),
            json: true,
            module_levels: vec![
                ("eventure_bus".into(), "TRACE".into()),
                ("eventure_log".into(), "debug".into()),
            ],
        };
        assert_eq!(
            config.filter_directives(),
            "warn,eventure_bus=trace,eventure_log=debug"
        );
    }

    #[test]
    fn directives_parse_as_env_filter() {
        let config = LogConfig {
            module_levels: vec![("eventure_log".into(), "debug".into())],
            ..LogConfig::default()
        };
        assert!(EnvFilter::try_new(config.filter_directives()).is_ok());
    }
}
