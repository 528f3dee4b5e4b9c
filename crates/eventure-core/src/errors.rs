//! Error taxonomy for event persistence.
//!
//! Lookups that miss (unknown event IDs, empty ticks) are not errors and never
//! surface here; they return `None` or an empty `Vec`. Only hard failures do.

use std::path::PathBuf;

/// Errors raised while persisting or restoring events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The file could not be opened, read, or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A line in an event file is not a valid event record.
    #[error("malformed event on line {line}: {source}")]
    Decode {
        /// 1-based line number in the file.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An event could not be encoded as JSON.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl EventError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Encode(_) => "encode",
        }
    }
}

/// Convenience alias used across the eventure crates.
pub type Result<T> = std::result::Result<T, EventError>;
