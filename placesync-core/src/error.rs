//! Error types for placesync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RecordId;

/// All errors that can arise from local store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/flush path).
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on open, with the offending file.
    #[error("failed to parse store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No record with this id exists.
    #[error("record {id} not found")]
    RecordNotFound { id: RecordId },

    /// Attempt to blank a field that must never be cleared once set.
    #[error("refusing to clear protected field '{key}' on record {id}")]
    ProtectedField { id: RecordId, key: String },

    /// The store refused to create a record.
    #[error("record creation rejected: {0}")]
    Rejected(String),
}

/// All errors that can arise while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    /// An environment variable is set but unusable.
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None` and no store path was configured.
    #[error("cannot determine home directory; set $HOME or PLACESYNC_STORE")]
    HomeNotFound,
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
