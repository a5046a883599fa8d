//! Error types for placesync-sync.

use thiserror::Error;

use placesync_core::StoreError;

/// Failure to obtain a usable remote entity set. Always aborts the run for
/// that language pair.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with something other than 200.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The body is not a JSON array of entities.
    #[error("unparseable response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed but empty array.
    #[error("empty entity list from {url}")]
    Empty { url: String },
}

/// All errors that can abort a sync run before any write happens.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote set could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The local set could not be queried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
