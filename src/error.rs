//! Error types for the notifier
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Notifier Error Enum ==
/// Unified error type for the notifier.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// TTL passed to the dedup cache was zero or negative
    #[error("Invalid TTL: {0} (must be a positive number of seconds)")]
    InvalidTtl(i64),

    /// Cache method called after destroy
    #[error("Cache has been destroyed")]
    Destroyed,

    /// Snapshot file could not be read or written
    #[error("Snapshot I/O failed for {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but does not parse
    #[error("Snapshot file {} is corrupt: {source}", path.display())]
    CorruptSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid or missing configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP request to a status endpoint or the webhook failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Webhook accepted the request but reported a non-zero error code
    #[error("Webhook rejected message (errcode {code}): {message}")]
    Webhook { code: i64, message: String },

    /// Status endpoint returned a payload that does not parse
    #[error("Malformed status payload: {0}")]
    Status(String),
}

// == Result Type Alias ==
/// Convenience Result type for the notifier.
pub type Result<T> = std::result::Result<T, NotifierError>;
