//! Error types for bkt-core
//!
//! Provides a unified error type shared by the config loader, the watcher,
//! the logger and the storage adapter.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bkt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bkt-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be opened or read
    #[error("Could not load config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected schema
    #[error("Invalid json file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration value error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// File watcher setup error
    #[error("Could not watch for file: {0}")]
    Watch(String),

    /// Logger construction or installation error
    #[error("Logging error: {0}")]
    Logging(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or service error
    #[error("Network error: {0}")]
    Network(String),

    /// Waiting on the remote service gave up
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A batch delete removed only part of the requested keys
    #[error("Failed to delete {} object(s) from bucket {bucket}: {}", failed.len(), failed.join(", "))]
    PartialDelete { bucket: String, failed: Vec<String> },

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the error came from loading the configuration file
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. } | Error::ConfigParse { .. } | Error::Config(_)
        )
    }
}
