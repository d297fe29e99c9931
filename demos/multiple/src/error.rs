//! Error types for the multiple-observers demo

use thiserror::Error;

/// Demo error type
#[derive(Debug, Error)]
pub enum Error {
    /// The config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid RON
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Result type for the demo
pub type Result<T> = std::result::Result<T, Error>;
