//! Error types for mneme-core

use thiserror::Error;

/// Core error type
///
/// Backend failures never show up here: drivers absorb them and report
/// `false`/`None` instead. What remains are caller mistakes and data that
/// cannot be encoded or decoded.
#[derive(Debug, Error)]
pub enum Error {
    /// Index-based mutation on a record that does not exist
    #[error("index {index} out of range for storage of length {len}")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of records held at the time of the call
        len: usize,
    },

    /// Invalid configuration (empty driver chain, unknown backend, bad values)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Record encoding / decoding error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend error raised while constructing a driver
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
