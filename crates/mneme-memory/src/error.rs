//! Error types for mneme-memory

use thiserror::Error;

/// Memory error type
#[derive(Debug, Error)]
pub enum Error {
    /// Compressor or completion backend failed
    #[error("compression error: {0}")]
    Compression(String),

    /// Invalid budget or strategy settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage layer error
    #[error(transparent)]
    Core(#[from] mneme_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
