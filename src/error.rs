use thiserror::Error;

use crate::config::ConfigError;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum CbirIndexError {
    /// A precondition on a core API was violated: empty input, dimension
    /// mismatch, axis or image index out of range, zero capacity or size.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Peek or dequeue on an empty bounded priority queue.
    #[error("Queue is empty")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A feature-cache file does not match the expected layout.
    #[error("Malformed feature cache: {0}")]
    FeatureCache(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Alias for `Result<T, CbirIndexError>`.
pub type Result<T> = std::result::Result<T, CbirIndexError>;
