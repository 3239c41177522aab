//! Error types for resbin-common.

use thiserror::Error;

/// Common error type for resbin operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Seek target lies outside the buffer.
    #[error("offset {offset} out of bounds (buffer size: {size})")]
    OffsetOutOfBounds { offset: usize, size: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
