//! Error types for resource chunk decoding.

use thiserror::Error;

/// Errors that can occur when decoding or manipulating resource records.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] resbin_common::Error),

    /// Chunk header sizes are inconsistent.
    #[error("invalid chunk header: type {chunk_type:#06x}, header size {header_size}, total size {total_size}")]
    InvalidChunkHeader {
        chunk_type: u16,
        header_size: u16,
        total_size: u32,
    },

    /// String index out of bounds.
    #[error("string index {index} out of bounds (string count: {count})")]
    StringIndexOutOfBounds { index: u32, count: usize },

    /// A string offset points outside the string data.
    #[error("string offset {offset} out of bounds (chunk size: {size})")]
    StringOffsetOutOfBounds { offset: u32, size: usize },

    /// A typed value was read through an accessor for a different type.
    #[error("value type mismatch: expected {expected}, got type {actual:#04x}")]
    TypeMismatch { expected: &'static str, actual: u8 },

    /// A complex value does not fit the 24-bit mantissa.
    #[error("value {0} is too large to store in a complex field")]
    ComplexOutOfRange(f32),

    /// A mutation was attempted whose precondition does not hold.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// An argument was outside its allowed domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for resource chunk operations.
pub type Result<T> = std::result::Result<T, Error>;
