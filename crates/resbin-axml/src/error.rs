//! Error types for binary XML parsing.

use thiserror::Error;

/// Errors that can occur when parsing or converting binary XML documents.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] resbin_common::Error),

    /// Resource chunk error.
    #[error("{0}")]
    Res(#[from] resbin_res::Error),

    /// Attribute index out of bounds.
    #[error("attribute index {index} out of bounds (attribute count: {count})")]
    AttributeIndexOutOfBounds { index: usize, count: usize },

    /// Attribute records overlap the extension header or each other.
    #[error("invalid attribute layout: start {start}, record size {size}")]
    InvalidAttributeLayout { start: u16, size: u16 },

    /// A string reference was resolved before any string pool chunk.
    #[error("string {0} referenced before a string pool was read")]
    MissingStringPool(u32),

    /// The parser is single-pass.
    #[error("restarting the parser is not supported")]
    RestartUnsupported,

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for binary XML operations.
pub type Result<T> = std::result::Result<T, Error>;
