//! Common utilities for resbin.
//!
//! This crate provides the low-level pieces shared by the chunk decoders:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`ReadExt`] - Streaming field reads with distinct end-of-stream reporting
//! - [`bits`] - Read-modify-write helpers for packed bit fields

mod error;
mod reader;

pub mod bits;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export the little-endian wire integer types used by fixed-layout records.
pub use zerocopy::byteorder::little_endian::{U16 as LeU16, U32 as LeU32};
