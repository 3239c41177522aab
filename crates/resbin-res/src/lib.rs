//! Android resource chunk primitives.
//!
//! Compiled Android resources (`resources.arsc`, binary `AndroidManifest.xml`
//! and layouts) are sequences of little-endian chunks. This crate decodes the
//! building blocks shared by every chunk kind:
//!
//! - [`ChunkHeader`] - The 8-byte header starting every chunk
//! - [`StringPool`] - UTF-8 / UTF-16 string pools with style spans
//! - [`ResValue`] - Typed values, including complex dimension/fraction encoding
//! - [`ResourceMap`] - Attribute resource ids of a binary XML document
//! - [`ResourceConfig`] - Bit-packed configuration qualifiers
//! - [`table`] - Resource table header records
//!
//! # Example
//!
//! ```no_run
//! use resbin_res::{ChunkHeader, ChunkType, StringPool};
//!
//! let data = std::fs::read("strings.chunk")?;
//! let mut stream = &data[..];
//!
//! if let Some(header) = ChunkHeader::read(&mut stream)? {
//!     if header.chunk_type() == Some(ChunkType::StringPool) {
//!         let pool = StringPool::read(&header, &mut stream)?;
//!         for s in pool.strings() {
//!             println!("{s}");
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chunk;
mod error;
mod reference;
mod resource_map;
mod string_pool;
mod value;

pub mod config;
pub mod table;

pub use chunk::{ChunkHeader, ChunkType};
pub use config::{ConfigField, ResourceConfig};
pub use error::{Error, Result};
pub use reference::{ResRef, StringRef, NO_ENTRY};
pub use resource_map::ResourceMap;
pub use string_pool::{StringPool, StringPoolFlags, StringPoolHeader, StyleSpan, Styles};
pub use value::{
    complex_to_float, float_to_complex, Color, DimensionUnit, FractionUnit, ResValue, Value,
    ValueType,
};
