//! Resbin - Android compiled resource decoding library.
//!
//! This crate provides a unified interface to the resbin crates for working
//! with compiled Android resources.
//!
//! # Crates
//!
//! - [`resbin_common`] - Common utilities (field reading, bit fields)
//! - [`resbin_res`] - Resource chunks (string pools, typed values, configs, table headers)
//! - [`resbin_axml`] - Binary XML pull parsing and text XML conversion
//!
//! # Example
//!
//! ```no_run
//! use resbin::prelude::*;
//!
//! let data = std::fs::read("AndroidManifest.xml")?;
//! let mut parser = XmlParser::new(&data[..]);
//!
//! while !parser.advance()?.is_terminal() {
//!     if parser.event() == XmlEvent::StartTag {
//!         println!("{} ({} attributes)", parser.element_name()?, parser.attribute_count());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use resbin_axml as axml;
pub use resbin_common as common;
pub use resbin_res as res;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use resbin_axml::{AttributeInfo, Diagnostics, TracingDiagnostics, Warning, XmlEvent, XmlParser};
    pub use resbin_common::BinaryReader;
    pub use resbin_res::{
        ChunkHeader, ChunkType, ResRef, ResValue, ResourceConfig, ResourceMap, StringPool, StringRef,
        Value, ValueType,
    };
}

// Re-export commonly used types at the crate root
pub use resbin_axml::XmlParser;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
