//! Android binary XML pull parser.
//!
//! Compiled Android XML files (`AndroidManifest.xml`, layouts, drawables)
//! are a document chunk wrapping a string pool, an optional resource map and
//! one chunk per XML node. [`XmlParser`] walks those chunks and exposes them
//! as a stream of [`XmlEvent`]s, much like a streaming XML reader.
//!
//! # Example
//!
//! ```no_run
//! use resbin_axml::XmlParser;
//!
//! let data = std::fs::read("AndroidManifest.xml")?;
//! let mut parser = XmlParser::new(&data[..]);
//!
//! let xml_string = parser.to_xml_string()?;
//! println!("{}", xml_string);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod parser;

pub mod diagnostics;
pub mod dispatch;
pub mod node;

#[cfg(feature = "xml-output")]
mod writer;

#[cfg(test)]
mod testutil;

pub use diagnostics::{Diagnostics, TracingDiagnostics, Warning};
pub use dispatch::{Chunk, ChunkDispatcher};
pub use error::{Error, Result};
pub use node::{Attribute, XmlNode};
pub use parser::{AttributeInfo, XmlEvent, XmlParser};
