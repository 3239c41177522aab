//! Chunk dispatching.
//!
//! Reads one chunk header at a time, bounds the chunk body and hands it to the
//! matching decoder. Unknown chunks and unread trailing bytes are reported to
//! a [`Diagnostics`] sink and otherwise ignored.

use std::io::{self, Read};

use resbin_common::ReadExt;
use resbin_res::{ChunkHeader, ChunkType, ResourceMap, StringPool};

use crate::diagnostics::{Diagnostics, Warning};
use crate::node::{AttrExt, CDataExt, EndElementExt, NamespaceExt, NodeHeader, XmlNode};
use crate::Result;

/// A decoded chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// The document root chunk; its body holds all further chunks.
    StartDocument,
    StringPool(StringPool),
    ResourceMap(ResourceMap),
    Node(XmlNode),
}

/// Sequential chunk reader over a byte stream.
#[derive(Debug)]
pub struct ChunkDispatcher<R> {
    stream: io::Take<R>,
}

impl<R: Read> ChunkDispatcher<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: reader.take(u64::MAX),
        }
    }

    /// Bytes the dispatcher may still read, `u64::MAX` until a document
    /// root chunk narrows it.
    pub fn limit(&self) -> u64 {
        self.stream.limit()
    }

    pub fn into_inner(self) -> R {
        self.stream.into_inner()
    }

    /// Decode the next chunk, skipping unknown ones.
    ///
    /// Returns `None` when the stream ends cleanly at a chunk boundary.
    pub fn next_chunk<D: Diagnostics + ?Sized>(&mut self, diagnostics: &mut D) -> Result<Option<Chunk>> {
        loop {
            let Some(header) = ChunkHeader::read(&mut self.stream)? else {
                return Ok(None);
            };
            tracing::trace!(
                chunk_type = header.type_name(),
                header_size = header.header_size,
                total_size = header.total_size,
                "dispatching chunk"
            );

            if header.chunk_type() == Some(ChunkType::Xml) {
                // A nested root chunk may only narrow the enclosing bound.
                let limit = header.body_size().min(self.stream.limit());
                self.stream.set_limit(limit);
                self.stream.skip_bytes(header.extended_header_size())?;
                return Ok(Some(Chunk::StartDocument));
            }

            let mut body = (&mut self.stream).take(header.body_size());
            let chunk = match header.chunk_type() {
                Some(ChunkType::StringPool) => Some(Chunk::StringPool(StringPool::read(&header, &mut body)?)),
                Some(ChunkType::XmlResourceMap) => {
                    Some(Chunk::ResourceMap(ResourceMap::read(&header, &mut body)?))
                }
                Some(ChunkType::XmlStartNamespace) => Some(Chunk::Node(XmlNode::StartNamespace {
                    header: NodeHeader::read(&header, &mut body)?,
                    namespace: NamespaceExt::read(&mut body)?,
                })),
                Some(ChunkType::XmlEndNamespace) => Some(Chunk::Node(XmlNode::EndNamespace {
                    header: NodeHeader::read(&header, &mut body)?,
                    namespace: NamespaceExt::read(&mut body)?,
                })),
                Some(ChunkType::XmlStartElement) => {
                    let node = NodeHeader::read(&header, &mut body)?;
                    let element = AttrExt::read(&mut body)?;
                    let attributes = element.read_attributes(&mut body)?;
                    Some(Chunk::Node(XmlNode::StartElement {
                        header: node,
                        element,
                        attributes,
                    }))
                }
                Some(ChunkType::XmlEndElement) => Some(Chunk::Node(XmlNode::EndElement {
                    header: NodeHeader::read(&header, &mut body)?,
                    element: EndElementExt::read(&mut body)?,
                })),
                Some(ChunkType::XmlCData) => Some(Chunk::Node(XmlNode::Text {
                    header: NodeHeader::read(&header, &mut body)?,
                    text: CDataExt::read(&mut body)?,
                })),
                _ => {
                    diagnostics.warn(Warning::SkippedChunk {
                        type_id: header.type_id,
                    });
                    None
                }
            };

            let leftover = body.drain()?;
            let missing = body.limit();
            if missing > 0 {
                return Err(resbin_common::Error::UnexpectedEof {
                    needed: header.body_size() as usize,
                    available: (header.body_size() - missing) as usize,
                }
                .into());
            }
            if chunk.is_some() && leftover > 0 {
                diagnostics.warn(Warning::TrailingBytes {
                    type_id: header.type_id,
                    bytes: leftover,
                });
            }

            if let Some(chunk) = chunk {
                return Ok(Some(chunk));
            }
        }
    }
}
