//! Generic chunk header shared by every resource chunk.

use std::io::Read;

use resbin_common::{LeU16, LeU32, ReadExt};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Chunk type identifiers.
///
/// The values are the actual binary values of the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u16)]
pub enum ChunkType {
    Null = 0x0000,
    StringPool = 0x0001,
    Table = 0x0002,
    Xml = 0x0003,
    XmlStartNamespace = 0x0100,
    XmlEndNamespace = 0x0101,
    XmlStartElement = 0x0102,
    XmlEndElement = 0x0103,
    XmlCData = 0x0104,
    XmlResourceMap = 0x0180,
    TablePackage = 0x0200,
    TableType = 0x0201,
    TableTypeSpec = 0x0202,
    TableLibrary = 0x0203,
}

impl ChunkType {
    /// Parse from a u16 value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Self::Null),
            0x0001 => Some(Self::StringPool),
            0x0002 => Some(Self::Table),
            0x0003 => Some(Self::Xml),
            0x0100 => Some(Self::XmlStartNamespace),
            0x0101 => Some(Self::XmlEndNamespace),
            0x0102 => Some(Self::XmlStartElement),
            0x0103 => Some(Self::XmlEndElement),
            0x0104 => Some(Self::XmlCData),
            0x0180 => Some(Self::XmlResourceMap),
            0x0200 => Some(Self::TablePackage),
            0x0201 => Some(Self::TableType),
            0x0202 => Some(Self::TableTypeSpec),
            0x0203 => Some(Self::TableLibrary),
            _ => None,
        }
    }

    /// Get the name of this chunk type as used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "RES_NULL_TYPE",
            Self::StringPool => "RES_STRING_POOL_TYPE",
            Self::Table => "RES_TABLE_TYPE",
            Self::Xml => "RES_XML_TYPE",
            Self::XmlStartNamespace => "RES_XML_START_NAMESPACE_TYPE",
            Self::XmlEndNamespace => "RES_XML_END_NAMESPACE_TYPE",
            Self::XmlStartElement => "RES_XML_START_ELEMENT_TYPE",
            Self::XmlEndElement => "RES_XML_END_ELEMENT_TYPE",
            Self::XmlCData => "RES_XML_CDATA_TYPE",
            Self::XmlResourceMap => "RES_XML_RESOURCE_MAP_TYPE",
            Self::TablePackage => "RES_TABLE_PACKAGE_TYPE",
            Self::TableType => "RES_TABLE_TYPE_TYPE",
            Self::TableTypeSpec => "RES_TABLE_TYPE_SPEC_TYPE",
            Self::TableLibrary => "RES_TABLE_LIBRARY_TYPE",
        }
    }
}

/// On-disk layout of a chunk header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawChunkHeader {
    chunk_type: LeU16,
    header_size: LeU16,
    size: LeU32,
}

/// Header that starts every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChunkHeader {
    /// Raw chunk type; see [`ChunkHeader::chunk_type`].
    pub type_id: u16,
    /// Size of the chunk header in bytes, including these 8 bytes.
    pub header_size: u16,
    /// Total size of the chunk in bytes, including the header.
    pub total_size: u32,
}

impl ChunkHeader {
    /// Size of the generic header on the wire.
    pub const SIZE: u16 = 8;

    /// Create a validated header.
    pub fn new(type_id: u16, header_size: u16, total_size: u32) -> Result<Self> {
        if header_size < Self::SIZE || total_size < u32::from(header_size) {
            return Err(Error::InvalidChunkHeader {
                chunk_type: type_id,
                header_size,
                total_size,
            });
        }
        Ok(Self {
            type_id,
            header_size,
            total_size,
        })
    }

    /// Read a header from the stream.
    ///
    /// Returns `None` when the stream ends cleanly before the first byte of a
    /// header. A partial header is an [`Error::Common`] end-of-buffer error.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Self>> {
        let Some(raw) = reader.try_read_struct::<RawChunkHeader>()? else {
            return Ok(None);
        };
        Self::new(raw.chunk_type.get(), raw.header_size.get(), raw.size.get()).map(Some)
    }

    /// The known chunk type, or `None` for an unrecognised identifier.
    pub fn chunk_type(&self) -> Option<ChunkType> {
        ChunkType::from_u16(self.type_id)
    }

    /// Bytes following the generic 8-byte header.
    pub fn body_size(&self) -> u64 {
        u64::from(self.total_size - u32::from(Self::SIZE))
    }

    /// Bytes of type-specific header following the generic 8-byte header.
    pub fn extended_header_size(&self) -> u64 {
        u64::from(self.header_size - Self::SIZE)
    }

    /// Human-readable chunk type for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.chunk_type().map_or("UNKNOWN", |t| t.as_str())
    }
}
