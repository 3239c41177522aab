//! Binary XML node records.

use std::io::Read;

use resbin_common::{LeU16, LeU32, ReadExt};
use resbin_res::{ChunkHeader, ResValue, StringRef};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result, XmlEvent};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawNodeHeader {
    line_number: LeU32,
    comment: LeU32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawRefPair {
    first: LeU32,
    second: LeU32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawAttrExt {
    namespace: LeU32,
    name: LeU32,
    attribute_start: LeU16,
    attribute_size: LeU16,
    attribute_count: LeU16,
    id_index: LeU16,
    class_index: LeU16,
    style_index: LeU16,
}

/// Fields shared by every node chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeHeader {
    /// Line in the source XML the node came from.
    pub line_number: u32,
    /// Optional comment attached to the node.
    pub comment: StringRef,
}

impl NodeHeader {
    /// Size of the node header including the generic chunk header.
    pub const SIZE: u16 = ChunkHeader::SIZE + 8;

    /// Read the node header and skip any extra header bytes.
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let raw: RawNodeHeader = body.read_struct()?;
        if chunk.header_size > Self::SIZE {
            body.skip_bytes(u64::from(chunk.header_size - Self::SIZE))?;
        }
        Ok(Self {
            line_number: raw.line_number.get(),
            comment: StringRef::from_raw(raw.comment.get()),
        })
    }
}

/// Namespace start or end extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NamespaceExt {
    pub prefix: StringRef,
    pub uri: StringRef,
}

impl NamespaceExt {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let raw: RawRefPair = reader.read_struct()?;
        Ok(Self {
            prefix: StringRef::from_raw(raw.first.get()),
            uri: StringRef::from_raw(raw.second.get()),
        })
    }
}

/// Start element extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AttrExt {
    pub namespace: StringRef,
    pub name: StringRef,
    /// Byte offset from the start of this extension to the first attribute.
    pub attribute_start: u16,
    /// Size of each attribute record.
    pub attribute_size: u16,
    pub attribute_count: u16,
    /// 1-based index of the `id` attribute, 0 if none.
    pub id_index: u16,
    /// 1-based index of the `class` attribute, 0 if none.
    pub class_index: u16,
    /// 1-based index of the `style` attribute, 0 if none.
    pub style_index: u16,
}

impl AttrExt {
    /// Size of the extension on the wire.
    pub const SIZE: u16 = 20;

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let raw: RawAttrExt = reader.read_struct()?;
        Ok(Self {
            namespace: StringRef::from_raw(raw.namespace.get()),
            name: StringRef::from_raw(raw.name.get()),
            attribute_start: raw.attribute_start.get(),
            attribute_size: raw.attribute_size.get(),
            attribute_count: raw.attribute_count.get(),
            id_index: raw.id_index.get(),
            class_index: raw.class_index.get(),
            style_index: raw.style_index.get(),
        })
    }

    /// Read the attribute records this extension describes.
    ///
    /// The stream must be positioned right after the extension.
    pub fn read_attributes<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Vec<Attribute>> {
        if self.attribute_count == 0 {
            return Ok(Vec::new());
        }
        if self.attribute_start < Self::SIZE || self.attribute_size < Attribute::SIZE {
            return Err(Error::InvalidAttributeLayout {
                start: self.attribute_start,
                size: self.attribute_size,
            });
        }

        reader.skip_bytes(u64::from(self.attribute_start - Self::SIZE))?;
        let padding = u64::from(self.attribute_size - Attribute::SIZE);
        let mut attributes = Vec::with_capacity(usize::from(self.attribute_count));
        for _ in 0..self.attribute_count {
            attributes.push(Attribute::read(reader)?);
            if padding > 0 {
                reader.skip_bytes(padding)?;
            }
        }
        Ok(attributes)
    }
}

/// End element extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EndElementExt {
    pub namespace: StringRef,
    pub name: StringRef,
}

impl EndElementExt {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let raw: RawRefPair = reader.read_struct()?;
        Ok(Self {
            namespace: StringRef::from_raw(raw.first.get()),
            name: StringRef::from_raw(raw.second.get()),
        })
    }
}

/// Character data extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CDataExt {
    pub data: StringRef,
    pub typed_data: ResValue,
}

impl CDataExt {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let data = StringRef::from_raw(reader.read_struct::<LeU32>()?.get());
        let typed_data = ResValue::read(reader)?;
        Ok(Self { data, typed_data })
    }
}

/// An attribute record of a start element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub namespace: StringRef,
    pub name: StringRef,
    /// Original string value, if the compiler kept it.
    pub raw_value: StringRef,
    pub typed_value: ResValue,
}

impl Attribute {
    /// Size of the record on the wire.
    pub const SIZE: u16 = 20;

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let refs: RawRefPair = reader.read_struct()?;
        let raw_value = StringRef::from_raw(reader.read_struct::<LeU32>()?.get());
        let typed_value = ResValue::read(reader)?;
        Ok(Self {
            namespace: StringRef::from_raw(refs.first.get()),
            name: StringRef::from_raw(refs.second.get()),
            raw_value,
            typed_value,
        })
    }
}

/// A decoded node chunk.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum XmlNode {
    StartNamespace {
        header: NodeHeader,
        namespace: NamespaceExt,
    },
    EndNamespace {
        header: NodeHeader,
        namespace: NamespaceExt,
    },
    StartElement {
        header: NodeHeader,
        element: AttrExt,
        attributes: Vec<Attribute>,
    },
    EndElement {
        header: NodeHeader,
        element: EndElementExt,
    },
    Text {
        header: NodeHeader,
        text: CDataExt,
    },
}

impl XmlNode {
    pub fn header(&self) -> &NodeHeader {
        match self {
            Self::StartNamespace { header, .. }
            | Self::EndNamespace { header, .. }
            | Self::StartElement { header, .. }
            | Self::EndElement { header, .. }
            | Self::Text { header, .. } => header,
        }
    }

    /// The parser event this node produces.
    pub fn event(&self) -> XmlEvent {
        match self {
            Self::StartNamespace { .. } => XmlEvent::StartNamespace,
            Self::EndNamespace { .. } => XmlEvent::EndNamespace,
            Self::StartElement { .. } => XmlEvent::StartTag,
            Self::EndElement { .. } => XmlEvent::EndTag,
            Self::Text { .. } => XmlEvent::Text,
        }
    }

    pub fn namespace(&self) -> Option<&NamespaceExt> {
        match self {
            Self::StartNamespace { namespace, .. } | Self::EndNamespace { namespace, .. } => {
                Some(namespace)
            }
            _ => None,
        }
    }

    /// Namespace and name of a start or end element.
    pub fn element_name(&self) -> Option<(StringRef, StringRef)> {
        match self {
            Self::StartElement { element, .. } => Some((element.namespace, element.name)),
            Self::EndElement { element, .. } => Some((element.namespace, element.name)),
            _ => None,
        }
    }

    pub fn attr_ext(&self) -> Option<&AttrExt> {
        match self {
            Self::StartElement { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::StartElement { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&CDataExt> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_node_header_skips_extra_bytes() {
        let chunk = ChunkHeader::new(0x0102, 20, 40).unwrap();
        let mut data = words(&[42, 0xFFFF_FFFF, 0xDEAD_BEEF]);
        data.push(7);
        let mut stream = &data[..];

        let header = NodeHeader::read(&chunk, &mut stream).unwrap();
        assert_eq!(header.line_number, 42);
        assert!(header.comment.is_null());
        assert_eq!(stream, &[7]);
    }

    #[test]
    fn test_attr_ext_with_padding() {
        let mut data = words(&[0xFFFF_FFFF, 3]);
        for v in [24u16, 24, 2, 1, 0, 0] {
            data.extend(v.to_le_bytes());
        }
        data.extend([0u8; 4]);
        for (name, value) in [(4u32, -1i32), (5, 16)] {
            data.extend(words(&[0xFFFF_FFFF, name, 0xFFFF_FFFF]));
            data.extend(ResValue::int_dec(value).to_bytes());
            data.extend([0xEEu8; 4]);
        }

        let mut stream = &data[..];
        let ext = AttrExt::read(&mut stream).unwrap();
        assert_eq!(ext.name.index(), Some(3));
        assert_eq!(ext.id_index, 1);

        let attributes = ext.read_attributes(&mut stream).unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[1].name.index(), Some(5));
        assert_eq!(attributes[1].typed_value.as_int().unwrap(), 16);
        assert!(attributes[0].raw_value.is_null());
        assert!(stream.is_empty());
    }

    #[test]
    fn test_attr_ext_rejects_short_records() {
        let ext = AttrExt {
            namespace: StringRef::null(),
            name: StringRef::new(0),
            attribute_start: 20,
            attribute_size: 12,
            attribute_count: 1,
            id_index: 0,
            class_index: 0,
            style_index: 0,
        };
        let data = [0u8; 32];
        assert!(matches!(
            ext.read_attributes(&mut &data[..]),
            Err(Error::InvalidAttributeLayout { size: 12, .. })
        ));
    }

    #[test]
    fn test_cdata_ext() {
        let mut data = words(&[9]);
        data.extend(ResValue::string(StringRef::new(9)).to_bytes());
        let ext = CDataExt::read(&mut &data[..]).unwrap();
        assert_eq!(ext.data.index(), Some(9));
        assert_eq!(ext.typed_data.as_string_ref().unwrap().index(), Some(9));
    }
}
