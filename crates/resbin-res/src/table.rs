//! Resource table header records.
//!
//! These decode the fixed headers of the table chunk family. Walking packages,
//! types and entries is left to callers; each `read` consumes exactly the
//! chunk's extended header from a stream positioned after the 8-byte chunk
//! header.

use std::io::Read;

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use resbin_common::bits::{get_bits, set_bits};
use resbin_common::ReadExt;

use crate::{ChunkHeader, Error, ResRef, ResValue, ResourceConfig, Result, StringRef};

/// Skip whatever is left of an extended header after `consumed` bytes.
fn skip_header_rest<R: Read + ?Sized>(chunk: &ChunkHeader, consumed: u64, body: &mut R) -> Result<()> {
    let extended = chunk.extended_header_size();
    if consumed > extended {
        return Err(Error::InvalidChunkHeader {
            chunk_type: chunk.type_id,
            header_size: chunk.header_size,
            total_size: chunk.total_size,
        });
    }
    body.skip_bytes(extended - consumed)?;
    Ok(())
}

/// Header of a `RES_TABLE_TYPE` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableHeader {
    pub package_count: u32,
}

impl TableHeader {
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let package_count = body.read_u32::<LittleEndian>()?;
        skip_header_rest(chunk, 4, body)?;
        Ok(Self { package_count })
    }
}

/// Number of UTF-16 code units reserved for a package name.
pub const PACKAGE_NAME_UNITS: usize = 128;

/// Header of a `RES_TABLE_PACKAGE_TYPE` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageHeader {
    /// Package id, e.g. `0x7f` for applications.
    pub id: u32,
    /// Package name, cut at the first NUL.
    pub name: String,
    /// Offset of the type string pool from the chunk start.
    pub type_strings: u32,
    pub last_public_type: u32,
    /// Offset of the key string pool from the chunk start.
    pub key_strings: u32,
    pub last_public_key: u32,
}

impl PackageHeader {
    const FIXED_SIZE: u64 = 4 + 2 * PACKAGE_NAME_UNITS as u64 + 16;

    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let id = body.read_u32::<LittleEndian>()?;
        let mut units = [0u16; PACKAGE_NAME_UNITS];
        body.read_u16_into::<LittleEndian>(&mut units)?;
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        let name = String::from_utf16_lossy(&units[..end]);

        let type_strings = body.read_u32::<LittleEndian>()?;
        let last_public_type = body.read_u32::<LittleEndian>()?;
        let key_strings = body.read_u32::<LittleEndian>()?;
        let last_public_key = body.read_u32::<LittleEndian>()?;
        skip_header_rest(chunk, Self::FIXED_SIZE, body)?;

        Ok(Self {
            id,
            name,
            type_strings,
            last_public_type,
            key_strings,
            last_public_key,
        })
    }
}

/// Packed `id`/`res0`/`res1` word shared by type and type-spec headers.
///
/// On the wire `id` is the first byte, so it occupies the low bits of the
/// little-endian word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeId {
    raw: u32,
}

impl TypeId {
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// 1-based type identifier.
    pub const fn id(&self) -> u8 {
        get_bits(self.raw, 0xFF, 0) as u8
    }

    pub const fn res0(&self) -> u8 {
        get_bits(self.raw, 0xFF, 8) as u8
    }

    pub const fn res1(&self) -> u16 {
        get_bits(self.raw, 0xFFFF, 16) as u16
    }

    pub const fn with_id(self, id: u8) -> Self {
        Self::from_raw(set_bits(self.raw, id as u32, 0xFF, 0))
    }

    pub const fn with_res0(self, res0: u8) -> Self {
        Self::from_raw(set_bits(self.raw, res0 as u32, 0xFF, 8))
    }

    pub const fn with_res1(self, res1: u16) -> Self {
        Self::from_raw(set_bits(self.raw, res1 as u32, 0xFFFF, 16))
    }
}

/// Header of a `RES_TABLE_TYPE_SPEC_TYPE` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeSpecHeader {
    pub type_id: TypeId,
    /// Number of `u32` configuration-change flags following the header.
    pub entry_count: u32,
}

impl TypeSpecHeader {
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let type_id = TypeId::from_raw(body.read_u32::<LittleEndian>()?);
        let entry_count = body.read_u32::<LittleEndian>()?;
        skip_header_rest(chunk, 8, body)?;
        Ok(Self { type_id, entry_count })
    }
}

/// Header of a `RES_TABLE_TYPE_TYPE` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeHeader {
    pub type_id: TypeId,
    pub entry_count: u32,
    /// Offset of the entry data from the chunk start.
    pub entries_start: u32,
    pub config: ResourceConfig,
}

impl TypeHeader {
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let type_id = TypeId::from_raw(body.read_u32::<LittleEndian>()?);
        let entry_count = body.read_u32::<LittleEndian>()?;
        let entries_start = body.read_u32::<LittleEndian>()?;

        let mut counted = CountingReader::new(&mut *body);
        let config = ResourceConfig::read(&mut counted)?;
        let consumed = 12 + counted.count;
        skip_header_rest(chunk, consumed, body)?;

        Ok(Self {
            type_id,
            entry_count,
            entries_start,
            config,
        })
    }
}

/// Tracks how many bytes a nested decoder consumed.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

bitflags! {
    /// Flags of a table entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct EntryFlags: u16 {
        /// The entry is a map (bag) rather than a single value.
        const COMPLEX = 0x0001;
        /// The entry was declared public.
        const PUBLIC = 0x0002;
    }
}

/// A table entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableEntry {
    pub size: u16,
    pub flags: EntryFlags,
    /// Key name in the package key string pool.
    pub key: StringRef,
}

impl TableEntry {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u16::<LittleEndian>()?;
        let flags = EntryFlags::from_bits_retain(reader.read_u16::<LittleEndian>()?);
        let key = StringRef::from_raw(reader.read_u32::<LittleEndian>()?);
        Ok(Self { size, flags, key })
    }

    pub fn is_complex(&self) -> bool {
        self.flags.contains(EntryFlags::COMPLEX)
    }
}

/// Header of a complex (map) entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableMapEntry {
    pub entry: TableEntry,
    /// Parent style, or null.
    pub parent: ResRef,
    /// Number of [`TableMap`] records that follow.
    pub count: u32,
}

impl TableMapEntry {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let entry = TableEntry::read(reader)?;
        let parent = ResRef::from_raw(reader.read_u32::<LittleEndian>()?);
        let count = reader.read_u32::<LittleEndian>()?;
        Ok(Self { entry, parent, count })
    }
}

/// Special attribute names used by attribute definition maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum MapMetaAttribute {
    Type = 0x0100_0000,
    Min = 0x0100_0001,
    Max = 0x0100_0002,
    L10n = 0x0100_0003,
    Other = 0x0100_0004,
    Zero = 0x0100_0005,
    One = 0x0100_0006,
    Two = 0x0100_0007,
    Few = 0x0100_0008,
    Many = 0x0100_0009,
}

impl MapMetaAttribute {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x0100_0000 => Some(Self::Type),
            0x0100_0001 => Some(Self::Min),
            0x0100_0002 => Some(Self::Max),
            0x0100_0003 => Some(Self::L10n),
            0x0100_0004 => Some(Self::Other),
            0x0100_0005 => Some(Self::Zero),
            0x0100_0006 => Some(Self::One),
            0x0100_0007 => Some(Self::Two),
            0x0100_0008 => Some(Self::Few),
            0x0100_0009 => Some(Self::Many),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "ATTR_TYPE",
            Self::Min => "ATTR_MIN",
            Self::Max => "ATTR_MAX",
            Self::L10n => "ATTR_L10N",
            Self::Other => "ATTR_OTHER",
            Self::Zero => "ATTR_ZERO",
            Self::One => "ATTR_ONE",
            Self::Two => "ATTR_TWO",
            Self::Few => "ATTR_FEW",
            Self::Many => "ATTR_MANY",
        }
    }
}

bitflags! {
    /// Value types an attribute accepts (`ATTR_TYPE` data).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct MapAllowedTypes: u32 {
        const REFERENCE = 1 << 0;
        const STRING = 1 << 1;
        const INTEGER = 1 << 2;
        const BOOLEAN = 1 << 3;
        const COLOR = 1 << 4;
        const FLOAT = 1 << 5;
        const DIMENSION = 1 << 6;
        const FRACTION = 1 << 7;
        const ANY = 0x0000_FFFF;
        const ENUM = 1 << 16;
        const FLAGS = 1 << 17;
    }
}

/// Localization requirement (`ATTR_L10N` data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum MapL10n {
    NotRequired = 0,
    Suggested = 1,
}

impl MapL10n {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::NotRequired),
            1 => Some(Self::Suggested),
            _ => None,
        }
    }
}

/// One name/value record of a map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableMap {
    pub name: ResRef,
    pub value: ResValue,
}

impl TableMap {
    pub fn new(name: ResRef, value: ResValue) -> Self {
        Self { name, value }
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let name = ResRef::from_raw(reader.read_u32::<LittleEndian>()?);
        let value = ResValue::read(reader)?;
        Ok(Self { name, value })
    }

    /// The meta attribute named by this record, if any.
    pub fn meta_name(&self) -> Option<MapMetaAttribute> {
        self.name.ident().and_then(MapMetaAttribute::from_u32)
    }

    /// Rename the record to a meta attribute.
    ///
    /// Clearing only resets the name when it currently holds a meta attribute.
    pub fn set_meta_name(&mut self, meta: Option<MapMetaAttribute>) {
        match meta {
            Some(meta) => self.name = ResRef::new(meta as u32),
            None if self.meta_name().is_some() => self.name = ResRef::new(0),
            None => {}
        }
    }

    /// Allowed value types, present only on `ATTR_TYPE` records.
    pub fn allowed_types(&self) -> Option<MapAllowedTypes> {
        (self.meta_name() == Some(MapMetaAttribute::Type))
            .then(|| MapAllowedTypes::from_bits_retain(self.value.data()))
    }

    pub fn set_allowed_types(&mut self, types: MapAllowedTypes) -> Result<()> {
        if self.meta_name() != Some(MapMetaAttribute::Type) {
            return Err(Error::InvalidOperation(
                "allowed types can only be set when the meta name is ATTR_TYPE",
            ));
        }
        self.value = ResValue::from_parts(self.value.data_type_raw(), types.bits());
        Ok(())
    }

    /// Localization requirement, present only on `ATTR_L10N` records.
    pub fn l10n(&self) -> Option<MapL10n> {
        if self.meta_name() != Some(MapMetaAttribute::L10n) {
            return None;
        }
        MapL10n::from_u32(self.value.data())
    }

    pub fn set_l10n(&mut self, l10n: MapL10n) -> Result<()> {
        if self.meta_name() != Some(MapMetaAttribute::L10n) {
            return Err(Error::InvalidOperation(
                "localization can only be set when the meta name is ATTR_L10N",
            ));
        }
        self.value = ResValue::from_parts(self.value.data_type_raw(), l10n as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueType;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_table_header_skips_extra_header() {
        let chunk = ChunkHeader::new(0x0002, 16, 16).unwrap();
        let mut data = words(&[3, 0xAAAA_AAAA]);
        data.push(0x42);
        let mut stream = &data[..];

        let header = TableHeader::read(&chunk, &mut stream).unwrap();
        assert_eq!(header.package_count, 3);
        assert_eq!(stream, &[0x42]);
    }

    #[test]
    fn test_package_header() {
        let chunk = ChunkHeader::new(0x0200, 288, 288).unwrap();
        let mut data = 0x7Fu32.to_le_bytes().to_vec();
        let mut name = [0u16; PACKAGE_NAME_UNITS];
        for (slot, unit) in name.iter_mut().zip("com.example".encode_utf16()) {
            *slot = unit;
        }
        data.extend(name.iter().flat_map(|u| u.to_le_bytes()));
        data.extend(words(&[284, 2, 400, 7, 0]));

        let mut stream = &data[..];
        let header = PackageHeader::read(&chunk, &mut stream).unwrap();
        assert_eq!(header.id, 0x7F);
        assert_eq!(header.name, "com.example");
        assert_eq!(header.type_strings, 284);
        assert_eq!(header.last_public_key, 7);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_type_id_views() {
        let type_id = TypeId::from_raw(u32::from_le_bytes([0x04, 0x00, 0x00, 0x00]));
        assert_eq!(type_id.id(), 4);
        assert_eq!(type_id.res0(), 0);

        let updated = type_id.with_res0(0xAB).with_res1(0x1234);
        assert_eq!(updated.id(), 4);
        assert_eq!(updated.res0(), 0xAB);
        assert_eq!(updated.res1(), 0x1234);
        assert_eq!(updated.with_id(9).res1(), 0x1234);
    }

    #[test]
    fn test_type_header_with_config() {
        let mut config = ResourceConfig::new();
        config.set_language("de").unwrap();
        config.set_density(crate::config::density::HIGH);

        let header_size = 8 + 12 + ResourceConfig::SIZE as u16;
        let chunk = ChunkHeader::new(0x0201, header_size, u32::from(header_size) + 4).unwrap();
        let mut data = words(&[0x02, 5, u32::from(header_size) + 20]);
        data.extend(config.to_bytes());
        data.extend(words(&[0xFFFF_FFFF]));

        let mut stream = &data[..];
        let header = TypeHeader::read(&chunk, &mut stream).unwrap();
        assert_eq!(header.type_id.id(), 2);
        assert_eq!(header.entry_count, 5);
        assert_eq!(header.config.language(), "de");
        assert_eq!(header.config.density(), 240);
        assert_eq!(stream.len(), 4);
    }

    #[test]
    fn test_type_spec_header() {
        let chunk = ChunkHeader::new(0x0202, 16, 24).unwrap();
        let data = words(&[0x01, 2, 0, 0]);
        let header = TypeSpecHeader::read(&chunk, &mut &data[..]).unwrap();
        assert_eq!(header.type_id.id(), 1);
        assert_eq!(header.entry_count, 2);
    }

    #[test]
    fn test_header_larger_than_declared() {
        let chunk = ChunkHeader::new(0x0202, 12, 24).unwrap();
        let data = words(&[0x01, 2, 0, 0]);
        assert!(matches!(
            TypeSpecHeader::read(&chunk, &mut &data[..]),
            Err(Error::InvalidChunkHeader { .. })
        ));
    }

    #[test]
    fn test_map_entry() {
        let mut data = Vec::new();
        data.extend(16u16.to_le_bytes());
        data.extend((EntryFlags::COMPLEX | EntryFlags::PUBLIC).bits().to_le_bytes());
        data.extend(words(&[3, 0x7F03_0001, 2]));

        let entry = TableMapEntry::read(&mut &data[..]).unwrap();
        assert!(entry.entry.is_complex());
        assert!(entry.entry.flags.contains(EntryFlags::PUBLIC));
        assert_eq!(entry.entry.key.index(), Some(3));
        assert_eq!(entry.parent.ident(), Some(0x7F03_0001));
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn test_map_meta_accessors() {
        let mut map = TableMap::new(
            ResRef::new(MapMetaAttribute::Type as u32),
            ResValue::new(ValueType::IntDec, 0x0004),
        );
        assert_eq!(map.meta_name(), Some(MapMetaAttribute::Type));
        assert_eq!(map.allowed_types(), Some(MapAllowedTypes::INTEGER));
        assert_eq!(map.l10n(), None);
        assert!(matches!(map.set_l10n(MapL10n::Suggested), Err(Error::InvalidOperation(_))));

        map.set_allowed_types(MapAllowedTypes::ENUM | MapAllowedTypes::INTEGER)
            .unwrap();
        assert_eq!(map.value.data(), (1 << 16) | (1 << 2));
        assert_eq!(map.value.data_type(), Some(ValueType::IntDec));

        map.set_meta_name(Some(MapMetaAttribute::L10n));
        map.set_l10n(MapL10n::Suggested).unwrap();
        assert_eq!(map.l10n(), Some(MapL10n::Suggested));
        assert!(map.set_allowed_types(MapAllowedTypes::ANY).is_err());

        map.set_meta_name(None);
        assert_eq!(map.name.ident(), Some(0));
        assert_eq!(map.meta_name(), None);
    }

    #[test]
    fn test_clearing_meta_name_keeps_regular_names() {
        let mut map = TableMap::new(ResRef::new(0x7F01_0002), ResValue::null());
        map.set_meta_name(None);
        assert_eq!(map.name.ident(), Some(0x7F01_0002));
    }

    #[test]
    fn test_map_read() {
        let mut data = words(&[MapMetaAttribute::Min as u32]);
        data.extend(ResValue::int_dec(-3).to_bytes());
        let map = TableMap::read(&mut &data[..]).unwrap();
        assert_eq!(map.meta_name(), Some(MapMetaAttribute::Min));
        assert_eq!(map.value.as_int().unwrap(), -3);
    }
}
