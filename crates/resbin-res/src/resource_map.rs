//! XML resource map chunk.
//!
//! Maps the first N strings of a document's string pool (the attribute names)
//! to the resource identifiers of the corresponding attributes.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use resbin_common::ReadExt;

use crate::{ChunkHeader, Result, StringPool};

/// Ordered resource identifiers; position `i` belongs to string `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResourceMap {
    ids: Vec<u32>,
}

impl ResourceMap {
    /// Create a map from identifiers in string order.
    pub fn new(ids: Vec<u32>) -> Self {
        Self { ids }
    }

    /// Decode the chunk body following the 8-byte header.
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        body.skip_bytes(chunk.extended_header_size())?;
        let count = (chunk.total_size - u32::from(chunk.header_size)) / 4;
        let mut ids = Vec::with_capacity(count.min(1 << 16) as usize);
        for _ in 0..count {
            ids.push(body.read_u32::<LittleEndian>()?);
        }
        Ok(Self { ids })
    }

    /// Resource identifiers in string order.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resource identifier of the string at `index`, if mapped.
    pub fn resource_id(&self, index: u32) -> Option<u32> {
        self.ids.get(index as usize).copied()
    }

    /// Name of the attribute with resource identifier `id`.
    ///
    /// The first position holding `id` is resolved as a string pool index.
    pub fn resource_name<'p>(&self, id: Option<u32>, pool: &'p StringPool) -> Result<Option<&'p str>> {
        let Some(id) = id else {
            return Ok(None);
        };
        match self.ids.iter().position(|&candidate| candidate == id) {
            Some(index) => pool.get(Some(index as u32)).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(ids: &[u32]) -> (ChunkHeader, Vec<u8>) {
        let header = ChunkHeader::new(0x0180, 8, 8 + 4 * ids.len() as u32).unwrap();
        let body = ids.iter().flat_map(|id| id.to_le_bytes()).collect();
        (header, body)
    }

    #[test]
    fn test_read_and_lookup() {
        let (header, body) = chunk(&[0x0101_0000, 0x0101_00F2]);
        let map = ResourceMap::read(&header, &mut &body[..]).unwrap();
        let pool = StringPool::from_strings(["theme", "layout_width", "extra"]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.resource_id(1), Some(0x0101_00F2));
        assert_eq!(map.resource_name(Some(0x0101_00F2), &pool).unwrap(), Some("layout_width"));
        assert_eq!(map.resource_name(Some(0xDEAD_BEEF), &pool).unwrap(), None);
        assert_eq!(map.resource_name(None, &pool).unwrap(), None);
    }

    #[test]
    fn test_truncated_body() {
        let (header, body) = chunk(&[1, 2, 3]);
        assert!(ResourceMap::read(&header, &mut &body[..6]).is_err());
    }
}
