//! String pool chunk decoding.
//!
//! A string pool holds every string of a document or table, addressed by
//! index, plus optional style spans (ranges of a string carrying markup such
//! as `<b>`). Strings are length-prefixed, either in UTF-8 or UTF-16.

use std::io::Read;

use bitflags::bitflags;
use resbin_common::BinaryReader;

use crate::reference::NO_ENTRY;
use crate::{ChunkHeader, Error, Result, StringRef};

bitflags! {
    /// Flags stored in the string pool header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct StringPoolFlags: u32 {
        /// Strings are sorted by their UTF-16 value.
        const SORTED = 1 << 0;
        /// Strings are encoded as UTF-8 rather than UTF-16.
        const UTF8 = 1 << 8;
    }
}

/// Type-specific header of a string pool chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: StringPoolFlags,
    /// Offset from the chunk start to the string data.
    pub strings_start: u32,
    /// Offset from the chunk start to the style data.
    pub styles_start: u32,
}

impl StringPoolHeader {
    /// Minimum header size of a string pool chunk, chunk header included.
    pub const SIZE: u16 = 28;
}

/// A styled range of a string.
///
/// Spans of all strings are stored one after another; a span whose name is
/// null terminates the spans of one string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleSpan {
    /// Name of the markup tag, e.g. `b`.
    pub name: StringRef,
    /// First character of the range, in UTF-16 units.
    pub first_char: u32,
    /// Last character of the range (inclusive), in UTF-16 units.
    pub last_char: u32,
}

impl StyleSpan {
    /// The terminator record.
    pub const END: Self = Self {
        name: StringRef::null(),
        first_char: 0,
        last_char: 0,
    };

    /// Check if this record terminates a span run.
    pub const fn is_end(&self) -> bool {
        self.name.is_null()
    }
}

/// Decoded string pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringPool {
    header: Option<StringPoolHeader>,
    strings: Vec<String>,
    styles: Vec<StyleSpan>,
}

impl StringPool {
    /// Decode a string pool chunk by reading its whole body from `body`.
    ///
    /// `body` must be positioned right after the 8-byte chunk header.
    pub fn read<R: Read + ?Sized>(chunk: &ChunkHeader, body: &mut R) -> Result<Self> {
        let mut data = Vec::with_capacity(chunk.body_size().min(1 << 20) as usize);
        body.read_to_end(&mut data)?;
        Self::parse(chunk, &data)
    }

    /// Decode a string pool from the chunk body (everything after the 8-byte header).
    pub fn parse(chunk: &ChunkHeader, body: &[u8]) -> Result<Self> {
        if chunk.header_size < StringPoolHeader::SIZE {
            return Err(Error::InvalidChunkHeader {
                chunk_type: chunk.type_id,
                header_size: chunk.header_size,
                total_size: chunk.total_size,
            });
        }
        let mut reader = BinaryReader::new(body);
        let header = StringPoolHeader {
            string_count: reader.read_u32()?,
            style_count: reader.read_u32()?,
            flags: StringPoolFlags::from_bits_retain(reader.read_u32()?),
            strings_start: reader.read_u32()?,
            styles_start: reader.read_u32()?,
        };
        reader.seek(chunk.extended_header_size() as usize)?;

        let string_offsets = read_offsets(&mut reader, header.string_count)?;
        let style_offsets = read_offsets(&mut reader, header.style_count)?;

        let utf8 = header.flags.contains(StringPoolFlags::UTF8);
        let mut strings = Vec::with_capacity(string_offsets.len());
        for offset in string_offsets {
            let position = body_position(header.strings_start, offset, body.len())?;
            reader.seek(position)?;
            let string = if utf8 {
                read_utf8_string(&mut reader)?
            } else {
                read_utf16_string(&mut reader)?
            };
            strings.push(string);
        }

        let mut styles = Vec::new();
        for offset in style_offsets {
            let position = body_position(header.styles_start, offset, body.len())?;
            reader.seek(position)?;
            loop {
                let name = reader.read_u32()?;
                if name == NO_ENTRY {
                    styles.push(StyleSpan::END);
                    break;
                }
                styles.push(StyleSpan {
                    name: StringRef::new(name),
                    first_char: reader.read_u32()?,
                    last_char: reader.read_u32()?,
                });
            }
        }

        tracing::trace!(
            strings = strings.len(),
            spans = styles.len(),
            utf8,
            "decoded string pool"
        );

        Ok(Self {
            header: Some(header),
            strings,
            styles,
        })
    }

    /// Build a pool directly from strings, without style data.
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: None,
            strings: strings.into_iter().map(Into::into).collect(),
            styles: Vec::new(),
        }
    }

    /// The header as decoded, if this pool was read from a chunk.
    pub fn header(&self) -> Option<&StringPoolHeader> {
        self.header.as_ref()
    }

    /// Flags from the header.
    pub fn flags(&self) -> StringPoolFlags {
        self.header.map(|h| h.flags).unwrap_or_default()
    }

    /// Check if the strings were stored as UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.flags().contains(StringPoolFlags::UTF8)
    }

    /// Check if the pool is flagged as sorted.
    pub fn is_sorted(&self) -> bool {
        self.flags().contains(StringPoolFlags::SORTED)
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the pool holds no strings.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Get a string by index.
    ///
    /// A `None` index yields the empty string; an index past the end is an error.
    pub fn get(&self, index: Option<u32>) -> Result<&str> {
        let Some(index) = index else {
            return Ok("");
        };
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(Error::StringIndexOutOfBounds {
                index,
                count: self.strings.len(),
            })
    }

    /// Resolve a string reference.
    pub fn resolve(&self, reference: StringRef) -> Result<&str> {
        self.get(reference.index())
    }

    /// Find the index of the first string equal to `target`.
    ///
    /// The empty string is never searched for and yields `None`.
    pub fn index_of(&self, target: &str) -> Option<u32> {
        if target.is_empty() {
            return None;
        }
        self.strings
            .iter()
            .position(|s| s == target)
            .map(|i| i as u32)
    }

    /// Iterate over all strings in index order.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// All style records, terminators included, in pool order.
    pub fn style_spans(&self) -> &[StyleSpan] {
        &self.styles
    }

    /// Style spans of the string at `index`.
    ///
    /// The spans are found by counting terminator records from the start of
    /// the style data, so every call yields a fresh iterator.
    pub fn styles(&self, index: u32) -> Result<Styles<'_>> {
        if index as usize >= self.strings.len() {
            return Err(Error::StringIndexOutOfBounds {
                index,
                count: self.strings.len(),
            });
        }
        Ok(Styles {
            spans: self.styles.iter(),
            target: index,
            current: 0,
        })
    }
}

/// Iterator over the style spans of one string, see [`StringPool::styles`].
#[derive(Debug, Clone)]
pub struct Styles<'a> {
    spans: std::slice::Iter<'a, StyleSpan>,
    target: u32,
    current: u32,
}

impl<'a> Iterator for Styles<'a> {
    type Item = &'a StyleSpan;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current <= self.target {
            let span = self.spans.next()?;
            if span.is_end() {
                self.current += 1;
            } else if self.current == self.target {
                return Some(span);
            }
        }
        None
    }
}

fn read_offsets(reader: &mut BinaryReader<'_>, count: u32) -> Result<Vec<u32>> {
    let needed = count as usize * 4;
    if needed > reader.remaining() {
        return Err(resbin_common::Error::UnexpectedEof {
            needed,
            available: reader.remaining(),
        }
        .into());
    }
    (0..count)
        .map(|_| reader.read_u32().map_err(Error::from))
        .collect()
}

/// Translate a chunk-relative region start plus an offset into a body position.
fn body_position(region_start: u32, offset: u32, body_len: usize) -> Result<usize> {
    let absolute = u64::from(region_start) + u64::from(offset);
    let header = u64::from(ChunkHeader::SIZE);
    if absolute < header || absolute - header > body_len as u64 {
        return Err(Error::StringOffsetOutOfBounds {
            offset,
            size: body_len + ChunkHeader::SIZE as usize,
        });
    }
    Ok((absolute - header) as usize)
}

fn read_utf8_length(reader: &mut BinaryReader<'_>) -> Result<usize> {
    let first = reader.read_u8()?;
    if first & 0x80 != 0 {
        let second = reader.read_u8()?;
        Ok((usize::from(first & 0x7F) << 8) | usize::from(second))
    } else {
        Ok(usize::from(first))
    }
}

fn read_utf8_string(reader: &mut BinaryReader<'_>) -> Result<String> {
    let _utf16_length = read_utf8_length(reader)?;
    let byte_length = read_utf8_length(reader)?;
    let bytes = reader.read_bytes(byte_length)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn read_utf16_string(reader: &mut BinaryReader<'_>) -> Result<String> {
    let first = reader.read_u16()?;
    let length = if first & 0x8000 != 0 {
        let second = reader.read_u16()?;
        (usize::from(first & 0x7FFF) << 16) | usize::from(second)
    } else {
        usize::from(first)
    };
    let units = reader.read_u16_units(length)?;
    Ok(String::from_utf16_lossy(&units))
}
