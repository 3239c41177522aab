//! Little-endian field readers.
//!
//! [`BinaryReader`] is a cursor over a byte slice used by decoders that need
//! random access inside a chunk body (the string pool). [`ReadExt`] extends any
//! [`Read`] with fixed-layout record reads for the streaming decoders, and keeps
//! a clean end-of-stream distinguishable from a truncated record.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader that provides bounds-checked reading from a byte slice.
///
/// # Example
///
/// ```
/// use resbin_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32().unwrap(), 0x08070605);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    ///
    /// Seeking exactly to the end is allowed; anything past it is an error.
    #[inline]
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: position,
                size: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read `count` little-endian UTF-16 code units.
    pub fn read_u16_units(&mut self, count: usize) -> Result<Vec<u16>> {
        let byte_len = count.checked_mul(2).ok_or(Error::UnexpectedEof {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        let bytes = self.read_bytes(byte_len)?;
        let mut units = vec![0u16; count];
        LittleEndian::read_u16_into(bytes, &mut units);
        Ok(units)
    }
}

/// Extension trait for reading little-endian records from streams.
///
/// Fixed-layout records are described with zerocopy structs built from
/// little-endian wire integers, so decoding is independent of host byte order.
pub trait ReadExt: Read {
    /// Read a fixed-layout record from the stream.
    fn read_struct<T: FromBytes>(&mut self) -> io::Result<T> {
        let size = std::mem::size_of::<T>();
        let mut bytes = vec![0u8; size];
        self.read_exact(&mut bytes)?;
        T::read_from_bytes(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))
    }

    /// Read a fixed-layout record, returning `None` on a clean end of stream.
    ///
    /// A stream that ends after some but not all bytes of the record is a
    /// truncation and reported as [`Error::UnexpectedEof`].
    fn try_read_struct<T: FromBytes>(&mut self) -> Result<Option<T>> {
        let size = std::mem::size_of::<T>();
        let mut bytes = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            match self.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < size {
            return Err(Error::UnexpectedEof {
                needed: size,
                available: filled,
            });
        }

        T::read_from_bytes(&bytes).map(Some).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: filled,
        })
    }

    /// Skip exactly `count` bytes.
    fn skip_bytes(&mut self, count: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut *self).take(count), &mut io::sink())?;
        if skipped < count {
            return Err(Error::UnexpectedEof {
                needed: count as usize,
                available: skipped as usize,
            });
        }
        Ok(())
    }

    /// Consume and discard everything left in the stream, returning the byte count.
    fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
