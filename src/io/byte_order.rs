//! Byte order handling for TIFF files
//!
//! TIFF files declare their byte order in the header. Reading is done
//! through a [`ByteOrderHandler`] chosen once per file, both for header and
//! directory fields read from a stream and for sample values decoded from
//! decompressed block buffers.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt};
use std::io::Result;

use super::seekable::SeekableReader;

use crate::errors::{SlicerError, SlicerResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the two marker bytes of a TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> SlicerResult<Self> {
        let marker = reader.read_u16::<LittleEndian>()?;
        match marker {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(SlicerError::FormatError(format!("Invalid byte order marker: {:#06x}", marker))),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
pub trait ByteOrderHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Decode a u16 from the first two bytes of `buf`
    fn u16_at(&self, buf: &[u8]) -> u16;
    /// Decode a u32 from the first four bytes of `buf`
    fn u32_at(&self, buf: &[u8]) -> u32;
    /// Decode a u64 from the first eight bytes of `buf`
    fn u64_at(&self, buf: &[u8]) -> u64;

    /// Encode a u16 into the first two bytes of `buf`
    fn put_u16(&self, buf: &mut [u8], value: u16);
    /// Encode a u32 into the first four bytes of `buf`
    fn put_u32(&self, buf: &mut [u8], value: u32);
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<LittleEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<LittleEndian>()
    }

    fn u16_at(&self, buf: &[u8]) -> u16 {
        LittleEndian::read_u16(buf)
    }

    fn u32_at(&self, buf: &[u8]) -> u32 {
        LittleEndian::read_u32(buf)
    }

    fn u64_at(&self, buf: &[u8]) -> u64 {
        LittleEndian::read_u64(buf)
    }

    fn put_u16(&self, buf: &mut [u8], value: u16) {
        LittleEndian::write_u16(buf, value)
    }

    fn put_u32(&self, buf: &mut [u8], value: u32) {
        LittleEndian::write_u32(buf, value)
    }
}

/// Big-endian byte order handler
pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<BigEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<BigEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<BigEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<BigEndian>()
    }

    fn u16_at(&self, buf: &[u8]) -> u16 {
        BigEndian::read_u16(buf)
    }

    fn u32_at(&self, buf: &[u8]) -> u32 {
        BigEndian::read_u32(buf)
    }

    fn u64_at(&self, buf: &[u8]) -> u64 {
        BigEndian::read_u64(buf)
    }

    fn put_u16(&self, buf: &mut [u8], value: u16) {
        BigEndian::write_u16(buf, value)
    }

    fn put_u32(&self, buf: &mut [u8], value: u32) {
        BigEndian::write_u32(buf, value)
    }
}
