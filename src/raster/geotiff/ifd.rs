//! TIFF header and Image File Directory parsing
//!
//! Only the first IFD is read: it describes the full-resolution image.
//! Entry values are kept as the raw bytes of the entry's value field and
//! decoded on demand, so inline values are interpreted with the file's byte
//! order regardless of their field type.

use std::collections::HashMap;
use std::io::SeekFrom;

use log::{debug, trace};

use super::tags::{field_types, format};
use crate::errors::{SlicerError, SlicerResult};
use crate::io::{ByteOrder, ByteOrderHandler, SeekableReader};

/// Parsed TIFF or BigTIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub is_big_tiff: bool,
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Read the header at the start of the file
    pub fn read(reader: &mut dyn SeekableReader) -> SlicerResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let byte_order = ByteOrder::detect(reader)?;
        let handler = byte_order.create_handler();

        let version = handler.read_u16(reader)?;
        let (is_big_tiff, first_ifd_offset) = match version {
            format::TIFF_VERSION => (false, handler.read_u32(reader)? as u64),
            format::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let _reserved = handler.read_u16(reader)?;
                if offset_size != format::BIGTIFF_OFFSET_SIZE {
                    return Err(SlicerError::FormatError(format!(
                        "Invalid BigTIFF offset size {}", offset_size
                    )));
                }
                (true, handler.read_u64(reader)?)
            },
            _ => return Err(SlicerError::FormatError(format!("Unsupported TIFF version {}", version))),
        };

        if first_ifd_offset == 0 {
            return Err(SlicerError::FormatError("File contains no image directory".to_string()));
        }

        debug!("TIFF header: {}, {}, first IFD at {}",
               byte_order.name(), if is_big_tiff { "BigTIFF" } else { "TIFF" }, first_ifd_offset);

        Ok(TiffHeader { byte_order, is_big_tiff, first_ifd_offset })
    }
}

/// One tag entry of an IFD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u64,
    /// Raw value field: 4 bytes in TIFF, 8 in BigTIFF
    value_field: Vec<u8>,
}

impl IfdEntry {
    /// Total size of the entry's values in bytes, `None` for unknown field types
    pub fn byte_len(&self) -> Option<u64> {
        field_types::size(self.field_type).map(|size| size as u64 * self.count)
    }

    /// Whether the values fit inside the value field itself
    pub fn is_inline(&self) -> bool {
        matches!(self.byte_len(), Some(len) if len <= self.value_field.len() as u64)
    }

    /// Value field interpreted as an offset into the file
    fn offset(&self, handler: &dyn ByteOrderHandler) -> u64 {
        if self.value_field.len() == 8 {
            handler.u64_at(&self.value_field)
        } else {
            handler.u32_at(&self.value_field) as u64
        }
    }
}

/// The first Image File Directory of a TIFF file
#[derive(Debug, Clone)]
pub struct Ifd {
    entries: HashMap<u16, IfdEntry>,
}

impl Ifd {
    /// Read the IFD at `offset`
    ///
    /// # Arguments
    /// * `reader` - Seekable reader over the file
    /// * `header` - Parsed header, for entry sizes
    /// * `handler` - Byte order handler of the file
    pub fn read(reader: &mut dyn SeekableReader, header: &TiffHeader,
                handler: &dyn ByteOrderHandler) -> SlicerResult<Self> {
        reader.seek(SeekFrom::Start(header.first_ifd_offset))?;

        let entry_count = if header.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };

        if entry_count == 0 || entry_count > 4096 {
            return Err(SlicerError::FormatError(format!("Implausible IFD entry count {}", entry_count)));
        }

        let value_size = if header.is_big_tiff { 8 } else { 4 };
        let mut entries = HashMap::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let tag = handler.read_u16(reader)?;
            let field_type = handler.read_u16(reader)?;
            let count = if header.is_big_tiff {
                handler.read_u64(reader)?
            } else {
                handler.read_u32(reader)? as u64
            };
            let mut value_field = vec![0u8; value_size];
            reader.read_exact(&mut value_field)?;

            trace!("IFD entry: tag={}, type={}, count={}", tag, field_type, count);
            entries.insert(tag, IfdEntry { tag, field_type, count, value_field });
        }

        debug!("Read IFD with {} entries", entries.len());
        Ok(Ifd { entries })
    }

    pub fn entry(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.get(&tag)
    }

    pub fn has_tag(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Raw value bytes of a tag, read from the value field or the file
    fn value_bytes(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler,
                   entry: &IfdEntry) -> SlicerResult<Vec<u8>> {
        let len = entry.byte_len().ok_or_else(|| SlicerError::FormatError(format!(
            "Tag {} has unknown field type {}", entry.tag, entry.field_type
        )))?;

        if entry.is_inline() {
            return Ok(entry.value_field[..len as usize].to_vec());
        }

        let file_size = reader.seek(SeekFrom::End(0))?;
        let offset = entry.offset(handler);
        if offset.checked_add(len).map_or(true, |end| end > file_size) {
            return Err(SlicerError::FormatError(format!(
                "Values of tag {} ({} bytes at {}) lie past the end of the file", entry.tag, len, offset
            )));
        }

        reader.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len as usize];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read an integer-typed tag as unsigned values
    ///
    /// # Returns
    /// `None` when the tag is absent, or the values widened to `u64`
    pub fn read_unsigned(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler,
                         tag: u16) -> SlicerResult<Option<Vec<u64>>> {
        let entry = match self.entry(tag) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let bytes = self.value_bytes(reader, handler, entry)?;
        let values = match entry.field_type {
            field_types::BYTE | field_types::UNDEFINED => bytes.iter().map(|b| *b as u64).collect(),
            field_types::SHORT => bytes.chunks_exact(2).map(|c| handler.u16_at(c) as u64).collect(),
            field_types::LONG | field_types::IFD => bytes.chunks_exact(4).map(|c| handler.u32_at(c) as u64).collect(),
            field_types::LONG8 | field_types::IFD8 => bytes.chunks_exact(8).map(|c| handler.u64_at(c)).collect(),
            other => return Err(SlicerError::FormatError(format!(
                "Tag {} has non-integer field type {}", tag, other
            ))),
        };

        Ok(Some(values))
    }

    /// Read a single unsigned value, `None` when the tag is absent
    pub fn read_scalar(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler,
                       tag: u16) -> SlicerResult<Option<u64>> {
        Ok(self.read_unsigned(reader, handler, tag)?.and_then(|values| values.first().copied()))
    }

    /// Read a DOUBLE-typed tag, `None` when the tag is absent
    pub fn read_doubles(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler,
                        tag: u16) -> SlicerResult<Option<Vec<f64>>> {
        let entry = match self.entry(tag) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        if entry.field_type != field_types::DOUBLE {
            return Err(SlicerError::FormatError(format!(
                "Tag {} should hold doubles but has field type {}", tag, entry.field_type
            )));
        }

        let bytes = self.value_bytes(reader, handler, entry)?;
        Ok(Some(bytes.chunks_exact(8).map(|c| f64::from_bits(handler.u64_at(c))).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;

    fn big_endian_tiff() -> Cursor<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.write_u16::<BigEndian>(0x4D4D).unwrap();
        buffer.write_u16::<BigEndian>(42).unwrap();
        buffer.write_u32::<BigEndian>(8).unwrap();

        buffer.write_u16::<BigEndian>(2).unwrap();
        // ImageWidth as an inline SHORT sits in the first two bytes
        buffer.write_u16::<BigEndian>(256).unwrap();
        buffer.write_u16::<BigEndian>(3).unwrap();
        buffer.write_u32::<BigEndian>(1).unwrap();
        buffer.write_u16::<BigEndian>(640).unwrap();
        buffer.write_u16::<BigEndian>(0).unwrap();
        // ModelPixelScale: three doubles stored after the IFD
        buffer.write_u16::<BigEndian>(33550).unwrap();
        buffer.write_u16::<BigEndian>(12).unwrap();
        buffer.write_u32::<BigEndian>(3).unwrap();
        buffer.write_u32::<BigEndian>(38).unwrap();
        buffer.write_u32::<BigEndian>(0).unwrap();

        for value in [0.5f64, 0.25, 0.0] {
            buffer.write_f64::<BigEndian>(value).unwrap();
        }

        Cursor::new(buffer)
    }

    #[test]
    fn test_big_endian_inline_short() {
        let mut reader = big_endian_tiff();
        let header = TiffHeader::read(&mut reader).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert!(!header.is_big_tiff);

        let handler = header.byte_order.create_handler();
        let ifd = Ifd::read(&mut reader, &header, handler.as_ref()).unwrap();

        assert_eq!(ifd.read_scalar(&mut reader, handler.as_ref(), 256).unwrap(), Some(640));
        assert_eq!(ifd.read_scalar(&mut reader, handler.as_ref(), 257).unwrap(), None);
        assert_eq!(
            ifd.read_doubles(&mut reader, handler.as_ref(), 33550).unwrap(),
            Some(vec![0.5, 0.25, 0.0])
        );
    }

    #[test]
    fn test_truncated_values_rejected() {
        let mut bytes = big_endian_tiff().into_inner();
        bytes.truncate(50);
        let mut reader = Cursor::new(bytes);

        let header = TiffHeader::read(&mut reader).unwrap();
        let handler = header.byte_order.create_handler();
        let ifd = Ifd::read(&mut reader, &header, handler.as_ref()).unwrap();
        assert!(ifd.read_doubles(&mut reader, handler.as_ref(), 33550).is_err());
    }

    #[test]
    fn test_not_a_tiff() {
        let mut reader = Cursor::new(b"GIF89a....".to_vec());
        assert!(TiffHeader::read(&mut reader).is_err());
    }
}
