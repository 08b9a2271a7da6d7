//! Strip and tile layout of TIFF image data
//!
//! Strips are treated as tiles spanning the full image width, so window
//! reads go through a single block grid for both organisations.

use log::debug;
use std::io::SeekFrom;

use super::ifd::Ifd;
use super::tags::{planar, sample_format, tags};
use crate::errors::{SlicerError, SlicerResult};
use crate::io::{ByteOrderHandler, SeekableReader};

/// Numeric type of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Resolve BitsPerSample and SampleFormat to a sample type
    pub fn from_tags(bits: u64, format: u64) -> SlicerResult<Self> {
        match (format, bits) {
            (sample_format::UNSIGNED, 8) => Ok(SampleType::U8),
            (sample_format::UNSIGNED, 16) => Ok(SampleType::U16),
            (sample_format::UNSIGNED, 32) => Ok(SampleType::U32),
            (sample_format::SIGNED, 8) => Ok(SampleType::I8),
            (sample_format::SIGNED, 16) => Ok(SampleType::I16),
            (sample_format::SIGNED, 32) => Ok(SampleType::I32),
            (sample_format::IEEE_FLOAT, 32) => Ok(SampleType::F32),
            (sample_format::IEEE_FLOAT, 64) => Ok(SampleType::F64),
            _ => Err(SlicerError::UnsupportedLayout(format!(
                "{}-bit samples with sample format {}", bits, format
            ))),
        }
    }

    /// Size of one sample in bytes
    pub fn bytes(&self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleType::U8 => "Byte",
            SampleType::U16 => "UInt16",
            SampleType::U32 => "UInt32",
            SampleType::I8 => "Int8",
            SampleType::I16 => "Int16",
            SampleType::I32 => "Int32",
            SampleType::F32 => "Float32",
            SampleType::F64 => "Float64",
        }
    }

    /// Decode the sample stored at the start of `bytes`
    pub fn decode(&self, handler: &dyn ByteOrderHandler, bytes: &[u8]) -> f32 {
        match self {
            SampleType::U8 => bytes[0] as f32,
            SampleType::I8 => bytes[0] as i8 as f32,
            SampleType::U16 => handler.u16_at(bytes) as f32,
            SampleType::I16 => handler.u16_at(bytes) as i16 as f32,
            SampleType::U32 => handler.u32_at(bytes) as f32,
            SampleType::I32 => handler.u32_at(bytes) as i32 as f32,
            SampleType::F32 => f32::from_bits(handler.u32_at(bytes)),
            SampleType::F64 => f64::from_bits(handler.u64_at(bytes)) as f32,
        }
    }
}

/// Grid of strips or tiles holding the image data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub is_tiled: bool,
    pub block_width: u32,
    pub block_height: u32,
    pub blocks_across: u32,
    pub blocks_down: u32,
    /// Number of separately stored sample planes
    pub planes: u32,
    /// Samples per pixel inside one block
    pub block_samples: u32,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl BlockLayout {
    /// Read the strip or tile layout of an image
    ///
    /// # Arguments
    /// * `ifd` - Directory of the image
    /// * `width`, `height` - Image size in pixels
    /// * `samples` - Samples per pixel
    /// * `planar_config` - PlanarConfiguration value
    pub fn read(ifd: &Ifd, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler,
                width: u32, height: u32, samples: u32, planar_config: u64) -> SlicerResult<Self> {
        let (planes, block_samples) = match planar_config {
            planar::CHUNKY => (1, samples),
            planar::SEPARATE => (samples, 1),
            other => return Err(SlicerError::UnsupportedLayout(format!("planar configuration {}", other))),
        };

        let is_tiled = ifd.has_tag(tags::TILE_WIDTH);
        let (block_width, block_height, offsets_tag, counts_tag) = if is_tiled {
            let tile_width = required(ifd.read_scalar(reader, handler, tags::TILE_WIDTH)?, "TileWidth")?;
            let tile_length = required(ifd.read_scalar(reader, handler, tags::TILE_LENGTH)?, "TileLength")?;
            (tile_width as u32, tile_length as u32, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.read_scalar(reader, handler, tags::ROWS_PER_STRIP)?
                .unwrap_or(height as u64)
                .min(height as u64);
            (width, rows_per_strip as u32, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if block_width == 0 || block_height == 0 {
            return Err(SlicerError::FormatError(format!(
                "Invalid block size {}x{}", block_width, block_height
            )));
        }

        let offsets = required(ifd.read_unsigned(reader, handler, offsets_tag)?, "data offsets")?;
        let byte_counts = required(ifd.read_unsigned(reader, handler, counts_tag)?, "data byte counts")?;

        let blocks_across = width.div_ceil(block_width);
        let blocks_down = height.div_ceil(block_height);
        let expected = (planes as u64).checked_mul(blocks_across as u64)
            .and_then(|n| n.checked_mul(blocks_down as u64))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| SlicerError::FormatError(format!(
                "Block grid {}x{}x{} is too large", planes, blocks_across, blocks_down
            )))?;

        if offsets.len() < expected || byte_counts.len() < expected {
            return Err(SlicerError::FormatError(format!(
                "Image needs {} blocks but lists {} offsets and {} byte counts",
                expected, offsets.len(), byte_counts.len()
            )));
        }

        let file_size = reader.seek(SeekFrom::End(0))?;
        for (index, (&offset, &count)) in offsets.iter().zip(&byte_counts).take(expected).enumerate() {
            if offset.checked_add(count).map_or(true, |end| end > file_size) {
                return Err(SlicerError::FormatError(format!(
                    "Block {} at offset {} with {} bytes runs past end of file ({} bytes)",
                    index, offset, count, file_size
                )));
            }
        }

        debug!("{} layout: {}x{} blocks of {}x{}, {} plane(s)",
               if is_tiled { "Tiled" } else { "Stripped" },
               blocks_across, blocks_down, block_width, block_height, planes);

        Ok(BlockLayout {
            is_tiled,
            block_width,
            block_height,
            blocks_across,
            blocks_down,
            planes,
            block_samples,
            offsets,
            byte_counts,
        })
    }

    /// Index of a block in the offset arrays
    pub fn index(&self, plane: u32, block_column: u32, block_row: u32) -> usize {
        let (across, down) = (self.blocks_across as usize, self.blocks_down as usize);
        (plane as usize * down + block_row as usize) * across + block_column as usize
    }

    /// Rows of pixel data held by a block row
    ///
    /// Tiles are always padded to the full tile height; the last strip
    /// only holds the rows left in the image.
    pub fn rows_in_block(&self, block_row: u32, image_height: u32) -> u32 {
        if self.is_tiled {
            self.block_height
        } else {
            self.block_height.min(image_height - block_row * self.block_height)
        }
    }
}

fn required<T>(value: Option<T>, name: &str) -> SlicerResult<T> {
    value.ok_or_else(|| SlicerError::FormatError(format!("Missing required tag: {}", name)))
}

/// Undo horizontal differencing in place
///
/// Each sample after the first pixel of a row was stored as the
/// difference to the same sample of the previous pixel, in the sample's
/// integer width with wrap-around.
pub fn undo_horizontal_predictor(data: &mut [u8], handler: &dyn ByteOrderHandler,
                                 row_pixels: usize, samples: usize, sample_bytes: usize) {
    let row_bytes = row_pixels * samples * sample_bytes;
    if row_bytes == 0 {
        return;
    }

    let stride = samples * sample_bytes;
    for row in data.chunks_exact_mut(row_bytes) {
        for offset in (stride..row_bytes).step_by(sample_bytes) {
            let previous = offset - stride;
            match sample_bytes {
                1 => row[offset] = row[offset].wrapping_add(row[previous]),
                2 => {
                    let value = handler.u16_at(&row[offset..]).wrapping_add(handler.u16_at(&row[previous..]));
                    handler.put_u16(&mut row[offset..], value);
                },
                _ => {
                    let value = handler.u32_at(&row[offset..]).wrapping_add(handler.u32_at(&row[previous..]));
                    handler.put_u32(&mut row[offset..], value);
                },
            }
        }
    }
}
