//! GeoTIFF raster source
//!
//! Reads the first image of a TIFF or BigTIFF file in either byte order,
//! organised in strips or tiles, chunky or planar. Everything needed to
//! decode a window is resolved when the file is opened, so a raster that
//! cannot be read fails before any tiling starts.

mod blocks;
mod georef;
mod ifd;
mod tags;

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info};

use self::blocks::{undo_horizontal_predictor, BlockLayout, SampleType};
use self::ifd::{Ifd, TiffHeader};
use self::tags::{planar, predictor, sample_format, tags as tag};
use super::band::WindowData;
use super::source::{RasterInfo, RasterSource};
use crate::compression::{CompressionFactory, CompressionHandler};
use crate::errors::{SlicerError, SlicerResult};
use crate::io::{ByteOrderHandler, SeekableReader};
use crate::tiler::Window;

pub use self::georef::{GeoKeyEntry, GeoReference};

/// A GeoTIFF file opened for window reads
pub struct GeoTiffSource {
    path: PathBuf,
    reader: RefCell<Box<dyn SeekableReader>>,
    handler: Box<dyn ByteOrderHandler>,
    compression: Box<dyn CompressionHandler>,
    layout: BlockLayout,
    sample_type: SampleType,
    predictor: u64,
    is_big_tiff: bool,
    info: RasterInfo,
}

impl GeoTiffSource {
    /// Open a GeoTIFF file
    ///
    /// # Arguments
    /// * `path` - Path to the file
    ///
    /// # Returns
    /// The opened source, or `IoError`, `FormatError`,
    /// `UnsupportedCompression` or `UnsupportedLayout` when the file cannot
    /// be decoded
    pub fn open<P: AsRef<Path>>(path: P) -> SlicerResult<Self> {
        let path = path.as_ref();
        info!("Opening raster: {}", path.display());

        let file = File::open(path)?;
        let reader: Box<dyn SeekableReader> = Box::new(BufReader::with_capacity(1024 * 1024, file));
        let mut source = GeoTiffSource::from_reader(reader)?;
        source.path = path.to_path_buf();
        Ok(source)
    }

    /// Open a GeoTIFF held by any seekable reader
    pub fn from_reader(mut reader: Box<dyn SeekableReader>) -> SlicerResult<Self> {
        let header = TiffHeader::read(reader.as_mut())?;
        let handler = header.byte_order.create_handler();
        let ifd = Ifd::read(reader.as_mut(), &header, handler.as_ref())?;

        let r = reader.as_mut();
        let h = handler.as_ref();

        let width = ifd.read_scalar(r, h, tag::IMAGE_WIDTH)?
            .ok_or_else(|| SlicerError::FormatError("Missing image width".to_string()))?;
        let height = ifd.read_scalar(r, h, tag::IMAGE_LENGTH)?
            .ok_or_else(|| SlicerError::FormatError("Missing image height".to_string()))?;
        if width == 0 || height == 0 || width > u32::MAX as u64 || height > u32::MAX as u64 {
            return Err(SlicerError::FormatError(format!("Invalid image size {}x{}", width, height)));
        }
        let (width, height) = (width as u32, height as u32);

        let samples = ifd.read_scalar(r, h, tag::SAMPLES_PER_PIXEL)?.unwrap_or(1).max(1) as u32;
        let sample_type = resolve_sample_type(&ifd, r, h)?;

        let compression_code = ifd.read_scalar(r, h, tag::COMPRESSION)?.unwrap_or(1);
        let compression = CompressionFactory::create_handler(compression_code)?;

        let predictor_code = ifd.read_scalar(r, h, tag::PREDICTOR)?.unwrap_or(predictor::NONE);
        match predictor_code {
            predictor::NONE => {},
            predictor::HORIZONTAL_DIFFERENCING if !sample_type.is_float() => {},
            other => return Err(SlicerError::UnsupportedLayout(format!(
                "predictor {} with {} samples", other, sample_type.name()
            ))),
        }

        let planar_config = ifd.read_scalar(r, h, tag::PLANAR_CONFIGURATION)?.unwrap_or(planar::CHUNKY);
        let layout = BlockLayout::read(&ifd, r, h, width, height, samples, planar_config)?;
        let georef = GeoReference::read(&ifd, r, h)?;

        info!("Raster {}x{}, {} band(s) of {}, compression {}",
              width, height, samples, sample_type.name(), compression.name());

        let info = RasterInfo {
            width,
            height,
            band_count: samples as usize,
            geotransform: georef.geotransform,
            spatial_ref: georef.spatial_ref,
            data_type: sample_type.name().to_string(),
        };

        Ok(GeoTiffSource {
            path: PathBuf::new(),
            reader: RefCell::new(reader),
            handler,
            compression,
            layout,
            sample_type,
            predictor: predictor_code,
            is_big_tiff: header.is_big_tiff,
            info,
        })
    }

    /// Path the source was opened from, empty for reader-backed sources
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    pub fn is_tiled(&self) -> bool {
        self.layout.is_tiled
    }

    pub fn compression_name(&self) -> &'static str {
        self.compression.name()
    }

    /// Read, decompress and un-predict one block
    fn decode_block(&self, index: usize, rows: u32) -> SlicerResult<Vec<u8>> {
        let offset = self.layout.offsets[index];
        let byte_count = self.layout.byte_counts[index];

        let mut compressed = vec![0u8; byte_count as usize];
        {
            let mut reader = self.reader.borrow_mut();
            reader.seek(SeekFrom::Start(offset))?;
            reader.read_exact(&mut compressed)?;
        }

        let mut data = self.compression.decompress(&compressed)?;

        let sample_bytes = self.sample_type.bytes();
        let samples = self.layout.block_samples as usize;
        let expected = self.layout.block_width as usize * rows as usize * samples * sample_bytes;
        if data.len() < expected {
            return Err(SlicerError::FormatError(format!(
                "Block {} decoded to {} bytes, expected {}", index, data.len(), expected
            )));
        }

        if self.predictor == predictor::HORIZONTAL_DIFFERENCING {
            undo_horizontal_predictor(&mut data[..expected], self.handler.as_ref(),
                                      self.layout.block_width as usize, samples, sample_bytes);
        }

        Ok(data)
    }

    /// Read several bands of a window, decoding each block once per plane
    fn read_bands(&self, bands: &[usize], window: &Window) -> SlicerResult<Vec<Vec<f32>>> {
        self.info.check_window(window)?;
        for band in bands {
            self.info.check_band(*band)?;
        }

        // (plane, [(output slot, sample index inside a block pixel)])
        let plane_reads: Vec<(u32, Vec<(usize, usize)>)> = if self.layout.planes == 1 {
            vec![(0, bands.iter().enumerate().map(|(slot, band)| (slot, *band)).collect())]
        } else {
            bands.iter().enumerate().map(|(slot, band)| (*band as u32, vec![(slot, 0)])).collect()
        };

        let mut output = vec![vec![0f32; window.area() as usize]; bands.len()];
        let layout = &self.layout;
        let sample_bytes = self.sample_type.bytes();
        let block_samples = layout.block_samples as usize;

        for (plane, targets) in &plane_reads {
            for block_row in window.y / layout.block_height..=(window.end_y() - 1) / layout.block_height {
                let rows = layout.rows_in_block(block_row, self.info.height);
                let block_y = block_row * layout.block_height;

                for block_column in window.x / layout.block_width..=(window.end_x() - 1) / layout.block_width {
                    let block_x = block_column * layout.block_width;
                    let data = self.decode_block(layout.index(*plane, block_column, block_row), rows)?;

                    let y_range = window.y.max(block_y)..window.end_y().min(block_y + rows);
                    let x_range = window.x.max(block_x)..window.end_x().min(block_x + layout.block_width);

                    for y in y_range {
                        let out_row = ((y - window.y) * window.width) as usize;
                        let block_row_start = ((y - block_y) * layout.block_width) as usize;

                        for x in x_range.clone() {
                            let pixel = (block_row_start + (x - block_x) as usize) * block_samples;
                            let out = out_row + (x - window.x) as usize;

                            for (slot, sample) in targets {
                                let start = (pixel + sample) * sample_bytes;
                                output[*slot][out] = self.sample_type
                                    .decode(self.handler.as_ref(), &data[start..start + sample_bytes]);
                            }
                        }
                    }
                }
            }
        }

        debug!("Read {} band(s) of window {:?}", bands.len(), window);
        Ok(output)
    }
}

fn resolve_sample_type(ifd: &Ifd, reader: &mut dyn SeekableReader,
                       handler: &dyn ByteOrderHandler) -> SlicerResult<SampleType> {
    let bits = ifd.read_unsigned(reader, handler, tag::BITS_PER_SAMPLE)?.unwrap_or_else(|| vec![1]);
    let formats = ifd.read_unsigned(reader, handler, tag::SAMPLE_FORMAT)?
        .unwrap_or_else(|| vec![sample_format::UNSIGNED]);

    let (first_bits, first_format) = match (bits.first(), formats.first()) {
        (Some(&b), Some(&f)) => (b, f),
        _ => return Err(SlicerError::FormatError(
            "BitsPerSample or SampleFormat lists no values".to_string()
        )),
    };

    if bits.iter().any(|b| *b != first_bits) || formats.iter().any(|f| *f != first_format) {
        return Err(SlicerError::UnsupportedLayout("bands with differing sample types".to_string()));
    }

    SampleType::from_tags(first_bits, first_format)
}

impl RasterSource for GeoTiffSource {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_band(&self, band: usize, window: &Window) -> SlicerResult<Vec<f32>> {
        let mut bands = self.read_bands(&[band], window)?;
        Ok(bands.remove(0))
    }

    fn read_window(&self, window: &Window) -> SlicerResult<WindowData> {
        let bands: Vec<usize> = (0..self.info.band_count).collect();
        WindowData::new(*window, self.read_bands(&bands, window)?)
    }
}
