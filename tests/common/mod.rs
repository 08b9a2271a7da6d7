//! Synthetic GeoTIFF files for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Sample encoding of a synthetic raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Samples {
    U8,
    U16,
    F32,
}

impl Samples {
    fn bits(self) -> u16 {
        match self {
            Samples::U8 => 8,
            Samples::U16 => 16,
            Samples::F32 => 32,
        }
    }

    fn format(self) -> u16 {
        if self == Samples::F32 { 3 } else { 1 }
    }
}

/// How the raster is georeferenced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Georef {
    None,
    /// Origin x, origin y and pixel size
    TiepointScale(f64, f64, f64),
    /// GDAL-ordered affine coefficients
    Transformation([f64; 6]),
}

enum Value {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Long8(Vec<u64>),
    Double(Vec<f64>),
}

impl Value {
    fn field_type(&self) -> u16 {
        match self {
            Value::Short(_) => 3,
            Value::Long(_) => 4,
            Value::Long8(_) => 16,
            Value::Double(_) => 12,
        }
    }

    fn count(&self) -> u64 {
        match self {
            Value::Short(v) => v.len() as u64,
            Value::Long(v) => v.len() as u64,
            Value::Long8(v) => v.len() as u64,
            Value::Double(v) => v.len() as u64,
        }
    }
}

/// Little helper writing numbers in the chosen byte order
struct Buffer {
    big_endian: bool,
    bytes: Vec<u8>,
}

impl Buffer {
    fn u16(&mut self, v: u16) {
        let written = if self.big_endian { self.bytes.write_u16::<BigEndian>(v) } else { self.bytes.write_u16::<LittleEndian>(v) };
        written.unwrap();
    }

    fn u32(&mut self, v: u32) {
        let written = if self.big_endian { self.bytes.write_u32::<BigEndian>(v) } else { self.bytes.write_u32::<LittleEndian>(v) };
        written.unwrap();
    }

    fn u64(&mut self, v: u64) {
        let written = if self.big_endian { self.bytes.write_u64::<BigEndian>(v) } else { self.bytes.write_u64::<LittleEndian>(v) };
        written.unwrap();
    }

    fn f32(&mut self, v: f32) {
        self.u32(v.to_bits());
    }

    fn f64(&mut self, v: f64) {
        self.u64(v.to_bits());
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Short(v) => v.iter().for_each(|x| self.u16(*x)),
            Value::Long(v) => v.iter().for_each(|x| self.u32(*x)),
            Value::Long8(v) => v.iter().for_each(|x| self.u64(*x)),
            Value::Double(v) => v.iter().for_each(|x| self.f64(*x)),
        }
    }

    fn sample(&mut self, samples: Samples, value: u64) {
        match samples {
            Samples::U8 => self.bytes.push(value as u8),
            Samples::U16 => self.u16(value as u16),
            Samples::F32 => self.f32(value as f32),
        }
    }
}

/// Pixel value of the synthetic pattern
pub fn pattern(band: usize, x: u32, y: u32) -> u64 {
    ((x + 3 * y + 40 * band as u32) % 251) as u64
}

/// Builder of small GeoTIFF files with the pattern of [`pattern`]
#[derive(Debug, Clone)]
pub struct TiffBuilder {
    pub width: u32,
    pub height: u32,
    pub bands: u16,
    pub samples: Samples,
    pub big_endian: bool,
    pub big_tiff: bool,
    /// Tile size; strips when `None`
    pub tile: Option<(u32, u32)>,
    pub rows_per_strip: u32,
    pub planar_separate: bool,
    pub compression: u16,
    pub predictor: bool,
    pub georef: Georef,
    pub epsg: Option<u16>,
}

impl TiffBuilder {
    pub fn new(width: u32, height: u32, bands: u16) -> Self {
        TiffBuilder {
            width,
            height,
            bands,
            samples: Samples::U8,
            big_endian: false,
            big_tiff: false,
            tile: None,
            rows_per_strip: 7,
            planar_separate: false,
            compression: 1,
            predictor: false,
            georef: Georef::TiepointScale(500_000.0, 4_000_000.0, 0.5),
            epsg: Some(32633),
        }
    }

    fn block_size(&self) -> (u32, u32) {
        self.tile.unwrap_or((self.width, self.rows_per_strip.min(self.height)))
    }

    /// Raw samples of one block, before prediction and compression
    fn block_values(&self, plane: u16, block_x: u32, block_y: u32) -> Vec<Vec<u64>> {
        let (bw, bh) = self.block_size();
        let rows = if self.tile.is_some() { bh } else { bh.min(self.height - block_y * bh) };
        let bands: Vec<usize> = if self.planar_separate { vec![plane as usize] } else { (0..self.bands as usize).collect() };

        (0..rows).map(|row| {
            let y = block_y * bh + row;
            let mut values = Vec::new();
            for column in 0..bw {
                let x = block_x * bw + column;
                for band in &bands {
                    values.push(if x < self.width && y < self.height { pattern(*band, x, y) } else { 0 });
                }
            }
            values
        }).collect()
    }

    fn encode_block(&self, plane: u16, block_x: u32, block_y: u32) -> Vec<u8> {
        let samples_per_pixel = if self.planar_separate { 1 } else { self.bands as usize };
        let modulus: u64 = if self.samples == Samples::U8 { 256 } else { 65536 };

        let mut buffer = Buffer { big_endian: self.big_endian, bytes: Vec::new() };
        for mut row in self.block_values(plane, block_x, block_y) {
            if self.predictor {
                for i in (samples_per_pixel..row.len()).rev() {
                    row[i] = (row[i] + modulus - row[i - samples_per_pixel]) % modulus;
                }
            }
            row.iter().for_each(|v| buffer.sample(self.samples, *v));
        }

        match self.compression {
            1 => buffer.bytes,
            8 | 32946 => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&buffer.bytes).unwrap();
                encoder.finish().unwrap()
            },
            50000 => zstd::encode_all(&buffer.bytes[..], 0).unwrap(),
            other => panic!("no encoder for compression {}", other),
        }
    }

    fn tags(&self, offsets: Vec<u64>, counts: Vec<u64>) -> Vec<(u16, Value)> {
        let offsets_value = |values: Vec<u64>| if self.big_tiff {
            Value::Long8(values)
        } else {
            Value::Long(values.into_iter().map(|v| v as u32).collect())
        };

        let mut tags = vec![
            (256, Value::Long(vec![self.width])),
            (257, Value::Long(vec![self.height])),
            (258, Value::Short(vec![self.samples.bits(); self.bands as usize])),
            (259, Value::Short(vec![self.compression])),
            (262, Value::Short(vec![if self.bands >= 3 { 2 } else { 1 }])),
            (277, Value::Short(vec![self.bands])),
            (284, Value::Short(vec![if self.planar_separate { 2 } else { 1 }])),
            (339, Value::Short(vec![self.samples.format(); self.bands as usize])),
        ];

        if self.predictor {
            tags.push((317, Value::Short(vec![2])));
        }

        match self.tile {
            Some((tw, th)) => {
                tags.push((322, Value::Long(vec![tw])));
                tags.push((323, Value::Long(vec![th])));
                tags.push((324, offsets_value(offsets)));
                tags.push((325, offsets_value(counts)));
            },
            None => {
                tags.push((273, offsets_value(offsets)));
                tags.push((278, Value::Long(vec![self.rows_per_strip])));
                tags.push((279, offsets_value(counts)));
            },
        }

        match self.georef {
            Georef::None => {},
            Georef::TiepointScale(x, y, size) => {
                tags.push((33550, Value::Double(vec![size, size, 0.0])));
                tags.push((33922, Value::Double(vec![0.0, 0.0, 0.0, x, y, 0.0])));
            },
            Georef::Transformation(gt) => {
                tags.push((34264, Value::Double(vec![
                    gt[1], gt[2], 0.0, gt[0],
                    gt[4], gt[5], 0.0, gt[3],
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ])));
            },
        }

        if let Some(epsg) = self.epsg {
            tags.push((34735, Value::Short(vec![1, 1, 0, 1, 3072, 0, 1, epsg])));
        }

        tags.sort_by_key(|(tag, _)| *tag);
        tags
    }

    /// Assemble the file in memory
    pub fn build(&self) -> Vec<u8> {
        let mut file = Buffer { big_endian: self.big_endian, bytes: Vec::new() };
        file.bytes.extend_from_slice(if self.big_endian { b"MM" } else { b"II" });
        if self.big_tiff {
            file.u16(43);
            file.u16(8);
            file.u16(0);
            file.u64(0);
        } else {
            file.u16(42);
            file.u32(0);
        }

        let (bw, bh) = self.block_size();
        let planes = if self.planar_separate { self.bands } else { 1 };
        let (mut offsets, mut counts) = (Vec::new(), Vec::new());
        for plane in 0..planes {
            for block_y in 0..self.height.div_ceil(bh) {
                for block_x in 0..self.width.div_ceil(bw) {
                    let data = self.encode_block(plane, block_x, block_y);
                    offsets.push(file.bytes.len() as u64);
                    counts.push(data.len() as u64);
                    file.bytes.extend_from_slice(&data);
                }
            }
        }
        if file.bytes.len() % 2 == 1 {
            file.bytes.push(0);
        }

        let tags = self.tags(offsets, counts);
        let ifd_offset = file.bytes.len() as u64;
        let field_size = if self.big_tiff { 8 } else { 4 };
        let ifd_size = if self.big_tiff { 8 + 20 * tags.len() as u64 + 8 } else { 2 + 12 * tags.len() as u64 + 4 };

        let mut extra = Buffer { big_endian: self.big_endian, bytes: Vec::new() };
        let extra_start = ifd_offset + ifd_size;

        if self.big_tiff { file.u64(tags.len() as u64) } else { file.u16(tags.len() as u16) }
        for (tag, value) in &tags {
            file.u16(*tag);
            file.u16(value.field_type());
            if self.big_tiff { file.u64(value.count()) } else { file.u32(value.count() as u32) }

            let mut encoded = Buffer { big_endian: self.big_endian, bytes: Vec::new() };
            encoded.value(value);
            if encoded.bytes.len() <= field_size {
                encoded.bytes.resize(field_size, 0);
                file.bytes.extend_from_slice(&encoded.bytes);
            } else {
                let offset = extra_start + extra.bytes.len() as u64;
                if self.big_tiff { file.u64(offset) } else { file.u32(offset as u32) }
                extra.bytes.extend_from_slice(&encoded.bytes);
            }
        }
        if self.big_tiff { file.u64(0) } else { file.u32(0) }
        file.bytes.extend_from_slice(&extra.bytes);

        // Patch the first IFD offset into the header
        let mut header = Buffer { big_endian: self.big_endian, bytes: Vec::new() };
        if self.big_tiff {
            header.u64(ifd_offset);
            file.bytes[8..16].copy_from_slice(&header.bytes);
        } else {
            header.u32(ifd_offset as u32);
            file.bytes[4..8].copy_from_slice(&header.bytes);
        }

        file.bytes
    }

    /// Write the file into `dir` under `name`
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
