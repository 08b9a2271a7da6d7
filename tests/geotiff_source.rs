//! Integration tests for reading windows out of GeoTIFF files

mod common;

use approx::assert_abs_diff_eq;
use byteorder::{LittleEndian, WriteBytesExt};
use common::{pattern, Georef, Samples, TiffBuilder};
use geoslicer::coordinate::SpatialReference;
use geoslicer::raster::{GeoTiffSource, RasterSource};
use geoslicer::{SlicerError, Window};

/// Little-endian classic TIFF with one IFD of inline entries
/// `(tag, type, count, value)`, followed by `payload` bytes of zeros
fn raw_tiff(entries: &[(u16, u16, u32, u32)], payload: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.write_u16::<LittleEndian>(0x4949).unwrap();
    bytes.write_u16::<LittleEndian>(42).unwrap();
    bytes.write_u32::<LittleEndian>(8).unwrap();
    bytes.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    for &(tag, field_type, count, value) in entries {
        bytes.write_u16::<LittleEndian>(tag).unwrap();
        bytes.write_u16::<LittleEndian>(field_type).unwrap();
        bytes.write_u32::<LittleEndian>(count).unwrap();
        bytes.write_u32::<LittleEndian>(value).unwrap();
    }
    bytes.write_u32::<LittleEndian>(0).unwrap();
    bytes.resize(bytes.len() + payload, 0);
    bytes
}

const SHORT: u16 = 3;
const LONG: u16 = 4;

fn open_raw(bytes: Vec<u8>) -> Result<GeoTiffSource, SlicerError> {
    GeoTiffSource::from_reader(Box::new(std::io::Cursor::new(bytes)))
}

/// Compare every band of `window` against the synthetic pattern
fn assert_window_matches(source: &GeoTiffSource, window: Window) {
    let data = source.read_window(&window).unwrap();
    assert_eq!(data.band_count(), source.info().band_count);

    for band in 0..data.band_count() {
        for y in 0..window.height {
            for x in 0..window.width {
                let expected = pattern(band, window.x + x, window.y + y) as f32;
                assert_eq!(data.value(band, x, y), Some(expected),
                           "band {} pixel ({}, {})", band, window.x + x, window.y + y);
            }
        }
    }
}

fn open(builder: &TiffBuilder) -> (tempfile::TempDir, GeoTiffSource) {
    let dir = tempfile::tempdir().unwrap();
    let path = builder.write(dir.path(), "raster.tif");
    let source = GeoTiffSource::open(&path).unwrap();
    (dir, source)
}

#[test]
fn test_stripped_rgb() {
    let (_dir, source) = open(&TiffBuilder::new(37, 23, 3));

    let info = source.info();
    assert_eq!((info.width, info.height, info.band_count), (37, 23, 3));
    assert_eq!(info.data_type, "Byte");
    assert!(!source.is_tiled());
    assert_window_matches(&source, Window::new(5, 4, 20, 12));
    assert_window_matches(&source, Window::full(37, 23));
}

#[test]
fn test_tiled_deflate_with_predictor() {
    let mut builder = TiffBuilder::new(50, 40, 3);
    builder.tile = Some((16, 16));
    builder.compression = 8;
    builder.predictor = true;
    let (_dir, source) = open(&builder);

    assert!(source.is_tiled());
    assert_window_matches(&source, Window::new(10, 10, 40, 30));
}

#[test]
fn test_planar_zstd_uint16() {
    let mut builder = TiffBuilder::new(30, 30, 2);
    builder.samples = Samples::U16;
    builder.planar_separate = true;
    builder.compression = 50000;
    let (_dir, source) = open(&builder);

    assert_eq!(source.info().data_type, "UInt16");
    assert_window_matches(&source, Window::new(3, 8, 17, 20));
    assert_eq!(source.read_band(1, &Window::new(0, 0, 1, 1)).unwrap(), vec![pattern(1, 0, 0) as f32]);
}

#[test]
fn test_big_endian_bigtiff_float() {
    let mut builder = TiffBuilder::new(21, 19, 1);
    builder.big_endian = true;
    builder.big_tiff = true;
    builder.samples = Samples::F32;
    builder.tile = Some((16, 16));
    let (_dir, source) = open(&builder);

    assert!(source.is_big_tiff());
    assert_eq!(source.info().data_type, "Float32");
    assert_window_matches(&source, Window::new(0, 0, 21, 19));
}

#[test]
fn test_big_endian_uint16_predictor() {
    let mut builder = TiffBuilder::new(33, 12, 1);
    builder.big_endian = true;
    builder.samples = Samples::U16;
    builder.predictor = true;
    builder.compression = 32946;
    let (_dir, source) = open(&builder);

    assert_window_matches(&source, Window::new(1, 1, 31, 10));
}

#[test]
fn test_georeferencing() {
    let (_dir, source) = open(&TiffBuilder::new(10, 10, 1));
    let info = source.info();
    assert_eq!(info.spatial_ref, SpatialReference::Epsg(32633));
    assert_eq!(info.geotransform.origin_x, 500_000.0);
    assert_eq!(info.geotransform.origin_y, 4_000_000.0);
    assert_eq!(info.geotransform.pixel_width, 0.5);
    assert_eq!(info.geotransform.pixel_height, -0.5);

    let mut builder = TiffBuilder::new(10, 10, 1);
    builder.georef = Georef::Transformation([100.0, 2.0, 0.25, 300.0, 0.5, -2.0]);
    builder.epsg = None;
    let (_dir, source) = open(&builder);
    let gt = source.info().geotransform;
    assert_abs_diff_eq!(gt.origin_x, 100.0);
    assert_abs_diff_eq!(gt.row_rotation, 0.25);
    assert_abs_diff_eq!(gt.column_rotation, 0.5);
    assert_abs_diff_eq!(gt.pixel_height, -2.0);
    assert_eq!(source.info().spatial_ref, SpatialReference::Unknown);
}

#[test]
fn test_reads_outside_raster_fail() {
    let (_dir, source) = open(&TiffBuilder::new(10, 10, 1));
    assert!(matches!(
        source.read_window(&Window::new(5, 5, 6, 5)),
        Err(SlicerError::OutOfBounds { .. })
    ));
    assert!(source.read_band(1, &Window::new(0, 0, 2, 2)).is_err());
}

#[test]
fn test_malformed_files_fail_at_open() {
    let dir = tempfile::tempdir().unwrap();

    let garbage = dir.path().join("garbage.tif");
    std::fs::write(&garbage, b"not a tiff at all").unwrap();
    assert!(matches!(GeoTiffSource::open(&garbage), Err(SlicerError::FormatError(_))));

    let mut truncated = TiffBuilder::new(10, 10, 1).build();
    truncated.truncate(truncated.len() - 20);
    let path = dir.path().join("truncated.tif");
    std::fs::write(&path, truncated).unwrap();
    assert!(GeoTiffSource::open(&path).is_err());

    assert!(matches!(
        GeoTiffSource::open(dir.path().join("missing.tif")),
        Err(SlicerError::IoError(_))
    ));

    // BitsPerSample present but listing no values
    let no_bits = raw_tiff(&[
        (256, LONG, 1, 4), (257, LONG, 1, 4), (258, SHORT, 0, 0),
        (273, LONG, 1, 8), (279, LONG, 1, 16),
    ], 16);
    assert!(matches!(open_raw(no_bits), Err(SlicerError::FormatError(_))));

    // 65536x65536 pixels in 1x1 tiles needs more blocks than a u32 can count
    let huge_grid = raw_tiff(&[
        (256, LONG, 1, 65536), (257, LONG, 1, 65536), (258, SHORT, 1, 8),
        (322, LONG, 1, 1), (323, LONG, 1, 1), (324, LONG, 1, 8), (325, LONG, 1, 1),
    ], 16);
    assert!(matches!(open_raw(huge_grid), Err(SlicerError::FormatError(_))));

    // Strip byte count reaching far past the end of the file
    let oversized_strip = raw_tiff(&[
        (256, LONG, 1, 4), (257, LONG, 1, 4), (258, SHORT, 1, 8),
        (273, LONG, 1, 8), (279, LONG, 1, 0xFFFF_FFF0),
    ], 16);
    assert!(matches!(open_raw(oversized_strip), Err(SlicerError::FormatError(_))));
}

#[test]
fn test_unsupported_compression_is_rejected() {
    let mut bytes = TiffBuilder::new(4, 4, 1).build();
    // Find the inline compression value (tag 259, SHORT, count 1) and set it to LZW
    let entry = bytes.windows(8)
        .position(|w| w == [0x03, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00])
        .unwrap();
    bytes[entry + 8] = 5;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lzw.tif");
    std::fs::write(&path, bytes).unwrap();
    assert!(matches!(GeoTiffSource::open(&path), Err(SlicerError::UnsupportedCompression(5))));
}
