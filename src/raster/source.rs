//! Raster source abstraction consumed by the tiler

use std::fmt;

use super::band::WindowData;
use crate::coordinate::{CoordinateMapper, GeoTransform, SpatialReference};
use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::Window;

/// Properties of an opened raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub band_count: usize,
    pub geotransform: GeoTransform,
    pub spatial_ref: SpatialReference,
    /// Human-readable sample type, e.g. `Byte` or `Float32`
    pub data_type: String,
}

impl RasterInfo {
    /// Coordinate mapper bound to this raster's transform and size
    pub fn mapper(&self) -> SlicerResult<CoordinateMapper> {
        CoordinateMapper::new(self.geotransform, self.width, self.height)
    }

    /// Fail with `OutOfBounds` unless `window` lies inside the raster
    pub fn check_window(&self, window: &Window) -> SlicerResult<()> {
        if window.is_empty() || !window.fits_within(self.width, self.height) {
            return Err(SlicerError::OutOfBounds {
                x: window.x,
                y: window.y,
                width: window.width,
                height: window.height,
                raster_width: self.width,
                raster_height: self.height,
            });
        }
        Ok(())
    }

    /// Fail with `InvalidParameters` unless `band` is a valid 0-based index
    pub fn check_band(&self, band: usize) -> SlicerResult<()> {
        if band >= self.band_count {
            return Err(SlicerError::InvalidParameters(format!(
                "band {} out of range, raster has {} band(s)", band, self.band_count
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {}x{}", self.width, self.height)?;
        writeln!(f, "Bands: {} ({})", self.band_count, self.data_type)?;
        writeln!(f, "GeoTransform: {:?}", self.geotransform.to_gdal())?;
        write!(f, "Spatial reference: {}", self.spatial_ref)
    }
}

/// Read-only access to the pixels of a raster
///
/// Reads never touch pixels outside the requested window, and a window
/// outside `[0, width) x [0, height)` fails with `OutOfBounds` before any
/// data is read.
pub trait RasterSource {
    fn info(&self) -> &RasterInfo;

    /// Read one band of a window as row-major values
    ///
    /// # Arguments
    /// * `band` - 0-based band index
    /// * `window` - Pixel window to read
    fn read_band(&self, band: usize, window: &Window) -> SlicerResult<Vec<f32>>;

    /// Read every band of a window
    fn read_window(&self, window: &Window) -> SlicerResult<WindowData> {
        let info = self.info();
        info.check_window(window)?;

        let bands = (0..info.band_count)
            .map(|band| self.read_band(band, window))
            .collect::<SlicerResult<Vec<_>>>()?;

        WindowData::new(*window, bands)
    }
}
