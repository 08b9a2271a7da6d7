//! In-memory raster source

use super::source::{RasterInfo, RasterSource};
use crate::coordinate::{GeoTransform, SpatialReference};
use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::Window;

/// Raster held entirely in memory, band-sequential and row-major
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    info: RasterInfo,
    bands: Vec<Vec<f32>>,
}

impl MemoryRaster {
    /// Create a raster from band buffers
    ///
    /// # Arguments
    /// * `width`, `height` - Raster size in pixels
    /// * `bands` - One buffer of `width * height` values per band
    /// * `geotransform` - Affine transform of the raster
    /// * `spatial_ref` - Spatial reference of the geotransform
    pub fn new(width: u32, height: u32, bands: Vec<Vec<f32>>,
               geotransform: GeoTransform, spatial_ref: SpatialReference) -> SlicerResult<Self> {
        let expected = width as usize * height as usize;
        if bands.is_empty() || bands.iter().any(|band| band.len() != expected) {
            return Err(SlicerError::FormatError(format!(
                "Memory raster {}x{} needs at least one band of {} values", width, height, expected
            )));
        }

        let info = RasterInfo {
            width,
            height,
            band_count: bands.len(),
            geotransform,
            spatial_ref,
            data_type: "Float32".to_string(),
        };

        Ok(MemoryRaster { info, bands })
    }

    /// Create a raster whose values are computed per pixel
    ///
    /// `value(band, x, y)` is called once for every sample.
    pub fn from_fn<F>(width: u32, height: u32, band_count: usize, geotransform: GeoTransform,
                      spatial_ref: SpatialReference, value: F) -> SlicerResult<Self>
    where
        F: Fn(usize, u32, u32) -> f32,
    {
        let bands = (0..band_count)
            .map(|band| {
                (0..height)
                    .flat_map(|y| (0..width).map(move |x| (x, y)))
                    .map(|(x, y)| value(band, x, y))
                    .collect()
            })
            .collect();

        MemoryRaster::new(width, height, bands, geotransform, spatial_ref)
    }
}

impl RasterSource for MemoryRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_band(&self, band: usize, window: &Window) -> SlicerResult<Vec<f32>> {
        self.info.check_band(band)?;
        self.info.check_window(window)?;

        let source = &self.bands[band];
        let stride = self.info.width as usize;
        let mut values = Vec::with_capacity(window.area() as usize);

        for row in window.y..window.end_y() {
            let start = row as usize * stride + window.x as usize;
            values.extend_from_slice(&source[start..start + window.width as usize]);
        }

        Ok(values)
    }
}
