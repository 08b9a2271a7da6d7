//! Tile encoders

use std::path::Path;

use image::ImageFormat;
use log::trace;

use crate::coordinate::{GeoTransform, SpatialReference};
use crate::errors::SlicerResult;
use crate::raster::WindowData;

/// Window pixels together with the georeferencing of the window
#[derive(Debug, Clone, Copy)]
pub struct RasterWindow<'a> {
    pub data: &'a WindowData,
    /// Transform of the window's own pixel grid
    pub geotransform: GeoTransform,
    pub spatial_ref: &'a SpatialReference,
}

impl<'a> RasterWindow<'a> {
    pub fn new(data: &'a WindowData, geotransform: GeoTransform, spatial_ref: &'a SpatialReference) -> Self {
        RasterWindow { data, geotransform, spatial_ref }
    }
}

/// Writes window pixels to an image file
pub trait TileEncoder {
    /// Encode `tile` to `path`
    ///
    /// Failures are reported as `EncodeError` and only affect this tile.
    fn encode(&self, tile: &RasterWindow<'_>, path: &Path) -> SlicerResult<()>;

    /// File extension of the produced images, without the dot
    fn extension(&self) -> &'static str;
}

/// Encodes tiles as 8-bit PNG
#[derive(Debug, Clone, Copy, Default)]
pub struct PngTileEncoder;

impl TileEncoder for PngTileEncoder {
    fn encode(&self, tile: &RasterWindow<'_>, path: &Path) -> SlicerResult<()> {
        let image = tile.data.to_image()?;
        image.save_with_format(path, ImageFormat::Png)?;
        trace!("Encoded {}x{} tile to {}", image.width(), image.height(), path.display());
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "png"
    }
}
