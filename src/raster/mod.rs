//! Raster sources
//!
//! The [`RasterSource`] trait is what the tiler and pipelines read pixels
//! through. [`GeoTiffSource`] decodes GeoTIFF files; [`MemoryRaster`] holds
//! synthetic rasters.

mod band;
pub mod geotiff;
mod memory;
mod source;

pub use self::band::WindowData;
pub use self::geotiff::GeoTiffSource;
pub use self::memory::MemoryRaster;
pub use self::source::{RasterInfo, RasterSource};
