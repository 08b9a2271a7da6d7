//! Tiling of rasters into overlapping windows
//!
//! [`RasterTiler`] walks a grid of `slice_size` cells over the raster and
//! yields one clipped [`Window`] per cell, widened by the configured overlap.

mod raster_tiler;
mod scan;
mod window;

pub use self::raster_tiler::{RasterTiler, TileStep};
pub use self::scan::{ScanParameters, DEFAULT_OVERLAP, DEFAULT_SLICE_SIZE};
pub use self::window::Window;
