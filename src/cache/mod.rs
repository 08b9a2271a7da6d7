//! Materialisation of windows as small georeferenced image files

mod aux_metadata;
mod encoder;
mod tile_cache;

pub use self::aux_metadata::AuxMetadata;
pub use self::encoder::{PngTileEncoder, RasterWindow, TileEncoder};
pub use self::tile_cache::{TileCache, TileHandle, DEFAULT_CAPACITY};
