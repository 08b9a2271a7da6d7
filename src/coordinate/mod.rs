//! Coordinate handling for georeferenced rasters
//!
//! This module provides the affine geotransform, pixel/geographic boxes
//! and the mapper that converts between them, plus the small set of
//! coordinate reference systems the crate can resolve to longitude/latitude.

mod bbox;
mod crs;
mod extent;
mod geotransform;
mod mapper;
mod point;
mod transform;

// Re-export key types
pub use self::bbox::{GeoBox, PixelBox};
pub use self::crs::{CoordinateSystem, SpatialReference};
pub use self::extent::GeoExtent;
pub use self::geotransform::GeoTransform;
pub use self::mapper::CoordinateMapper;
pub use self::point::Point;
pub use self::transform::CoordinateTransformer;
