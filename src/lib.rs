pub mod errors;
pub mod io;
pub mod utils;
pub mod compression;
pub mod coordinate;
pub mod tiler;
pub mod raster;
pub mod cache;
pub mod detection;
pub mod export;
pub mod aggregate;
pub mod pipeline;
pub mod commands;
pub mod api;

pub use crate::api::GeoSlicer;
pub use crate::errors::{SlicerError, SlicerResult};

pub use aggregate::{DetectionGrid, GridCell, GridItem};
pub use cache::{TileCache, TileHandle};
pub use coordinate::{CoordinateMapper, GeoBox, GeoTransform, PixelBox, Point, SpatialReference};
pub use detection::{CommandDetector, Detector, GeoDetection, PixelDetection, ScoreFilter};
pub use export::FeatureCollection;
pub use pipeline::{DetectionPipeline, ExpandPipeline, ExpandOptions, PredictionOptions};
pub use raster::{GeoTiffSource, MemoryRaster, RasterSource};
pub use tiler::{RasterTiler, ScanParameters, Window};
