//! End-to-end pipelines
//!
//! [`DetectionPipeline`] scans a raster and exports geo-referenced
//! detections; [`ExpandPipeline`] renders exported detections back out of
//! the raster.

pub mod expand;
pub mod options;
pub mod predict;

pub use self::expand::{ExpandPipeline, ExpandStats};
pub use self::options::{ExpandMode, ExpandOptions, PredictionOptions, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_OUTPUT};
pub use self::predict::{DetectionPipeline, PipelineStats};
