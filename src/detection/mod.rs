//! Detections and the detectors producing them

mod detection;
mod detector;

pub use self::detection::{GeoDetection, PixelDetection, ScoreFilter};
pub use self::detector::{CommandDetector, Detector};
