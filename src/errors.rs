//! Custom error types for raster slicing and detection

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while reading rasters, tiling, encoding and detecting
#[derive(Debug)]
pub enum SlicerError {
    /// I/O error
    IoError(io::Error),
    /// The raster file is malformed or not a readable GeoTIFF
    FormatError(String),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Unsupported sample layout (bit depth, sample format, predictor)
    UnsupportedLayout(String),
    /// Scan parameters rejected at the boundary
    InvalidParameters(String),
    /// A read was requested outside the raster extent
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },
    /// A tile handle was used after its cache slot was recycled
    InvalidatedHandle(PathBuf),
    /// A tile could not be encoded
    EncodeError(String),
    /// The detector failed for one tile
    DetectorError(String),
    /// Spatial reference could not be resolved or transformed
    CrsError(String),
    /// The geotransform cannot map between pixel and geographic space
    DegenerateTransform(String),
    /// JSON (de)serialization error
    JsonError(serde_json::Error),
    /// Configuration file error
    ConfigError(String),
    /// Generic error with message
    GenericError(String),
}

impl SlicerError {
    /// Whether the error only affects the current window
    ///
    /// Encode and detector failures are skipped by the detection pipeline;
    /// every other error aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SlicerError::EncodeError(_) | SlicerError::DetectorError(_))
    }
}

impl fmt::Display for SlicerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlicerError::IoError(e) => write!(f, "I/O error: {}", e),
            SlicerError::FormatError(msg) => write!(f, "Malformed raster: {}", msg),
            SlicerError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            SlicerError::UnsupportedLayout(msg) => write!(f, "Unsupported sample layout: {}", msg),
            SlicerError::InvalidParameters(msg) => write!(f, "Invalid scan parameters: {}", msg),
            SlicerError::OutOfBounds { x, y, width, height, raster_width, raster_height } => write!(
                f,
                "Window ({}, {}) {}x{} lies outside the {}x{} raster",
                x, y, width, height, raster_width, raster_height
            ),
            SlicerError::InvalidatedHandle(path) => write!(
                f,
                "Tile handle for {} has been invalidated: its cache slot was reused",
                path.display()
            ),
            SlicerError::EncodeError(msg) => write!(f, "Tile encoding failed: {}", msg),
            SlicerError::DetectorError(msg) => write!(f, "Detector failed: {}", msg),
            SlicerError::CrsError(msg) => write!(f, "Spatial reference error: {}", msg),
            SlicerError::DegenerateTransform(msg) => write!(f, "Degenerate geotransform: {}", msg),
            SlicerError::JsonError(e) => write!(f, "JSON error: {}", e),
            SlicerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SlicerError::GenericError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SlicerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SlicerError::IoError(e) => Some(e),
            SlicerError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SlicerError {
    fn from(error: io::Error) -> Self {
        SlicerError::IoError(error)
    }
}

impl From<serde_json::Error> for SlicerError {
    fn from(error: serde_json::Error) -> Self {
        SlicerError::JsonError(error)
    }
}

impl From<image::ImageError> for SlicerError {
    fn from(error: image::ImageError) -> Self {
        SlicerError::EncodeError(error.to_string())
    }
}

impl From<toml::de::Error> for SlicerError {
    fn from(error: toml::de::Error) -> Self {
        SlicerError::ConfigError(error.to_string())
    }
}

impl From<String> for SlicerError {
    fn from(msg: String) -> Self {
        SlicerError::GenericError(msg)
    }
}

/// Result type for slicing operations
pub type SlicerResult<T> = Result<T, SlicerError>;
