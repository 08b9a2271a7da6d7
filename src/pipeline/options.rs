//! Options of the predict and expand pipelines
//!
//! Both structures read from a TOML file; command-line flags are applied on
//! top by the commands.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::DEFAULT_CAPACITY;
use crate::detection::{CommandDetector, ScoreFilter};
use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::{ScanParameters, DEFAULT_SLICE_SIZE};

pub const DEFAULT_OUTPUT: &str = "./geoslicer-predict-results.json";
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 100;
pub const DEFAULT_THICKNESS: u32 = 2;

/// Read a TOML options file
fn load_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> SlicerResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| SlicerError::ConfigError(format!("Cannot read {}: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// Everything needed for one detection run over a raster
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PredictionOptions {
    /// Raster to scan
    pub tif: PathBuf,
    /// Detector program followed by its arguments
    pub detector: Vec<String>,
    #[serde(flatten)]
    pub scan: ScanParameters,
    /// GeoJSON output, rewritten at every checkpoint
    pub output: PathBuf,
    pub verbose: bool,
    /// Detections scoring below this are dropped; `0.0` drops negatives
    pub score_threshold: Option<f64>,
    /// Write every tile to this path instead of the ring cache
    pub tile_path: Option<PathBuf>,
    pub cache_capacity: usize,
    pub cache_dir: Option<PathBuf>,
    /// Steps between checkpoints of the output
    pub checkpoint_interval: u64,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        PredictionOptions {
            tif: PathBuf::new(),
            detector: Vec::new(),
            scan: ScanParameters::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            verbose: false,
            score_threshold: None,
            tile_path: None,
            cache_capacity: DEFAULT_CAPACITY,
            cache_dir: None,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

impl PredictionOptions {
    pub fn from_file(path: &Path) -> SlicerResult<Self> {
        load_toml(path)
    }

    /// Reject options no run could succeed with
    pub fn validate(&self) -> SlicerResult<()> {
        if self.tif.as_os_str().is_empty() {
            return Err(SlicerError::InvalidParameters("no raster given".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(SlicerError::InvalidParameters("cache capacity must be positive".to_string()));
        }
        if self.checkpoint_interval == 0 {
            return Err(SlicerError::InvalidParameters("checkpoint interval must be positive".to_string()));
        }
        self.scan.validate()
    }

    pub fn score_filter(&self) -> ScoreFilter {
        ScoreFilter::new(self.score_threshold)
    }

    /// External detector built from `detector`
    pub fn command_detector(&self) -> SlicerResult<CommandDetector> {
        match self.detector.split_first() {
            Some((program, args)) => Ok(CommandDetector::new(program, args)),
            None => Err(SlicerError::InvalidParameters("no detector command given".to_string())),
        }
    }
}

/// How grid cells are turned into images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    /// One image per cell with every box outlined
    #[default]
    Cells,
    /// One padded crop per item
    Items,
}

/// Options for re-rendering exported detections from the raster
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    pub tif: PathBuf,
    /// Feature collection to expand
    pub geojson: PathBuf,
    /// Directory receiving the images
    pub output: PathBuf,
    /// Pixels added around every box
    pub padding: f64,
    pub cell_size: u32,
    pub mode: ExpandMode,
    /// Outline width in cell mode
    pub thickness: u32,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            tif: PathBuf::new(),
            geojson: PathBuf::new(),
            output: PathBuf::new(),
            padding: 0.0,
            cell_size: DEFAULT_SLICE_SIZE,
            mode: ExpandMode::Cells,
            thickness: DEFAULT_THICKNESS,
        }
    }
}

impl ExpandOptions {
    pub fn from_file(path: &Path) -> SlicerResult<Self> {
        load_toml(path)
    }

    pub fn validate(&self) -> SlicerResult<()> {
        for (name, path) in [("raster", &self.tif), ("geojson", &self.geojson), ("output directory", &self.output)] {
            if path.as_os_str().is_empty() {
                return Err(SlicerError::InvalidParameters(format!("no {} given", name)));
            }
        }
        if self.cell_size == 0 {
            return Err(SlicerError::InvalidParameters("cell size must be positive".to_string()));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(SlicerError::InvalidParameters(format!("invalid padding {}", self.padding)));
        }
        Ok(())
    }
}
