//! Detection command
//!
//! Scans a GeoTIFF with an external detector and writes the detections as
//! a GeoJSON feature collection.

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::errors::SlicerResult;
use crate::pipeline::{DetectionPipeline, PredictionOptions};
use crate::utils::logger::Logger;

/// Command running the detection pipeline
pub struct PredictCommand<'a> {
    /// Fully resolved options
    options: PredictionOptions,
    /// Logger for recording the run summary
    logger: &'a Logger,
}

impl<'a> PredictCommand<'a> {
    /// Create a new predict command
    ///
    /// Options come from `--config` when given; every flag on the command
    /// line overrides the file.
    ///
    /// # Arguments
    /// * `args` - Matches of the `predict` subcommand
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> SlicerResult<Self> {
        let mut options = match args.get_one::<String>("config") {
            Some(config) => PredictionOptions::from_file(Path::new(config))?,
            None => PredictionOptions::default(),
        };

        if let Some(tif) = args.get_one::<String>("input") {
            options.tif = PathBuf::from(tif);
        }
        if let Some(detector) = args.get_one::<String>("detector") {
            options.detector = detector.split_whitespace().map(str::to_string).collect();
        }
        if let Some(&slice_size) = args.get_one::<u32>("slice-size") {
            options.scan.slice_size = slice_size;
        }
        if let Some(&overlap) = args.get_one::<u32>("overlap") {
            options.scan.overlap = overlap;
        }
        if let Some(range) = args.get_one::<String>("range") {
            options.scan = options.scan.parse_range(range)?;
        }
        if let Some(output) = args.get_one::<String>("output") {
            options.output = PathBuf::from(output);
        }
        if let Some(&threshold) = args.get_one::<f64>("score-threshold") {
            options.score_threshold = Some(threshold);
        } else if args.get_flag("ignore-negatives") {
            options.score_threshold = Some(0.0);
        }
        if let Some(tile) = args.get_one::<String>("tile") {
            options.tile_path = Some(PathBuf::from(tile));
        }
        if let Some(&capacity) = args.get_one::<usize>("cache-capacity") {
            options.cache_capacity = capacity;
        }
        if let Some(dir) = args.get_one::<String>("cache-dir") {
            options.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(&interval) = args.get_one::<u64>("checkpoint") {
            options.checkpoint_interval = interval;
        }
        options.verbose |= args.get_flag("verbose");

        options.validate()?;
        Ok(PredictCommand { options, logger })
    }

    pub fn options(&self) -> &PredictionOptions {
        &self.options
    }
}

impl<'a> Command for PredictCommand<'a> {
    fn execute(&self) -> SlicerResult<()> {
        let detector = self.options.command_detector()?;
        info!("Detecting with {} on {}", detector.program(), self.options.tif.display());

        let mut pipeline = DetectionPipeline::new(self.options.clone(), detector)?
            .with_progress(!self.options.verbose);
        let stats = pipeline.run_file()?;

        self.logger.log(&format!("predict {}: {} -> {}",
                                 self.options.tif.display(), stats, self.options.output.display()))?;
        info!("Wrote {} detections to {}", stats.detections, self.options.output.display());
        Ok(())
    }
}
