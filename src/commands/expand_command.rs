//! Expand command
//!
//! Renders the detections of a feature collection back out of the raster,
//! either one image per grid cell or one crop per detection.

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::errors::SlicerResult;
use crate::pipeline::{ExpandMode, ExpandOptions, ExpandPipeline};
use crate::utils::logger::Logger;

/// Command running the expand pipeline
pub struct ExpandCommand<'a> {
    options: ExpandOptions,
    logger: &'a Logger,
}

impl<'a> ExpandCommand<'a> {
    /// Create a new expand command
    ///
    /// # Arguments
    /// * `args` - Matches of the `expand` subcommand
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> SlicerResult<Self> {
        let mut options = match args.get_one::<String>("config") {
            Some(config) => ExpandOptions::from_file(Path::new(config))?,
            None => ExpandOptions::default(),
        };

        if let Some(tif) = args.get_one::<String>("input") {
            options.tif = PathBuf::from(tif);
        }
        if let Some(geojson) = args.get_one::<String>("geojson") {
            options.geojson = PathBuf::from(geojson);
        }
        if let Some(output) = args.get_one::<String>("output") {
            options.output = PathBuf::from(output);
        }
        if let Some(&padding) = args.get_one::<f64>("padding") {
            options.padding = padding;
        }
        if let Some(&cell_size) = args.get_one::<u32>("cell-size") {
            options.cell_size = cell_size;
        }
        if let Some(&thickness) = args.get_one::<u32>("thickness") {
            options.thickness = thickness;
        }
        if args.get_flag("by-annotation") {
            options.mode = ExpandMode::Items;
        }

        options.validate()?;
        Ok(ExpandCommand { options, logger })
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }
}

impl<'a> Command for ExpandCommand<'a> {
    fn execute(&self) -> SlicerResult<()> {
        let stats = ExpandPipeline::new(self.options.clone())?.run_file()?;

        self.logger.log(&format!("expand {}: {} -> {}",
                                 self.options.geojson.display(), stats, self.options.output.display()))?;
        info!("Wrote {} images to {}", stats.images, self.options.output.display());
        Ok(())
    }
}
