//! CLI command implementations
//!
//! This module contains the subcommands of the `geoslicer` binary, built
//! with the Command pattern, and the clap definition they are parsed from.

pub mod command_traits;
pub mod expand_command;
pub mod info_command;
pub mod predict_command;

pub use command_traits::{Command, CommandFactory};
pub use expand_command::ExpandCommand;
pub use info_command::InfoCommand;
pub use predict_command::PredictCommand;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::errors::{SlicerError, SlicerResult};
use crate::utils::logger::Logger;

fn input_arg() -> Arg {
    Arg::new("input")
        .help("Input GeoTIFF file")
        .value_name("TIF")
        .index(1)
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .help("TOML file with options; flags override its values")
        .value_name("FILE")
}

fn slice_args() -> [Arg; 2] {
    [
        Arg::new("slice-size")
            .short('s')
            .long("slice-size")
            .help("Tile edge length in pixels")
            .value_name("PX")
            .value_parser(value_parser!(u32)),
        Arg::new("overlap")
            .long("overlap")
            .help("Overlap between neighbouring tiles in pixels")
            .value_name("PX")
            .value_parser(value_parser!(u32)),
    ]
}

/// Command-line definition of the `geoslicer` binary
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("geoslicer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Slice GeoTIFF rasters into overlapping tiles, detect objects and export GeoJSON")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Run log file")
                .value_name("FILE")
                .default_value("geoslicer.log")
                .global(true),
        )
        .subcommand(
            ClapCommand::new("predict")
                .about("Run a detector over every tile and export the detections")
                .arg(input_arg())
                .arg(config_arg())
                .args(slice_args())
                .arg(
                    Arg::new("detector")
                        .short('d')
                        .long("detector")
                        .help("Detector command; the tile path is appended")
                        .value_name("COMMAND"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("GeoJSON output file")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("range")
                        .long("range")
                        .help("Grid sub-range 'column,row,rows,columns'; 0 leaves an axis unbounded")
                        .value_name("RANGE"),
                )
                .arg(
                    Arg::new("score-threshold")
                        .long("score-threshold")
                        .help("Drop detections scoring below this value")
                        .value_name("SCORE")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("ignore-negatives")
                        .long("ignore-negatives")
                        .help("Drop detections with a negative score")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("tile")
                        .long("tile")
                        .help("Keep every tile at this path instead of the tile cache")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("cache-capacity")
                        .long("cache-capacity")
                        .help("Number of tile files reused by the cache")
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("cache-dir")
                        .long("cache-dir")
                        .help("Directory for cached tiles")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("checkpoint")
                        .long("checkpoint")
                        .help("Steps between writes of the output")
                        .value_name("STEPS")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            ClapCommand::new("expand")
                .about("Render exported detections from the raster")
                .arg(input_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("geojson")
                        .short('g')
                        .long("geojson")
                        .help("Feature collection to expand")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output directory")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("padding")
                        .short('p')
                        .long("padding")
                        .help("Pixels added around every box")
                        .value_name("PX")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("cell-size")
                        .long("cell-size")
                        .help("Grid cell edge length in pixels")
                        .value_name("PX")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("thickness")
                        .long("thickness")
                        .help("Outline width in pixels")
                        .value_name("PX")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("by-annotation")
                        .long("by-annotation")
                        .help("Export one crop per detection instead of one image per cell")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("info")
                .about("Describe a GeoTIFF and its tiling grid")
                .arg(input_arg().required(true))
                .args(slice_args()),
        )
}

/// Factory for creating command instances based on CLI arguments
pub struct GeoslicerCommandFactory;

impl GeoslicerCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        GeoslicerCommandFactory
    }
}

impl Default for GeoslicerCommandFactory {
    fn default() -> Self {
        GeoslicerCommandFactory::new()
    }
}

impl<'a> CommandFactory<'a> for GeoslicerCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> SlicerResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("predict", sub)) => Ok(Box::new(PredictCommand::new(sub, logger)?)),
            Some(("expand", sub)) => Ok(Box::new(ExpandCommand::new(sub, logger)?)),
            Some(("info", sub)) => Ok(Box::new(InfoCommand::new(sub, logger)?)),
            Some((name, _)) => Err(SlicerError::GenericError(format!("Unknown command '{}'", name))),
            None => Err(SlicerError::GenericError("No command given".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExpandMode;
    use std::path::PathBuf;

    fn logger(dir: &tempfile::TempDir) -> Logger {
        Logger::new(dir.path().join("run.log").to_str().unwrap()).unwrap().quiet()
    }

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_predict_flags() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(&dir);
        let matches = build_cli().get_matches_from([
            "geoslicer", "predict", "scene.tif",
            "--detector", "python3 detect.py",
            "--slice-size", "256", "--overlap", "16",
            "--range", "2,3,1,0",
            "--ignore-negatives",
        ]);
        let (_, sub) = matches.subcommand().unwrap();

        let command = PredictCommand::new(sub, &logger).unwrap();
        let options = command.options();
        assert_eq!(options.tif, PathBuf::from("scene.tif"));
        assert_eq!(options.detector, vec!["python3", "detect.py"]);
        assert_eq!(options.scan.slice_size, 256);
        assert_eq!((options.scan.start_column, options.scan.start_row), (2, 3));
        assert_eq!((options.scan.max_rows, options.scan.max_columns), (Some(1), None));
        assert_eq!(options.score_threshold, Some(0.0));
    }

    #[test]
    fn test_config_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(&dir);
        let config = dir.path().join("expand.toml");
        std::fs::write(&config, "tif = \"a.tif\"\ngeojson = \"a.json\"\noutput = \"out\"\npadding = 4.0\n").unwrap();

        let matches = build_cli().get_matches_from([
            "geoslicer", "expand", "--config", config.to_str().unwrap(), "--padding", "10", "--by-annotation",
        ]);
        let (_, sub) = matches.subcommand().unwrap();

        let command = ExpandCommand::new(sub, &logger).unwrap();
        assert_eq!(command.options().tif, PathBuf::from("a.tif"));
        assert_eq!(command.options().padding, 10.0);
        assert_eq!(command.options().mode, ExpandMode::Items);
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let logger = logger(&dir);
        let matches = build_cli().get_matches_from(["geoslicer", "predict", "scene.tif", "--overlap", "600"]);

        let result = GeoslicerCommandFactory::new().create_command(&matches, &logger);
        assert!(matches!(result, Err(SlicerError::InvalidParameters(_))));
    }
}
