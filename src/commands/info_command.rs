//! Raster information command
//!
//! Shows what the detection pipeline will see of a GeoTIFF: size, bands,
//! storage, georeferencing and the tiling grid.

use clap::ArgMatches;
use log::{info, warn};

use crate::commands::command_traits::Command;
use crate::compression::CompressionFactory;
use crate::errors::{SlicerError, SlicerResult};
use crate::raster::{GeoTiffSource, RasterSource};
use crate::tiler::{RasterTiler, ScanParameters};
use crate::utils::logger::Logger;

/// Command describing a raster
pub struct InfoCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Grid geometry used for the window count
    scan: ScanParameters,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> SlicerResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| SlicerError::GenericError("Missing input file".to_string()))?
            .clone();

        let mut scan = ScanParameters::default();
        if let Some(&slice_size) = args.get_one::<u32>("slice-size") {
            scan.slice_size = slice_size;
        }
        if let Some(&overlap) = args.get_one::<u32>("overlap") {
            scan.overlap = overlap;
        }
        scan.validate()?;

        Ok(InfoCommand { input_file, scan, logger })
    }

    /// Display file structure
    fn display_storage(&self, source: &GeoTiffSource) {
        info!("  Format: {}", if source.is_big_tiff() { "BigTIFF" } else { "TIFF" });
        info!("  Layout: {}", if source.is_tiled() { "tiled" } else { "stripped" });
        info!("  Compression: {}", source.compression_name());

        let readable: Vec<String> = CompressionFactory::supported_codes()
            .iter()
            .filter_map(|&code| CompressionFactory::create_handler(code).ok())
            .map(|handler| format!("{} ({})", handler.name(), handler.code()))
            .collect();
        info!("  Readable compressions: {}", readable.join(", "));
    }

    /// Display georeferencing: transform, extent corners and origin
    fn display_georeference(&self, source: &GeoTiffSource) -> SlicerResult<()> {
        let raster = source.info();
        let gt = raster.geotransform;
        info!("  Geotransform: [{}, {}, {}, {}, {}, {}]",
              gt.origin_x, gt.pixel_width, gt.row_rotation, gt.origin_y, gt.column_rotation, gt.pixel_height);
        info!("  Spatial reference: {}", raster.spatial_ref);

        let mapper = raster.mapper()?;
        let extent = mapper.extent();
        for (name, corner) in [
            ("Origin", extent.at_origin()),
            ("Last row", extent.at_last_row()),
            ("Far corner", extent.at_far_corner()),
            ("Last column", extent.at_last_column()),
        ] {
            info!("  {:<12} ({:.3}, {:.3})", name, corner.x, corner.y);
        }

        match mapper.origin_lat_lon(&raster.spatial_ref) {
            Ok(origin) => info!("  Origin lon/lat: {:.6}, {:.6}", origin.x, origin.y),
            Err(e) => warn!("  Origin lon/lat unavailable: {}", e),
        }
        Ok(())
    }
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> SlicerResult<()> {
        let source = GeoTiffSource::open(&self.input_file)?;
        let raster = source.info();

        info!("Raster {}:", self.input_file);
        info!("  Size: {}x{}", raster.width, raster.height);
        info!("  Bands: {} ({})", raster.band_count, raster.data_type);
        self.display_storage(&source);
        self.display_georeference(&source)?;

        let tiler = RasterTiler::for_source(self.scan, &source)?;
        info!("  Windows at {} px with {} px overlap: {}",
              self.scan.slice_size, self.scan.overlap, tiler.total_steps());

        self.logger.log(&format!("info {}: {}", self.input_file, raster))?;
        Ok(())
    }
}
