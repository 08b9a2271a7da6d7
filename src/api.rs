use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::cache::{RasterWindow, TileCache, TileHandle};
use crate::detection::Detector;
use crate::errors::SlicerResult;
use crate::pipeline::{DetectionPipeline, ExpandOptions, ExpandPipeline, ExpandStats, PipelineStats, PredictionOptions};
use crate::raster::{GeoTiffSource, RasterSource};
use crate::tiler::{RasterTiler, ScanParameters};
use crate::utils::logger::Logger;

/// Main interface to the geoslicer library
pub struct GeoSlicer {
    logger: Logger,
}

impl GeoSlicer {
    /// Create a new GeoSlicer instance
    ///
    /// # Arguments
    /// * `log_file` - Optional path to the run log, defaults to "geoslicer.log"
    ///
    /// # Returns
    /// A GeoSlicer instance or an error if the log cannot be created
    pub fn new(log_file: Option<&str>) -> SlicerResult<Self> {
        let logger = Logger::new(log_file.unwrap_or("geoslicer.log"))?.quiet();
        Ok(GeoSlicer { logger })
    }

    /// Describe a GeoTIFF and the grid a scan with `params` would walk
    ///
    /// # Returns
    /// A multi-line summary or an error when the file cannot be read
    pub fn describe(&self, input_path: &str, params: ScanParameters) -> SlicerResult<String> {
        let source = GeoTiffSource::open(input_path)?;
        let tiler = RasterTiler::for_source(params, &source)?;

        let mut result = format!("{}\n", source.info());
        result.push_str(&format!("  Format: {}\n", if source.is_big_tiff() { "BigTIFF" } else { "TIFF" }));
        result.push_str(&format!("  Compression: {}\n", source.compression_name()));
        result.push_str(&format!("  Windows: {}\n", tiler.total_steps()));

        self.logger.log(&format!("describe {}", input_path))?;
        Ok(result)
    }

    /// Write every window of a scan as a georeferenced PNG
    ///
    /// Tiles are named `tile-<column>-<row>.png` and are kept on disk.
    ///
    /// # Returns
    /// Handles of the written tiles in scan order
    pub fn slice(&self, input_path: &str, params: ScanParameters, output_dir: &Path) -> SlicerResult<Vec<TileHandle>> {
        let source = GeoTiffSource::open(input_path)?;
        let info = source.info();
        let mapper = info.mapper()?;

        fs::create_dir_all(output_dir)?;
        let mut cache = TileCache::new(1)?;
        let mut handles = Vec::new();

        RasterTiler::for_source(params, &source)?.run(&source, |data, step| {
            let window_mapper = mapper.window_mapper(&step.window)?;
            let tile = RasterWindow::new(&data, *window_mapper.geotransform(), &info.spatial_ref);
            let path: PathBuf = output_dir.join(format!("tile-{}-{}.png", step.column, step.row));
            handles.push(cache.materialize(&tile, Some(&path))?);
            Ok(())
        })?;

        info!("Sliced {} into {} tiles", input_path, handles.len());
        self.logger.log(&format!("slice {}: {} tiles in {}", input_path, handles.len(), output_dir.display()))?;
        Ok(handles)
    }

    /// Run a detector over a GeoTIFF and export the detections
    pub fn predict<D: Detector>(&self, options: PredictionOptions, detector: D) -> SlicerResult<PipelineStats> {
        let output = options.output.clone();
        let stats = DetectionPipeline::new(options, detector)?.run_file()?;
        self.logger.log(&format!("predict: {} -> {}", stats, output.display()))?;
        Ok(stats)
    }

    /// Render exported detections back out of the raster
    pub fn expand(&self, options: ExpandOptions) -> SlicerResult<ExpandStats> {
        let stats = ExpandPipeline::new(options)?.run_file()?;
        self.logger.log(&format!("expand: {}", stats))?;
        Ok(stats)
    }
}
