//! The detection pipeline: tile, detect, project, export

use std::fmt;

use log::{debug, error, info, warn};

use super::options::PredictionOptions;
use crate::cache::{PngTileEncoder, RasterWindow, TileCache, TileEncoder};
use crate::coordinate::{CoordinateMapper, SpatialReference};
use crate::detection::{Detector, ScoreFilter};
use crate::errors::SlicerResult;
use crate::export::{write_collection, FeatureCollection};
use crate::raster::{GeoTiffSource, RasterSource, WindowData};
use crate::tiler::{RasterTiler, TileStep};
use crate::utils::progress::ProgressTracker;

/// Counters of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Windows read from the raster
    pub windows: u64,
    /// Windows skipped after an encode or detector failure
    pub skipped: u64,
    /// Detections kept and exported
    pub detections: u64,
    /// Detections dropped by the score filter
    pub filtered: u64,
    /// Times the output was written
    pub checkpoints: u64,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} windows, {} skipped, {} detections, {} filtered, {} checkpoints",
            self.windows, self.skipped, self.detections, self.filtered, self.checkpoints
        )
    }
}

/// Drives one detection run over a raster
///
/// Every window produced by the tiler is materialised through the tile
/// cache, handed to the detector, filtered and projected to geographic
/// space. Accumulated features are written every `checkpoint_interval`
/// steps when new ones arrived, and once more at the end.
pub struct DetectionPipeline<D: Detector, E: TileEncoder = PngTileEncoder> {
    options: PredictionOptions,
    detector: D,
    cache: TileCache<E>,
    filter: ScoreFilter,
    collection: FeatureCollection,
    stats: PipelineStats,
    /// Features added since the last checkpoint
    pending: bool,
    show_progress: bool,
}

impl<D: Detector> DetectionPipeline<D, PngTileEncoder> {
    /// Create a pipeline with a PNG tile cache configured from `options`
    pub fn new(options: PredictionOptions, detector: D) -> SlicerResult<Self> {
        options.validate()?;
        let cache = TileCache::with_encoder(options.cache_capacity, options.cache_dir.as_deref(), PngTileEncoder)?;
        DetectionPipeline::with_cache(options, detector, cache)
    }
}

impl<D: Detector, E: TileEncoder> DetectionPipeline<D, E> {
    /// Create a pipeline around an existing tile cache
    pub fn with_cache(options: PredictionOptions, detector: D, cache: TileCache<E>) -> SlicerResult<Self> {
        options.validate()?;

        Ok(DetectionPipeline {
            filter: options.score_filter(),
            options,
            detector,
            cache,
            collection: FeatureCollection::new(),
            stats: PipelineStats::default(),
            pending: false,
            show_progress: false,
        })
    }

    /// Draw a progress bar while running
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn options(&self) -> &PredictionOptions {
        &self.options
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Features collected so far
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn cache(&self) -> &TileCache<E> {
        &self.cache
    }

    /// Open the configured GeoTIFF and run over it
    ///
    /// A raster that cannot be opened fails before any tiling starts.
    pub fn run_file(&mut self) -> SlicerResult<PipelineStats> {
        let source = GeoTiffSource::open(&self.options.tif)?;
        info!("Opened {}: {}", self.options.tif.display(), source.info());
        self.run(&source)
    }

    /// Run the detector over every window of `source` in the configured range
    ///
    /// Encode and detector failures skip the window. Any other error stops
    /// the run after writing what was collected so far.
    pub fn run<S: RasterSource + ?Sized>(&mut self, source: &S) -> SlicerResult<PipelineStats> {
        let info = source.info();
        let mapper = info.mapper()?;

        match mapper.origin_lat_lon(&info.spatial_ref) {
            Ok(origin) => info!("Raster origin at lon {:.6}, lat {:.6}", origin.x, origin.y),
            Err(e) => warn!("Cannot locate raster origin: {}", e),
        }

        let mut tiler = RasterTiler::for_source(self.options.scan, source)?;
        let total = tiler.total_steps();
        info!("Scanning {} windows of {} px with {} px overlap",
              total, self.options.scan.slice_size, self.options.scan.overlap);

        let progress = if self.show_progress {
            ProgressTracker::new(total, "Detecting")
        } else {
            ProgressTracker::hidden(total)
        };

        let interval = self.options.checkpoint_interval;
        let result = tiler.run(source, |data, step| {
            self.stats.windows += 1;
            let outcome = self.process_window(&data, step, &mapper, &info.spatial_ref);
            progress.increment(1);

            match outcome {
                Ok(0) => {},
                Ok(hits) => info!("{} hits at {}x{}", hits, step.column, step.row),
                Err(e) if e.is_recoverable() => {
                    self.stats.skipped += 1;
                    warn!("Skipping window {}x{}: {}", step.column, step.row, e);
                },
                Err(e) => return Err(e),
            }

            if self.stats.windows % interval == 0 {
                info!("Sliced another {}", interval);
                if self.pending {
                    self.checkpoint()?;
                }
            }
            Ok(())
        });

        if let Err(e) = result {
            error!("Run stopped at step {}: {}", tiler.steps(), e);
            if self.pending {
                if let Err(write_error) = self.checkpoint() {
                    error!("Could not save partial results: {}", write_error);
                }
            }
            return Err(e);
        }

        self.checkpoint()?;
        progress.finish();
        info!("Finished: {}", self.stats);
        Ok(self.stats)
    }

    /// Materialise, detect and project one window
    ///
    /// # Returns
    /// The number of detections kept for this window
    fn process_window(&mut self, data: &WindowData, step: &TileStep,
                      mapper: &CoordinateMapper, spatial_ref: &SpatialReference) -> SlicerResult<usize> {
        let window_mapper = mapper.window_mapper(&step.window)?;
        let tile = RasterWindow::new(data, *window_mapper.geotransform(), spatial_ref);
        let handle = self.cache.materialize(&tile, self.options.tile_path.as_deref())?;

        let detections = self.detector.detect(handle.path()?)?;
        let found = detections.len();
        let kept = self.filter.apply(detections);
        debug!("Window {:?}: {} detections, {} kept", step.window, found, kept.len());

        for detection in &kept {
            self.collection.push_detection(&detection.project(&window_mapper));
        }

        self.stats.filtered += (found - kept.len()) as u64;
        self.stats.detections += kept.len() as u64;
        if !kept.is_empty() {
            self.pending = true;
        }
        Ok(kept.len())
    }

    /// Write the collected features to the output file
    pub fn checkpoint(&mut self) -> SlicerResult<()> {
        write_collection(&self.collection, &self.options.output)?;
        self.pending = false;
        self.stats.checkpoints += 1;
        debug!("Checkpoint {}: {} features in {}",
               self.stats.checkpoints, self.collection.len(), self.options.output.display());
        Ok(())
    }
}
