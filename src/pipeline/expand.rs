//! Re-rendering exported detections from the source raster

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::{debug, info, warn};

use super::options::{ExpandMode, ExpandOptions};
use crate::aggregate::{annotation_file_name, item_window, CellRenderer, DetectionGrid, GridItem};
use crate::cache::AuxMetadata;
use crate::coordinate::{CoordinateMapper, SpatialReference};
use crate::errors::{SlicerError, SlicerResult};
use crate::export::{read_collection, FeatureCollection};
use crate::raster::{GeoTiffSource, RasterSource};
use crate::tiler::Window;

/// Counters of one expand run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandStats {
    /// Polygons converted to pixel boxes
    pub items: u64,
    /// Occupied grid cells
    pub cells: u64,
    /// Images written
    pub images: u64,
    /// Polygons or crops that produced no image
    pub skipped: u64,
}

impl fmt::Display for ExpandStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} items in {} cells, {} images, {} skipped",
               self.items, self.cells, self.images, self.skipped)
    }
}

/// Turns a feature collection back into images cut from the raster
///
/// Polygons are bucketed by grid cell. In cell mode every occupied cell is
/// rendered once with all its boxes outlined; in item mode each box is
/// cropped on its own. Images are written in first-seen cell order.
#[derive(Debug, Clone)]
pub struct ExpandPipeline {
    options: ExpandOptions,
}

impl ExpandPipeline {
    pub fn new(options: ExpandOptions) -> SlicerResult<Self> {
        options.validate()?;
        Ok(ExpandPipeline { options })
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Open the configured raster and feature collection and expand them
    pub fn run_file(&self) -> SlicerResult<ExpandStats> {
        let source = GeoTiffSource::open(&self.options.tif)?;
        let collection = read_collection(&self.options.geojson)?;
        info!("Expanding {} features of {} over {}",
              collection.len(), self.options.geojson.display(), self.options.tif.display());
        self.run(&source, &collection)
    }

    /// Bucket the exterior ring of every polygon as a pixel box
    ///
    /// # Returns
    /// The grid and the number of rings without vertices
    pub fn build_grid(&self, mapper: &CoordinateMapper, collection: &FeatureCollection)
                      -> SlicerResult<(DetectionGrid<GridItem>, u64)> {
        let mut grid = DetectionGrid::new(self.options.cell_size)?;
        let mut skipped = 0;

        for feature in &collection.features {
            for ring in feature.geometry.exterior_rings() {
                match mapper.geo_shape_to_pixel_box(&ring) {
                    Some(pixel_box) => {
                        grid.insert(GridItem {
                            pixel_box,
                            label: feature.properties.label.clone(),
                            score: feature.properties.score,
                        });
                    },
                    None => skipped += 1,
                }
            }
        }

        Ok((grid, skipped))
    }

    pub fn run<S: RasterSource + ?Sized>(&self, source: &S, collection: &FeatureCollection) -> SlicerResult<ExpandStats> {
        let info = source.info();
        let mapper = info.mapper()?;
        let (grid, skipped) = self.build_grid(&mapper, collection)?;

        let mut stats = ExpandStats {
            items: grid.item_count() as u64,
            cells: grid.cell_count() as u64,
            skipped,
            ..ExpandStats::default()
        };

        fs::create_dir_all(&self.options.output)?;
        match self.options.mode {
            ExpandMode::Cells => self.render_cells(source, &mapper, &grid, &mut stats)?,
            ExpandMode::Items => self.export_items(source, &mapper, &grid, &mut stats)?,
        }

        info!("Expanded: {}", stats);
        Ok(stats)
    }

    fn render_cells<S: RasterSource + ?Sized>(&self, source: &S, mapper: &CoordinateMapper,
                                             grid: &DetectionGrid<GridItem>, stats: &mut ExpandStats) -> SlicerResult<()> {
        let info = source.info();
        let renderer = CellRenderer::new(self.options.padding, self.options.thickness);

        for (cell, items) in grid.cells() {
            let window = match cell.window(grid.cell_size(), info.width, info.height) {
                Some(window) => window,
                None => {
                    warn!("Cell {}x{} lies outside the raster, {} boxes dropped", cell.column, cell.row, items.len());
                    stats.skipped += items.len() as u64;
                    continue;
                },
            };

            let mut image = source.read_window(&window)?.to_image()?.to_rgb8();
            let drawn = renderer.draw(&mut image, &window, items);

            let path = self.options.output.join(format!("result-{}.png", stats.images));
            let saved = image.save_with_format(&path, ImageFormat::Png)
                .map_err(SlicerError::from)
                .and_then(|_| self.write_metadata(mapper, &window, info.spatial_ref.clone(), &path));

            match saved {
                Ok(()) => {
                    debug!("Cell {}x{}: {} boxes drawn into {}", cell.column, cell.row, drawn, path.display());
                    stats.images += 1;
                },
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping cell {}x{}: {}", cell.column, cell.row, e);
                    stats.skipped += items.len() as u64;
                },
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    fn export_items<S: RasterSource + ?Sized>(&self, source: &S, mapper: &CoordinateMapper,
                                             grid: &DetectionGrid<GridItem>, stats: &mut ExpandStats) -> SlicerResult<()> {
        let info = source.info();

        for (sequence, item) in grid.items().enumerate() {
            let window = match item_window(item, self.options.padding, info.width, info.height) {
                Some(window) => window,
                None => {
                    warn!("Box {:?} of '{}' lies outside the raster", item.pixel_box, item.label);
                    stats.skipped += 1;
                    continue;
                },
            };

            let path = self.options.output.join(annotation_file_name(item, sequence, "png"));
            let saved = source.read_window(&window)?
                .to_image()
                .and_then(|image| image.save_with_format(&path, ImageFormat::Png).map_err(SlicerError::from))
                .and_then(|_| self.write_metadata(mapper, &window, info.spatial_ref.clone(), &path));

            match saved {
                Ok(()) => stats.images += 1,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping '{}': {}", item.label, e);
                    stats.skipped += 1;
                },
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    fn write_metadata(&self, mapper: &CoordinateMapper, window: &Window,
                      spatial_ref: SpatialReference, path: &Path) -> SlicerResult<()> {
        let window_mapper = mapper.window_mapper(window)?;
        let aux: PathBuf = AuxMetadata::new(spatial_ref, *window_mapper.geotransform()).write(path)?;
        debug!("Wrote {}", aux.display());
        Ok(())
    }
}
