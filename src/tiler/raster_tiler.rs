//! Overlapping window generation over a raster grid

use log::{debug, trace};

use super::scan::ScanParameters;
use super::window::Window;
use crate::errors::SlicerResult;
use crate::raster::{RasterSource, WindowData};

/// One position of the tiling grid and the window read for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStep {
    /// Grid column index
    pub column: u32,
    /// Grid row index
    pub row: u32,
    /// Clipped pixel window for this position
    pub window: Window,
}

/// Driver walking the tiling grid row by row
///
/// The tiler holds its position and step counter as plain fields and is
/// advanced with [`next_step`](Self::next_step), so a run can be inspected,
/// stopped and restarted from any grid position. Windows overlap their
/// neighbours by `overlap` pixels on every interior edge and are clipped to
/// the raster.
#[derive(Debug, Clone)]
pub struct RasterTiler {
    params: ScanParameters,
    raster_width: u32,
    raster_height: u32,
    end_column: u32,
    end_row: u32,
    column: u32,
    row: u32,
    steps: u64,
}

impl RasterTiler {
    /// Create a tiler for a `raster_width x raster_height` raster
    ///
    /// # Arguments
    /// * `params` - Tile geometry and grid range, validated here
    /// * `raster_width`, `raster_height` - Raster size in pixels
    ///
    /// # Returns
    /// The tiler positioned at the start of the range, or
    /// `InvalidParameters` when the geometry is rejected
    pub fn new(params: ScanParameters, raster_width: u32, raster_height: u32) -> SlicerResult<Self> {
        params.validate()?;

        let columns = raster_width.div_ceil(params.slice_size);
        let rows = raster_height.div_ceil(params.slice_size);

        let end_column = match params.max_columns {
            Some(count) => columns.min(params.start_column.saturating_add(count)),
            None => columns,
        };
        let end_row = match params.max_rows {
            Some(count) => rows.min(params.start_row.saturating_add(count)),
            None => rows,
        };

        debug!("Tiling {}x{} raster into a {}x{} grid, range columns {}..{} rows {}..{}",
               raster_width, raster_height, columns, rows,
               params.start_column, end_column, params.start_row, end_row);

        Ok(RasterTiler {
            params,
            raster_width,
            raster_height,
            end_column,
            end_row,
            column: params.start_column,
            row: params.start_row,
            steps: 0,
        })
    }

    /// Create a tiler sized to a raster source
    pub fn for_source<S: RasterSource + ?Sized>(params: ScanParameters, source: &S) -> SlicerResult<Self> {
        let info = source.info();
        RasterTiler::new(params, info.width, info.height)
    }

    pub fn params(&self) -> &ScanParameters {
        &self.params
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of steps a full run over the configured range takes
    pub fn total_steps(&self) -> u64 {
        let columns = self.end_column.saturating_sub(self.params.start_column) as u64;
        let rows = self.end_row.saturating_sub(self.params.start_row) as u64;
        columns * rows
    }

    /// Whether every position of the range has been visited
    pub fn is_finished(&self) -> bool {
        self.row >= self.end_row || self.params.start_column >= self.end_column
    }

    /// Grid `(column, row)` the next step will visit, `None` once finished
    ///
    /// Rows of the range always start at `start_column`, so a restarted run
    /// resumes mid-row by first finishing this row with the same column
    /// range.
    pub fn resume_position(&self) -> Option<(u32, u32)> {
        if self.is_finished() {
            None
        } else {
            Some((self.column, self.row))
        }
    }

    /// Clipped window for a grid position
    ///
    /// The first column and row have overlap on their inner edge only;
    /// every other position extends by `overlap` on both sides before
    /// clipping to the raster.
    pub fn window_at(&self, column: u32, row: u32) -> Window {
        let (x, width) = self.span(column, self.raster_width);
        let (y, height) = self.span(row, self.raster_height);
        Window::new(x, y, width, height)
    }

    fn span(&self, index: u32, limit: u32) -> (u32, u32) {
        let slice = self.params.slice_size as u64;
        let overlap = self.params.overlap as u64;

        let start = (index as u64 * slice).saturating_sub(overlap);
        let margin = if index == 0 { 1 } else { 2 };
        let length = (slice + margin * overlap).min((limit as u64).saturating_sub(start));

        (start as u32, length as u32)
    }

    /// Advance the state machine by one grid position
    pub fn next_step(&mut self) -> Option<TileStep> {
        if self.is_finished() {
            return None;
        }

        let step = TileStep {
            column: self.column,
            row: self.row,
            window: self.window_at(self.column, self.row),
        };

        self.steps += 1;
        self.column += 1;
        if self.column >= self.end_column {
            self.column = self.params.start_column;
            self.row += 1;
        }

        trace!("Step {}: column {} row {} -> {:?}", self.steps, step.column, step.row, step.window);
        Some(step)
    }

    /// Drive the remaining steps over a raster source
    ///
    /// Each window is read from `source` and handed to `callback` together
    /// with its step. The tiler keeps nothing; an error from the read or the
    /// callback stops the run and leaves the tiler at the following position.
    ///
    /// # Returns
    /// The number of steps driven by this call
    pub fn run<S, F>(&mut self, source: &S, mut callback: F) -> SlicerResult<u64>
    where
        S: RasterSource + ?Sized,
        F: FnMut(WindowData, &TileStep) -> SlicerResult<()>,
    {
        let mut driven = 0;

        while let Some(step) = self.next_step() {
            let data = source.read_window(&step.window)?;
            callback(data, &step)?;
            driven += 1;
        }

        Ok(driven)
    }
}

impl Iterator for RasterTiler {
    type Item = TileStep;

    fn next(&mut self) -> Option<TileStep> {
        self.next_step()
    }
}
