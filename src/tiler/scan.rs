//! Scan parameters shared by every tiling run

use serde::Deserialize;

use crate::errors::{SlicerError, SlicerResult};

/// Default tile edge length in pixels
pub const DEFAULT_SLICE_SIZE: u32 = 500;

/// Default overlap between neighbouring tiles in pixels
pub const DEFAULT_OVERLAP: u32 = 50;

/// Geometry and range of a tiling run
///
/// `start_column`/`start_row` are grid indices (in units of `slice_size`),
/// `max_columns`/`max_rows` count grid positions from the start position,
/// which lets a run cover any rectangular sub-range of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanParameters {
    pub slice_size: u32,
    pub overlap: u32,
    pub start_column: u32,
    pub start_row: u32,
    pub max_columns: Option<u32>,
    pub max_rows: Option<u32>,
}

impl Default for ScanParameters {
    fn default() -> Self {
        ScanParameters {
            slice_size: DEFAULT_SLICE_SIZE,
            overlap: DEFAULT_OVERLAP,
            start_column: 0,
            start_row: 0,
            max_columns: None,
            max_rows: None,
        }
    }
}

impl ScanParameters {
    /// Parameters for a full scan with the given geometry
    pub fn new(slice_size: u32, overlap: u32) -> Self {
        ScanParameters {
            slice_size,
            overlap,
            ..ScanParameters::default()
        }
    }

    /// Restrict the scan to a sub-range of the grid
    ///
    /// # Arguments
    /// * `start_column`, `start_row` - First grid position to visit
    /// * `max_columns`, `max_rows` - Number of positions to visit from the start
    pub fn with_range(mut self, start_column: u32, start_row: u32,
                      max_columns: Option<u32>, max_rows: Option<u32>) -> Self {
        self.start_column = start_column;
        self.start_row = start_row;
        self.max_columns = max_columns;
        self.max_rows = max_rows;
        self
    }

    /// Parse a range of the form `column,row,rows,columns`
    ///
    /// A count of `0` leaves that axis unbounded.
    pub fn parse_range(self, range: &str) -> SlicerResult<Self> {
        let values = range.split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SlicerError::InvalidParameters(format!("Invalid range '{}': {}", range, e)))?;

        if values.len() != 4 {
            return Err(SlicerError::InvalidParameters(format!(
                "Range '{}' must have 4 comma-separated values: column,row,rows,columns", range
            )));
        }

        let bounded = |count: u32| if count == 0 { None } else { Some(count) };
        Ok(self.with_range(values[0], values[1], bounded(values[3]), bounded(values[2])))
    }

    /// Reject geometry the tiler cannot step through
    pub fn validate(&self) -> SlicerResult<()> {
        if self.slice_size == 0 {
            return Err(SlicerError::InvalidParameters(
                "slice size must be greater than zero".to_string()
            ));
        }

        if self.overlap >= self.slice_size {
            return Err(SlicerError::InvalidParameters(format!(
                "overlap {} must be smaller than the slice size {}", self.overlap, self.slice_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ScanParameters::default().validate().is_ok());
        assert!(ScanParameters::new(0, 0).validate().is_err());
        assert!(ScanParameters::new(100, 100).validate().is_err());
        assert!(ScanParameters::new(100, 99).validate().is_ok());
    }

    #[test]
    fn test_parse_range() {
        let params = ScanParameters::default().parse_range("2, 3, 4, 0").unwrap();
        assert_eq!(params.start_column, 2);
        assert_eq!(params.start_row, 3);
        assert_eq!(params.max_rows, Some(4));
        assert_eq!(params.max_columns, None);

        assert!(ScanParameters::default().parse_range("1,2,3").is_err());
        assert!(ScanParameters::default().parse_range("1,2,-3,4").is_err());
    }
}
