//! Bucketing of pixel boxes into a coarse grid

use std::collections::HashMap;

use crate::coordinate::{PixelBox, Point};
use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::Window;

/// Index of one grid cell, `floor(coordinate / cell_size)` per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub column: i64,
    pub row: i64,
}

impl GridCell {
    pub fn new(column: i64, row: i64) -> Self {
        GridCell { column, row }
    }

    /// Cell containing the pixel coordinate `(x, y)`
    pub fn containing(x: f64, y: f64, cell_size: u32) -> Self {
        let size = cell_size as f64;
        GridCell::new((x / size).floor() as i64, (y / size).floor() as i64)
    }

    /// Pixel window of the cell, clipped to a `width x height` raster
    ///
    /// `None` when the cell lies entirely outside the raster.
    pub fn window(&self, cell_size: u32, raster_width: u32, raster_height: u32) -> Option<Window> {
        let size = cell_size as f64;
        PixelBox::from_xywh(self.column as f64 * size, self.row as f64 * size, size, size)
            .to_window(raster_width, raster_height)
    }
}

/// Something that can be placed in the grid by one representative point
pub trait Anchored {
    fn anchor(&self) -> Point;
}

/// A labelled pixel box, the unit of rendering and export
#[derive(Debug, Clone, PartialEq)]
pub struct GridItem {
    pub pixel_box: PixelBox,
    pub label: String,
    pub score: Option<f64>,
}

impl Anchored for GridItem {
    /// Minimum corner, so straddling boxes land in a consistent cell
    fn anchor(&self) -> Point {
        Point::new(self.pixel_box.xmin, self.pixel_box.ymin)
    }
}

/// Items grouped by grid cell
///
/// Cells iterate in the order their first item was inserted and items keep
/// their insertion order within a cell, so identical input always yields
/// identical output.
#[derive(Debug, Clone)]
pub struct DetectionGrid<T = GridItem> {
    cell_size: u32,
    index: HashMap<GridCell, usize>,
    cells: Vec<(GridCell, Vec<T>)>,
}

impl<T: Anchored> DetectionGrid<T> {
    pub fn new(cell_size: u32) -> SlicerResult<Self> {
        if cell_size == 0 {
            return Err(SlicerError::InvalidParameters("cell size must be positive".to_string()));
        }

        Ok(DetectionGrid {
            cell_size,
            index: HashMap::new(),
            cells: Vec::new(),
        })
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Add an item to the cell of its anchor
    ///
    /// # Returns
    /// The cell the item was placed in
    pub fn insert(&mut self, item: T) -> GridCell {
        let anchor = item.anchor();
        let cell = GridCell::containing(anchor.x, anchor.y, self.cell_size);

        let position = match self.index.get(&cell) {
            Some(&position) => position,
            None => {
                self.cells.push((cell, Vec::new()));
                self.index.insert(cell, self.cells.len() - 1);
                self.cells.len() - 1
            },
        };

        self.cells[position].1.push(item);
        cell
    }

    /// Items of one cell, `None` for an unoccupied cell
    pub fn cell(&self, cell: &GridCell) -> Option<&[T]> {
        self.index.get(cell).map(|&position| self.cells[position].1.as_slice())
    }

    /// Occupied cells in first-seen order
    pub fn cells(&self) -> impl Iterator<Item = (&GridCell, &[T])> {
        self.cells.iter().map(|(cell, items)| (cell, items.as_slice()))
    }

    /// Every item, cell by cell
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.cells.iter().flat_map(|(_, items)| items.iter())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn item_count(&self) -> usize {
        self.cells.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<T: Anchored> Extend<T> for DetectionGrid<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.insert(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label: &str, xmin: f64, ymin: f64) -> GridItem {
        GridItem {
            pixel_box: PixelBox::new(xmin, ymin, xmin + 20.0, ymin + 20.0),
            label: label.to_string(),
            score: None,
        }
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(GridCell::containing(0.0, 499.9, 500), GridCell::new(0, 0));
        assert_eq!(GridCell::containing(500.0, 1000.0, 500), GridCell::new(1, 2));
        assert_eq!(GridCell::containing(-0.5, 10.0, 500), GridCell::new(-1, 0));
    }

    #[test]
    fn test_straddling_box_uses_minimum_corner() {
        let mut grid = DetectionGrid::new(500).unwrap();
        assert_eq!(grid.insert(item("edge", 490.0, 10.0)), GridCell::new(0, 0));
    }

    #[test]
    fn test_first_seen_cell_order() {
        let mut grid = DetectionGrid::new(500).unwrap();
        grid.extend(vec![
            item("a", 700.0, 10.0),
            item("b", 10.0, 10.0),
            item("c", 650.0, 300.0),
            item("d", 10.0, 900.0),
        ]);

        let order: Vec<(GridCell, Vec<&str>)> = grid.cells()
            .map(|(cell, items)| (*cell, items.iter().map(|i| i.label.as_str()).collect()))
            .collect();
        assert_eq!(order, vec![
            (GridCell::new(1, 0), vec!["a", "c"]),
            (GridCell::new(0, 0), vec!["b"]),
            (GridCell::new(0, 1), vec!["d"]),
        ]);
        assert_eq!(grid.item_count(), 4);
        assert!(grid.cell(&GridCell::new(5, 5)).is_none());
    }

    #[test]
    fn test_cell_window_is_clipped() {
        assert_eq!(GridCell::new(1, 1).window(500, 800, 1200), Some(Window::new(500, 500, 300, 500)));
        assert_eq!(GridCell::new(2, 0).window(500, 800, 1200), None);
        assert!(DetectionGrid::<GridItem>::new(0).is_err());
    }
}
