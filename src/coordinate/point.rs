//! Point structure for representing coordinates

/// A point in pixel or geographic space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (column, easting or longitude)
    pub x: f64,
    /// Y coordinate (row, northing or latitude)
    pub y: f64,
}

impl Point {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Point as a `[x, y]` pair, the layout used by GeoJSON positions
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Point::new(value[0], value[1])
    }
}
