//! Window structure for a rectangular pixel area of a raster
//!
//! Coordinates are in pixels and follow the usual image convention where
//! `(0,0)` is the top-left corner. A window covers the half-open area
//! `[x, x + width) x [y, y + height)`.

/// Rectangular pixel area read from a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// X-coordinate of the top-left corner (pixels from left)
    pub x: u32,

    /// Y-coordinate of the top-left corner (pixels from top)
    pub y: u32,

    /// Width of the window in pixels
    pub width: u32,

    /// Height of the window in pixels
    pub height: u32,
}

impl Window {
    /// Create a new window
    ///
    /// # Arguments
    /// * `x` - X-coordinate of the top-left corner
    /// * `y` - Y-coordinate of the top-left corner
    /// * `width` - Width of the window in pixels
    /// * `height` - Height of the window in pixels
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Window { x, y, width, height }
    }

    /// Window covering a whole `width x height` raster
    pub fn full(width: u32, height: u32) -> Self {
        Window::new(0, 0, width, height)
    }

    /// X-coordinate immediately right of the window (exclusive)
    pub fn end_x(&self) -> u32 {
        self.x + self.width
    }

    /// Y-coordinate immediately below the window (exclusive)
    pub fn end_y(&self) -> u32 {
        self.y + self.height
    }

    /// Number of pixels covered
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the window lies fully inside a `width x height` raster
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        (self.x as u64 + self.width as u64) <= width as u64 &&
            (self.y as u64 + self.height as u64) <= height as u64
    }

}
