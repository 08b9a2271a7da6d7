//! Box structures for pixel and geographic regions

use super::point::Point;
use crate::tiler::Window;

/// A box projected into geographic space
///
/// The edges are named after the pixel box they came from: `top` is the
/// projection of the box's first pixel row, `left` of its first column.
/// For a north-up raster `top > bottom`; the `min_*`/`max_*` accessors give
/// the normalised extent either way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl GeoBox {
    /// Create a new geographic box from its projected edges
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        GeoBox { left, top, right, bottom }
    }

    pub fn min_x(&self) -> f64 {
        self.left.min(self.right)
    }

    pub fn max_x(&self) -> f64 {
        self.left.max(self.right)
    }

    pub fn min_y(&self) -> f64 {
        self.top.min(self.bottom)
    }

    pub fn max_y(&self) -> f64 {
        self.top.max(self.bottom)
    }

    /// Width of the box in geographic units
    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    /// Height of the box in geographic units
    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Corner projected from the box's top-left pixel
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Corners in ring order: top-left, top-right, bottom-right, bottom-left
    pub fn ring(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }
}

/// A box in pixel space, `[xmin, xmax) x [ymin, ymax)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl PixelBox {
    /// Create a new pixel box from its edges
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        PixelBox { xmin, ymin, xmax, ymax }
    }

    /// Create a pixel box from origin and size
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        PixelBox::new(x, y, x + width, y + height)
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut pixel_box = PixelBox::new(first.x, first.y, first.x, first.y);

        for point in &points[1..] {
            pixel_box.xmin = pixel_box.xmin.min(point.x);
            pixel_box.ymin = pixel_box.ymin.min(point.y);
            pixel_box.xmax = pixel_box.xmax.max(point.x);
            pixel_box.ymax = pixel_box.ymax.max(point.y);
        }

        Some(pixel_box)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Whether the box covers no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Grow the box by `padding` pixels on every side
    pub fn padded(&self, padding: f64) -> Self {
        PixelBox::new(
            self.xmin - padding,
            self.ymin - padding,
            self.xmax + padding,
            self.ymax + padding,
        )
    }

    /// Clip to a `width x height` raster and round outwards to whole pixels
    ///
    /// Returns `None` when nothing of the box is left inside the raster.
    pub fn to_window(&self, raster_width: u32, raster_height: u32) -> Option<Window> {
        let x0 = self.xmin.floor().max(0.0);
        let y0 = self.ymin.floor().max(0.0);
        let x1 = self.xmax.ceil().min(raster_width as f64);
        let y1 = self.ymax.ceil().min(raster_height as f64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Window::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}
