//! Geographic extent of a raster or window

use super::geotransform::GeoTransform;
use super::point::Point;

/// Projected corners of a `width x height` pixel grid
///
/// The corner order is fixed and callers index into it:
///
/// | index | pixel corner        |
/// |-------|---------------------|
/// | 0     | `(0, 0)`            |
/// | 1     | `(0, height)`       |
/// | 2     | `(width, height)`   |
/// | 3     | `(width, 0)`        |
///
/// Read with the pixel Y axis pointing up, this is bottom-left, top-left,
/// top-right, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoExtent {
    pub corners: [Point; 4],
}

impl GeoExtent {
    /// Apply the geotransform to the four corners of a pixel grid
    pub fn from_transform(geotransform: &GeoTransform, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);

        GeoExtent {
            corners: [
                geotransform.apply(0.0, 0.0),
                geotransform.apply(0.0, h),
                geotransform.apply(w, h),
                geotransform.apply(w, 0.0),
            ],
        }
    }

    /// Corner at pixel `(0, 0)`
    pub fn at_origin(&self) -> Point {
        self.corners[0]
    }

    /// Corner at pixel `(0, height)`
    pub fn at_last_row(&self) -> Point {
        self.corners[1]
    }

    /// Corner at pixel `(width, height)`
    pub fn at_far_corner(&self) -> Point {
        self.corners[2]
    }

    /// Corner at pixel `(width, 0)`
    pub fn at_last_column(&self) -> Point {
        self.corners[3]
    }
}
