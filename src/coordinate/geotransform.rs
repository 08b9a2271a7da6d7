//! Affine geotransform of a raster

use super::point::Point;

/// Affine transform mapping pixel `(col, row)` to geographic `(x, y)`
///
/// Coefficients follow the GDAL order:
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * column_rotation + row * pixel_height
/// ```
/// `pixel_height` is negative for the usual north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a north-up transform without rotation terms
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            column_rotation: 0.0,
            pixel_height,
        }
    }

    /// Create from the six GDAL-ordered coefficients
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        GeoTransform {
            origin_x: coefficients[0],
            pixel_width: coefficients[1],
            row_rotation: coefficients[2],
            origin_y: coefficients[3],
            column_rotation: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// The six coefficients in GDAL order
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    /// The same transform anchored at a different origin
    pub fn with_origin(&self, origin: Point) -> Self {
        GeoTransform {
            origin_x: origin.x,
            origin_y: origin.y,
            ..*self
        }
    }

    /// Project a (possibly fractional) pixel position to geographic space
    pub fn apply(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.column_rotation + row * self.pixel_height,
        )
    }

}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::north_up(0.0, 0.0, 1.0, 1.0)
    }
}
