//! Conversion between pixel boxes and geographic boxes
//!
//! A [`CoordinateMapper`] is bound to one geotransform and one raster size,
//! so every conversion made through it uses the transform the raster was
//! opened with. Window-local coordinates get their own mapper through
//! [`CoordinateMapper::window_mapper`].

use log::debug;

use super::bbox::{GeoBox, PixelBox};
use super::crs::SpatialReference;
use super::extent::GeoExtent;
use super::geotransform::GeoTransform;
use super::point::Point;
use super::transform::CoordinateTransformer;
use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::Window;

/// Maps boxes between pixel space and geographic space for one raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    geotransform: GeoTransform,
    width: u32,
    height: u32,
    extent: GeoExtent,
    /// Geographic length of the pixel X axis across the whole grid
    x_span: f64,
    /// Geographic length of the pixel Y axis across the whole grid, upward
    y_span: f64,
}

impl CoordinateMapper {
    /// Create a mapper for a `width x height` raster
    ///
    /// # Arguments
    /// * `geotransform` - Affine transform of the raster
    /// * `width` - Raster width in pixels
    /// * `height` - Raster height in pixels
    ///
    /// # Returns
    /// The mapper, or `DegenerateTransform` when the raster has no size or
    /// the transform collapses one of the axes
    pub fn new(geotransform: GeoTransform, width: u32, height: u32) -> SlicerResult<Self> {
        if width == 0 || height == 0 {
            return Err(SlicerError::DegenerateTransform(format!(
                "raster size {}x{} has no area", width, height
            )));
        }

        let extent = GeoExtent::from_transform(&geotransform, width, height);
        let x_span = extent.at_far_corner().x - extent.at_last_row().x;
        let y_span = extent.at_last_column().y - extent.at_far_corner().y;

        if x_span == 0.0 || y_span == 0.0 || !x_span.is_finite() || !y_span.is_finite() {
            return Err(SlicerError::DegenerateTransform(format!(
                "transform {:?} collapses the raster extent", geotransform.to_gdal()
            )));
        }

        Ok(CoordinateMapper {
            geotransform,
            width,
            height,
            extent,
            x_span,
            y_span,
        })
    }

    pub fn geotransform(&self) -> &GeoTransform {
        &self.geotransform
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Projected corners of the raster, in the order documented on [`GeoExtent`]
    pub fn extent(&self) -> GeoExtent {
        self.extent
    }

    /// Project a pixel box to geographic space
    ///
    /// Each edge is interpolated between the extent corners in proportion to
    /// `x / width` and `y / height`. Pixel Y grows downwards while the
    /// geographic Y of a north-up raster grows upwards, so the Y offset is
    /// subtracted from the origin.
    ///
    /// # Arguments
    /// * `x`, `y` - Top-left corner of the box in pixels
    /// * `width`, `height` - Size of the box in pixels
    pub fn pixel_box_to_geo_box(&self, x: f64, y: f64, width: f64, height: f64) -> GeoBox {
        let origin = self.extent.at_origin();
        let cols = self.width as f64;
        let rows = self.height as f64;

        GeoBox::new(
            origin.x + (x / cols) * self.x_span,
            origin.y - (y / rows) * self.y_span,
            origin.x + ((x + width) / cols) * self.x_span,
            origin.y - ((y + height) / rows) * self.y_span,
        )
    }

    /// Project a geographic position to fractional pixel coordinates
    ///
    /// The exact inverse of the interpolation used by
    /// [`pixel_box_to_geo_box`](Self::pixel_box_to_geo_box).
    pub fn geo_to_pixel(&self, point: &Point) -> Point {
        let origin = self.extent.at_origin();

        Point::new(
            (point.x - origin.x) / self.x_span * self.width as f64,
            (origin.y - point.y) / self.y_span * self.height as f64,
        )
    }

    /// Bounding pixel box of a geographic shape
    ///
    /// Every vertex is projected to pixel space and the min/max over all
    /// vertices is taken. A single vertex gives a zero-area box; a shape
    /// without vertices gives `None`.
    pub fn geo_shape_to_pixel_box(&self, vertices: &[Point]) -> Option<PixelBox> {
        let projected: Vec<Point> = vertices.iter()
            .map(|vertex| self.geo_to_pixel(vertex))
            .collect();

        PixelBox::enclosing(&projected)
    }

    /// Mapper for the window-local pixel space of `window`
    ///
    /// The window keeps the raster's pixel size and rotation; only the
    /// origin moves to the projection of the window's top-left pixel.
    pub fn window_mapper(&self, window: &Window) -> SlicerResult<CoordinateMapper> {
        let geo_box = self.pixel_box_to_geo_box(
            window.x as f64,
            window.y as f64,
            window.width as f64,
            window.height as f64,
        );

        CoordinateMapper::new(
            self.geotransform.with_origin(geo_box.top_left()),
            window.width,
            window.height,
        )
    }

    /// Longitude/latitude of the raster's pixel `(0, 0)` origin
    ///
    /// Used for diagnostics only; callers log a failure and carry on.
    pub fn origin_lat_lon(&self, spatial_ref: &SpatialReference) -> SlicerResult<Point> {
        let crs = spatial_ref.coordinate_system()?;
        let origin = Point::new(self.geotransform.origin_x, self.geotransform.origin_y);

        debug!("Transforming origin ({}, {}) from {}", origin.x, origin.y, crs.description());
        CoordinateTransformer.to_geographic(&origin, &crs)
    }
}
