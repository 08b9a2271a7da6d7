//! Per-cell rendering and per-item cropping of grid items

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::grid::GridItem;
use crate::tiler::Window;

/// Outline colour of rendered boxes
pub const BOX_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

/// Keep an outline coordinate inside `0..=limit`
///
/// Coordinates that would push a `thickness` wide line off the image are
/// pulled back by the thickness.
pub fn clamp_inside(value: i64, limit: i64, thickness: i64) -> i64 {
    if value + thickness < 0 {
        thickness
    } else if value + thickness > limit {
        limit - thickness
    } else {
        value
    }
}

/// Draws the boxes of one grid cell onto the cell's image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRenderer {
    pub padding: f64,
    pub thickness: u32,
}

impl CellRenderer {
    pub fn new(padding: f64, thickness: u32) -> Self {
        CellRenderer { padding, thickness }
    }

    /// Outline every item on `image`, which shows the raster pixels of `window`
    ///
    /// # Returns
    /// The number of boxes drawn; boxes collapsing to nothing are skipped
    pub fn draw(&self, image: &mut RgbImage, window: &Window, items: &[GridItem]) -> usize {
        let (width, height) = (image.width() as i64, image.height() as i64);
        let thickness = self.thickness.max(1) as i64;
        let mut drawn = 0;

        for item in items {
            let local = item.pixel_box.padded(self.padding);
            let x0 = clamp_inside(local.xmin.floor() as i64 - window.x as i64, width, thickness);
            let y0 = clamp_inside(local.ymin.floor() as i64 - window.y as i64, height, thickness);
            let x1 = clamp_inside(local.xmax.ceil() as i64 - window.x as i64, width, thickness);
            let y1 = clamp_inside(local.ymax.ceil() as i64 - window.y as i64, height, thickness);

            if x1 <= x0 || y1 <= y0 {
                continue;
            }

            // Nested outlines, growing inwards
            for inset in 0..thickness {
                let (w, h) = (x1 - x0 - 2 * inset, y1 - y0 - 2 * inset);
                if w <= 0 || h <= 0 {
                    break;
                }
                let rect = Rect::at((x0 + inset) as i32, (y0 + inset) as i32).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(image, rect, BOX_COLOUR);
            }
            drawn += 1;
        }

        drawn
    }
}

/// Raster window of one item grown by `padding`, clipped to the raster
pub fn item_window(item: &GridItem, padding: f64, raster_width: u32, raster_height: u32) -> Option<Window> {
    item.pixel_box.padded(padding).to_window(raster_width, raster_height)
}

/// File name of an exported item crop, prefixed with its score in percent
pub fn annotation_file_name(item: &GridItem, sequence: usize, extension: &str) -> String {
    let score = match item.score {
        Some(score) => format!("{}", (score * 100.0).trunc() as i64),
        None => "na".to_string(),
    };
    format!("{} annotation-{}.{}", score, sequence, extension)
}
