//! Pixel data of one window and its conversion to an 8-bit image

use image::{DynamicImage, GrayImage, RgbImage};

use crate::errors::{SlicerError, SlicerResult};
use crate::tiler::Window;

/// Bands read for one window, each row-major
#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    window: Window,
    bands: Vec<Vec<f32>>,
}

impl WindowData {
    /// Wrap band buffers read for `window`
    ///
    /// Every band must hold exactly `width * height` values.
    pub fn new(window: Window, bands: Vec<Vec<f32>>) -> SlicerResult<Self> {
        let expected = window.area() as usize;
        if let Some(band) = bands.iter().position(|values| values.len() != expected) {
            return Err(SlicerError::FormatError(format!(
                "Band {} holds {} values, window {}x{} needs {}",
                band, bands[band].len(), window.width, window.height, expected
            )));
        }

        Ok(WindowData { window, bands })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn width(&self) -> u32 {
        self.window.width
    }

    pub fn height(&self) -> u32 {
        self.window.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&[f32]> {
        self.bands.get(index).map(|values| values.as_slice())
    }

    /// Value at window-local `(x, y)`
    pub fn value(&self, band: usize, x: u32, y: u32) -> Option<f32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.band(band).map(|values| values[(y * self.width() + x) as usize])
    }

    /// Convert to an 8-bit image
    ///
    /// Values are rounded and clamped to `0..=255` without rescaling; NaN
    /// becomes 0. Three or more bands give RGB from bands 0-2, fewer give
    /// greyscale from band 0.
    pub fn to_image(&self) -> SlicerResult<DynamicImage> {
        let (width, height) = (self.width(), self.height());

        match self.bands.as_slice() {
            [red, green, blue, ..] => {
                let mut pixels = Vec::with_capacity(red.len() * 3);
                for ((r, g), b) in red.iter().zip(green).zip(blue) {
                    pixels.extend_from_slice(&[to_byte(*r), to_byte(*g), to_byte(*b)]);
                }
                RgbImage::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| SlicerError::EncodeError("RGB buffer size mismatch".to_string()))
            },
            [grey, ..] => {
                let pixels = grey.iter().map(|value| to_byte(*value)).collect();
                GrayImage::from_raw(width, height, pixels)
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| SlicerError::EncodeError("Greyscale buffer size mismatch".to_string()))
            },
            [] => Err(SlicerError::EncodeError("Window has no bands".to_string())),
        }
    }
}

fn to_byte(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}
