//! Detections in window pixel space and in geographic space
//!
//! The two forms are separate types. The only way from pixels to
//! geography is [`PixelDetection::project`]; a [`GeoDetection`] cannot be
//! projected again.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::coordinate::{CoordinateMapper, GeoBox, PixelBox};

/// A detection as emitted by a detector, in window-local pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelDetection {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl PixelDetection {
    pub fn new(label: &str, score: Option<f64>, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        PixelDetection {
            label: label.to_string(),
            score,
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn pixel_box(&self) -> PixelBox {
        PixelBox::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }

    /// Project into geographic space
    ///
    /// `mapper` must be the mapper of the window the detection was found
    /// in, see [`CoordinateMapper::window_mapper`].
    pub fn project(&self, mapper: &CoordinateMapper) -> GeoDetection {
        GeoDetection {
            label: self.label.clone(),
            score: self.score,
            geo_box: mapper.pixel_box_to_geo_box(
                self.xmin,
                self.ymin,
                self.xmax - self.xmin,
                self.ymax - self.ymin,
            ),
        }
    }
}

/// A detection placed in the raster's geographic space
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDetection {
    pub label: String,
    pub score: Option<f64>,
    pub geo_box: GeoBox,
}

/// Drops detections scoring below a named threshold
///
/// Unscored detections always pass. Without a threshold every detection
/// passes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreFilter {
    pub score_threshold: Option<f64>,
}

impl ScoreFilter {
    pub fn new(score_threshold: Option<f64>) -> Self {
        ScoreFilter { score_threshold }
    }

    /// Filter that only drops negative scores
    pub fn ignore_negative() -> Self {
        ScoreFilter::new(Some(0.0))
    }

    pub fn accepts(&self, detection: &PixelDetection) -> bool {
        match (self.score_threshold, detection.score) {
            (Some(threshold), Some(score)) => score >= threshold,
            _ => true,
        }
    }

    /// Keep the accepted detections, logging the dropped ones
    pub fn apply(&self, detections: Vec<PixelDetection>) -> Vec<PixelDetection> {
        detections.into_iter()
            .filter(|detection| {
                let accepted = self.accepts(detection);
                if !accepted {
                    debug!("Dropping '{}' with score {:?} below {:?}",
                           detection.label, detection.score, self.score_threshold);
                }
                accepted
            })
            .collect()
    }
}
