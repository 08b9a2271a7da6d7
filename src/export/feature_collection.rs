//! GeoJSON feature collections of detections

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coordinate::Point;
use crate::detection::GeoDetection;

/// A polygon ring as a list of `[x, y]` positions
pub type Ring = Vec<Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// Feature geometry
///
/// Detections are always written as polygons. Multipolygons are accepted
/// when reading shapes from other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Exterior rings, one per polygon
    pub fn exterior_rings(&self) -> Vec<Vec<Point>> {
        let to_points = |ring: &Ring| -> Vec<Point> {
            ring.iter()
                .filter(|position| position.len() >= 2)
                .map(|position| Point::new(position[0], position[1]))
                .collect()
        };

        match self {
            Geometry::Polygon(rings) => rings.first().map(to_points).into_iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons.iter()
                .filter_map(|rings| rings.first())
                .map(to_points)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Properties written by other tools, kept in key order
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    /// Polygon feature for a projected detection
    ///
    /// The ring runs top-left, top-right, bottom-right, bottom-left and is
    /// closed by repeating the top-left vertex.
    pub fn from_detection(detection: &GeoDetection) -> Self {
        let corners = detection.geo_box.ring();
        let mut ring: Ring = corners.iter().map(|corner| corner.to_array().to_vec()).collect();
        ring.push(corners[0].to_array().to_vec());

        Feature {
            kind: FeatureType::Feature,
            geometry: Geometry::Polygon(vec![ring]),
            properties: Properties {
                label: detection.label.clone(),
                score: detection.score,
                extra: BTreeMap::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: CollectionType,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        FeatureCollection::default()
    }

    pub fn push_detection(&mut self, detection: &GeoDetection) {
        self.features.push(Feature::from_detection(detection));
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::GeoBox;
    use serde_json::json;

    fn detection(score: Option<f64>) -> GeoDetection {
        GeoDetection {
            label: "boat".to_string(),
            score,
            geo_box: GeoBox::new(10.0, 20.0, 12.5, 18.0),
        }
    }

    #[test]
    fn test_feature_layout() {
        let mut collection = FeatureCollection::new();
        collection.push_detection(&detection(Some(0.25)));

        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value, json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[10.0, 20.0], [12.5, 20.0], [12.5, 18.0], [10.0, 18.0], [10.0, 20.0]]]
                },
                "properties": {"label": "boat", "score": 0.25}
            }]
        }));
    }

    #[test]
    fn test_unscored_detection_omits_score() {
        let feature = Feature::from_detection(&detection(None));
        let text = serde_json::to_string(&feature).unwrap();
        assert!(!text.contains("score"));
    }

    #[test]
    fn test_reads_foreign_collections() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [[[1.0, 2.0, 0.0], [3.0, 4.0, 0.0]]]},
                    "properties": {"label": "car", "id": 7}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "MultiPolygon", "coordinates": [[[[0.0, 0.0]]], [[[5.0, 5.0], [6.0, 6.0]]]]},
                    "properties": {}
                }
            ]
        })).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].properties.extra["id"], json!(7));
        assert_eq!(
            collection.features[0].geometry.exterior_rings(),
            vec![vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]]
        );
        assert_eq!(collection.features[1].geometry.exterior_rings().len(), 2);
        assert_eq!(collection.features[1].properties.label, "");
    }
}
