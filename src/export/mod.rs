//! GeoJSON export of detections

mod feature_collection;
mod writer;

pub use self::feature_collection::{CollectionType, Feature, FeatureCollection, FeatureType, Geometry, Properties, Ring};
pub use self::writer::{read_collection, write_collection};
