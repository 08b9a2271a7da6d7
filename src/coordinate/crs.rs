//! Coordinate Reference System handling

use std::fmt;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{SlicerError, SlicerResult};

lazy_static! {
    static ref EPSG_AUTHORITY: Regex =
        Regex::new(r#"(?:AUTHORITY|ID)\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("EPSG authority pattern is valid");
}

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { 'N' } else { 'S' };
                format!("UTM Zone {}{} (EPSG:{})", zone, hemisphere, self.epsg_code())
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }
}

/// Spatial reference attached to a raster
///
/// The tiling core treats this as opaque; it is only resolved when the
/// raster origin is reported in longitude/latitude, and when tiles are
/// written with their georeferencing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpatialReference {
    /// Identified by EPSG code
    Epsg(u32),
    /// Well-known text definition
    Wkt(String),
    /// No spatial reference available
    #[default]
    Unknown,
}

impl SpatialReference {
    /// Parse a spatial reference from "EPSG:xxxx", a bare code or WKT
    pub fn parse(definition: &str) -> Self {
        let trimmed = definition.trim();
        if trimmed.is_empty() {
            return SpatialReference::Unknown;
        }

        let upper = trimmed.to_uppercase();
        if let Some(code) = upper.strip_prefix("EPSG:") {
            if let Ok(epsg) = code.trim().parse::<u32>() {
                return SpatialReference::Epsg(epsg);
            }
        } else if let Ok(epsg) = upper.parse::<u32>() {
            return SpatialReference::Epsg(epsg);
        }

        SpatialReference::Wkt(trimmed.to_string())
    }

    /// EPSG code of this reference, if one can be determined
    ///
    /// For WKT the last EPSG authority wins; in WKT1 that is the
    /// authority of the outermost CRS.
    pub fn epsg(&self) -> Option<u32> {
        match self {
            SpatialReference::Epsg(code) => Some(*code),
            SpatialReference::Wkt(wkt) => EPSG_AUTHORITY.captures_iter(wkt)
                .last()
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            SpatialReference::Unknown => None,
        }
    }

    /// Resolve to one of the known coordinate systems
    pub fn coordinate_system(&self) -> SlicerResult<CoordinateSystem> {
        self.epsg()
            .map(CoordinateSystem::from_epsg)
            .ok_or_else(|| SlicerError::CrsError(format!("Cannot resolve spatial reference {}", self)))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SpatialReference::Unknown)
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialReference::Epsg(code) => write!(f, "EPSG:{}", code),
            SpatialReference::Wkt(wkt) => write!(f, "{}", wkt),
            SpatialReference::Unknown => write!(f, "unknown"),
        }
    }
}
