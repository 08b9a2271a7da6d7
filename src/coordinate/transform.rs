//! Coordinate transformation functionality

use std::f64::consts::PI;

use super::crs::CoordinateSystem;
use super::point::Point;
use crate::errors::{SlicerError, SlicerResult};

/// Transformer for converting projected coordinates to longitude/latitude
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// WGS84 semi-major axis in meters
    const EARTH_RADIUS: f64 = 6378137.0;
    /// WGS84 flattening
    const FLATTENING: f64 = 1.0 / 298.257223563;
    /// UTM scale factor on the central meridian
    const UTM_SCALE: f64 = 0.9996;
    const UTM_FALSE_EASTING: f64 = 500_000.0;
    const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> Point {
        // Web Mercator is undefined at the poles
        let lat = lat.clamp(-85.05, 85.05);

        let x = lon * Self::EARTH_RADIUS * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * Self::EARTH_RADIUS;

        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (Self::EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / Self::EARTH_RADIUS)) - PI / 2.0);

        Point::new(lon, lat)
    }

    fn central_meridian(zone: u8) -> f64 {
        (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }

    fn eccentricity_squared() -> f64 {
        Self::FLATTENING * (2.0 - Self::FLATTENING)
    }

    /// Convert UTM easting/northing to WGS84 longitude/latitude
    pub fn utm_to_wgs84(&self, easting: f64, northing: f64, zone: u8, is_northern: bool) -> Point {
        let a = Self::EARTH_RADIUS;
        let k0 = Self::UTM_SCALE;
        let e2 = Self::eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);

        let x = easting - Self::UTM_FALSE_EASTING;
        let y = if is_northern { northing } else { northing - Self::UTM_FALSE_NORTHING_SOUTH };

        let m = y / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let sqrt_term = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_term) / (1.0 + sqrt_term);

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = x / (n1 * k0);

        let lat = phi1 - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6) / 720.0);

        let lon = (d
            - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5) / 120.0)
            / cos_phi1;

        Point::new(Self::central_meridian(zone) + lon.to_degrees(), lat.to_degrees())
    }

    /// Convert WGS84 longitude/latitude to UTM easting/northing in the given zone
    pub fn wgs84_to_utm(&self, lon: f64, lat: f64, zone: u8, is_northern: bool) -> Point {
        let a = Self::EARTH_RADIUS;
        let k0 = Self::UTM_SCALE;
        let e2 = Self::eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
        let t = tan_phi.powi(2);
        let c = ep2 * cos_phi.powi(2);
        let big_a = cos_phi * (lon - Self::central_meridian(zone)).to_radians();

        let m = a * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin());

        let easting = k0 * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
            + Self::UTM_FALSE_EASTING;

        let mut northing = k0
            * (m + n * tan_phi
                * (big_a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * big_a.powi(6) / 720.0));

        if !is_northern {
            northing += Self::UTM_FALSE_NORTHING_SOUTH;
        }

        Point::new(easting, northing)
    }

    /// Transform a point in the given coordinate system to longitude/latitude
    pub fn to_geographic(&self, point: &Point, crs: &CoordinateSystem) -> SlicerResult<Point> {
        match crs {
            CoordinateSystem::WGS84 => Ok(*point),
            CoordinateSystem::WebMercator => Ok(self.web_mercator_to_wgs84(point.x, point.y)),
            CoordinateSystem::UTM(zone, is_northern) => {
                Ok(self.utm_to_wgs84(point.x, point.y, *zone, *is_northern))
            },
            CoordinateSystem::Other(_) => Err(SlicerError::CrsError(format!(
                "Unsupported coordinate transformation from {} to WGS 84",
                crs.description()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_utm_central_meridian_on_equator() {
        let transformer = CoordinateTransformer;
        let point = transformer.utm_to_wgs84(500_000.0, 0.0, 32, true);
        assert_abs_diff_eq!(point.x, 9.0, epsilon = 1e-9);
        assert_abs_diff_eq!(point.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_utm_round_trip() {
        let transformer = CoordinateTransformer;
        for &(lon, lat, zone, north) in &[
            (10.7461, 59.9127, 32u8, true),
            (18.07, 59.33, 33u8, true),
            (151.21, -33.87, 56u8, false),
        ] {
            let utm = transformer.wgs84_to_utm(lon, lat, zone, north);
            let back = transformer.utm_to_wgs84(utm.x, utm.y, zone, north);
            assert_abs_diff_eq!(back.x, lon, epsilon = 1e-6);
            assert_abs_diff_eq!(back.y, lat, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let transformer = CoordinateTransformer;
        let mercator = transformer.wgs84_to_web_mercator(10.0, 59.0);
        let back = transformer.web_mercator_to_wgs84(mercator.x, mercator.y);
        assert_abs_diff_eq!(back.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, 59.0, epsilon = 1e-9);
    }

    #[test]
    fn test_other_crs_is_rejected() {
        let transformer = CoordinateTransformer;
        assert!(transformer.to_geographic(&Point::new(0.0, 0.0), &CoordinateSystem::Other(2056)).is_err());
    }
}
