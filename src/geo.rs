//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters (haversine).
    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        // Clamp guards against a > 1 from rounding on antipodal points.
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point() {
        let p = Coordinate::new(45.502, -73.567);
        assert!(p.distance_to(&p).abs() < 1e-9);
    }

    #[test]
    fn test_distance_thousandth_degree_at_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.001);
        let d = a.distance_to(&b);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let montreal = Coordinate::new(45.5017, -73.5673);
        let quebec = Coordinate::new(46.8139, -71.2080);
        let there = montreal.distance_to(&quebec);
        let back = quebec.distance_to(&montreal);
        assert!((there - back).abs() < 1e-6);
        // ~233 km between the two cities
        assert!((there - 233_000.0).abs() < 3_000.0, "got {there}");
    }

    #[test]
    fn test_distance_antipodal() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((a.distance_to(&b) - half_circumference).abs() < 1.0);
    }
}
