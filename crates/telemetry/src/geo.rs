//! Great-circle geometry for GPS fixes.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this is a usable fix.
    ///
    /// Receivers without a lock report `0, 0`, which is treated as no fix.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    /// Haversine distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_m(*self, *other)
    }
}

/// Haversine great-circle distance between two fixes, in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 10.0);
        let b = GeoPoint::new(1.0, 10.0);
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((haversine_m(a, b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let a = GeoPoint::new(22.5431, 114.0579);
        let b = GeoPoint::new(22.5440, 114.0601);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-9);
        // Roughly 250 m apart.
        assert!((200.0..300.0).contains(&haversine_m(a, b)));
    }

    #[test]
    fn test_null_island_is_not_a_fix() {
        assert!(!GeoPoint::new(0.0, 0.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(GeoPoint::new(0.0, 0.5).is_valid());
    }
}
