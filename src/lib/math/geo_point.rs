use super::*;
use crate::Error;

/// Mean earth radius in meters, the same one web maps measure distances with.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// A validated WGS84 position.
///
/// Points are never mutated. Whenever a location changes a new point is
/// resolved and replaces the old one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Creates a new point.
    ///
    /// Fails if `lat` is not within `[-90, 90]` or `lng` is not within `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, Error> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Ok(Self { lat, lng })
        } else {
            Err(Error::InvalidCoordinate { lat, lng })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Returns the arithmetic midpoint of two points.
    ///
    /// This is what the map centers on, not the great circle midpoint.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }

    /// Great circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = deg2rad(self.lat);
        let lat2 = deg2rad(other.lat);
        let half_dlat = deg2rad(other.lat - self.lat) / 2.0;
        let half_dlng = deg2rad(other.lng - self.lng) / 2.0;
        let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlng.sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

#[test]
fn rejects_out_of_range_coordinates() {
    assert!(GeoPoint::new(90.0, 180.0).is_ok());
    assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    assert_eq!(
        GeoPoint::new(90.1, 0.0),
        Err(Error::InvalidCoordinate { lat: 90.1, lng: 0.0 })
    );
    assert!(GeoPoint::new(0.0, -180.5).is_err());
    assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
}

#[test]
fn london_to_paris() {
    let london = GeoPoint::new(51.5074, -0.1278).unwrap();
    let paris = GeoPoint::new(48.8566, 2.3522).unwrap();

    approx::assert_abs_diff_eq!(london.distance_to(&paris) / 1000.0, 343.556, epsilon = 0.01);
    approx::assert_relative_eq!(london.distance_to(&paris), paris.distance_to(&london));
    assert_eq!(london.distance_to(&london), 0.0);
}

#[test]
fn midpoint_is_arithmetic() {
    let a = GeoPoint::new(10.0, -20.0).unwrap();
    let b = GeoPoint::new(-30.0, 40.0).unwrap();
    assert_eq!(a.midpoint(&b), GeoPoint::new(-10.0, 10.0).unwrap());
}
