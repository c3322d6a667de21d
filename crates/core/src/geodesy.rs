//! Great-circle distance and bearing on a spherical Earth.
//!
//! Uses the haversine formula with a mean Earth radius of 6,371,000 m.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of arc at the equator
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

impl From<Coordinate> for geo::Point {
    fn from(coordinate: Coordinate) -> Self {
        geo::Point::new(coordinate.longitude, coordinate.latitude)
    }
}

impl From<geo::Point> for Coordinate {
    fn from(point: geo::Point) -> Self {
        Coordinate::new(point.y(), point.x())
    }
}

/// Haversine distance between two coordinates in meters
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` to `to` along the great circle, in [0, 360).
///
/// 0 is north, 90 is east. The bearing between identical points is undefined;
/// it resolves to 0.
pub fn bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Map any angle into [0, 360). Non-finite input maps to 0.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Convert meters to degrees at the equator (for small offsets only)
pub fn meters_to_degrees_approx(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_is_zero_for_same_point() {
        let p = Coordinate::new(-23.11443, -45.70780);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (Coordinate::new(40.7128, -74.0060), Coordinate::new(34.0522, -118.2437)),
            (Coordinate::new(-23.11443, -45.70780), Coordinate::new(-23.10543, -45.70780)),
            (Coordinate::new(89.9, 179.9), Coordinate::new(-89.9, -179.9)),
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0)),
        ];

        for (a, b) in pairs {
            assert_relative_eq!(distance_meters(a, b), distance_meters(b, a), max_relative = 1e-6);
        }
    }

    #[test]
    fn test_distance_nyc_to_la() {
        let nyc = Coordinate::new(40.7128, -74.0060);
        let la = Coordinate::new(34.0522, -118.2437);

        let dist = distance_meters(nyc, la);
        assert!((dist - 3_936_000.0).abs() < 50_000.0); // Within 50km
    }

    #[test]
    fn test_distance_one_kilometer_of_latitude() {
        let target = Coordinate::new(-23.11443, -45.70780);
        let current = Coordinate::new(-23.11443 + 0.009, -45.70780);

        // 0.009 degrees of arc on a 6371 km sphere
        assert_relative_eq!(distance_meters(current, target), 1000.75, epsilon = 0.5);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);

        assert_relative_eq!(bearing_degrees(origin, Coordinate::new(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_degrees(origin, Coordinate::new(0.0, 1.0)), 90.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_degrees(origin, Coordinate::new(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_degrees(origin, Coordinate::new(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_same_point_falls_back_to_zero() {
        let p = Coordinate::new(12.5, -8.25);
        assert_eq!(bearing_degrees(p, p), 0.0);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(45.0, 45.0),
            Coordinate::new(-45.0, 135.0),
            Coordinate::new(89.999, -179.999),
            Coordinate::new(-89.999, 179.999),
            Coordinate::new(-23.11443, -45.70780),
            Coordinate::new(0.0, 180.0),
        ];

        for from in points {
            for to in points {
                let bearing = bearing_degrees(from, to);
                assert!((0.0..360.0).contains(&bearing), "{bearing} out of range");
            }
        }
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert_eq!(normalize_degrees(-1e-17), 0.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(-23.11443, -45.70780).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_point_conversion() {
        let coordinate = Coordinate::new(40.7, -74.0);
        let point: geo::Point = coordinate.into();

        assert_eq!(point.x(), -74.0);
        assert_eq!(point.y(), 40.7);
        assert_eq!(Coordinate::from(point), coordinate);
    }
}
