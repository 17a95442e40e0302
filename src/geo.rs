//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point: latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both components are within their valid degree ranges.
    ///
    /// Distance math assumes valid inputs, so anything crossing the engine
    /// boundary (listing locations, query origins) is checked with this first.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Great-circle distance between two coordinates in kilometres.
///
/// Haversine formula on a spherical earth. Symmetric, zero for equal points,
/// and monotonic in angular separation. Inputs are assumed valid; callers
/// validate with [`Coordinate::is_valid`] at the boundary.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let hav = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * hav.sqrt().atan2((1.0 - hav).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let tallinn = Coordinate::new(59.437, 24.754);

        assert!(distance_km(tallinn, tallinn).abs() < 1e-9, "expected zero distance");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(59.437, 24.754);
        let b = Coordinate::new(58.378, 26.729); // Tartu

        let there = distance_km(a, b);
        let back = distance_km(b, a);

        assert!((there - back).abs() < 1e-9, "expected symmetric distance");
    }

    #[test]
    fn nearby_listing_distance_is_under_half_a_kilometre() {
        let origin = Coordinate::new(59.437, 24.754);
        let listing = Coordinate::new(59.440, 24.760);

        let distance = distance_km(origin, listing);

        assert!(distance > 0.3 && distance < 0.5, "expected ~0.4 km, got {distance}");
    }

    #[test]
    fn city_pair_distance_is_plausible() {
        // Tallinn to Tartu is roughly 165 km as the crow flies.
        let tallinn = Coordinate::new(59.437, 24.754);
        let tartu = Coordinate::new(58.378, 26.729);

        let distance = distance_km(tallinn, tartu);

        assert!(distance > 150.0 && distance < 180.0, "got {distance}");
    }

    #[test]
    fn validity_covers_the_degree_ranges() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn coordinate_from_tuple() {
        let coord: Coordinate = (59.437, 24.754).into();

        assert!((coord.latitude - 59.437).abs() < f64::EPSILON, "latitude mismatch");
        assert!((coord.longitude - 24.754).abs() < f64::EPSILON, "longitude mismatch");
    }
}
