//! Geodistance filtering — haversine great-circle math and radius checks.
//!
//! Coordinates are validated on construction; out-of-range input is a caller
//! error, never clamped.

use crate::types::{OverheadError, RawAircraftObservation, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range (or NaN) components.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(OverheadError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(OverheadError::LongitudeOutOfRange(lon));
        }
        Ok(Coordinate { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// Great-circle distance between two coordinates in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

// ---------------------------------------------------------------------------
// Search radius
// ---------------------------------------------------------------------------

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// An observer position plus an inclusive search radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius {
    origin: Coordinate,
    radius_km: f64,
}

impl SearchRadius {
    /// Build a search radius. The radius must be finite and non-negative.
    pub fn new(origin: Coordinate, radius_km: f64) -> Result<Self> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(OverheadError::InvalidRadius(radius_km));
        }
        Ok(SearchRadius { origin, radius_km })
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Whether a coordinate lies within the radius (inclusive).
    pub fn contains(&self, candidate: Coordinate) -> bool {
        distance_km(self.origin, candidate) <= self.radius_km
    }

    /// Whether an observation carries a valid position inside the radius.
    ///
    /// Observations without a complete, in-range position cannot establish
    /// proximity and are excluded.
    pub fn contains_observation(&self, obs: &RawAircraftObservation) -> bool {
        match (obs.lat, obs.lon) {
            (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
                Ok(pos) => self.contains(pos),
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Rough degree box around the origin, for bounding-box traffic queries.
    ///
    /// Uses the flat 111 km-per-degree approximation on both axes; the
    /// precise haversine filter prunes the corners afterwards.
    pub fn bounding_box(&self) -> BoundingBox {
        let deg = self.radius_km / 111.0;
        BoundingBox {
            south: self.origin.lat - deg,
            west: self.origin.lon - deg,
            north: self.origin.lat + deg,
            east: self.origin.lon + deg,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_same_point() {
        let a = coord(35.4362, -82.5418);
        assert!(distance_km(a, a) < 1e-9);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = coord(51.4700, -0.4543);
        let b = coord(40.6413, -73.7781);
        let d1 = distance_km(a, b);
        let d2 = distance_km(b, a);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is ~111 km
        let a = coord(35.0, -82.0);
        let b = coord(36.0, -82.0);
        let d = distance_km(a, b);
        assert!((d - 111.0).abs() < 1.0, "expected ~111 km, got {d}");
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(90.1, 0.0),
            Err(OverheadError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(-91.0, 0.0),
            Err(OverheadError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, 180.5),
            Err(OverheadError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(f64::NAN, 0.0),
            Err(OverheadError::LatitudeOutOfRange(_))
        ));
    }

    #[test]
    fn test_radius_inclusive() {
        let origin = coord(35.0, -82.0);
        let candidate = coord(36.0, -82.0);
        let d = distance_km(origin, candidate);
        let search = SearchRadius::new(origin, d).unwrap();
        assert!(search.contains(candidate), "boundary must be inclusive");
        let tighter = SearchRadius::new(origin, d - 0.5).unwrap();
        assert!(!tighter.contains(candidate));
    }

    #[test]
    fn test_radius_rejects_negative() {
        let origin = coord(35.0, -82.0);
        assert!(matches!(
            SearchRadius::new(origin, -1.0),
            Err(OverheadError::InvalidRadius(_))
        ));
        assert!(matches!(
            SearchRadius::new(origin, f64::NAN),
            Err(OverheadError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_contains_observation() {
        use crate::types::RawAircraftObservation;

        let search = SearchRadius::new(coord(35.0, -82.0), 50.0).unwrap();

        let mut obs = RawAircraftObservation::new("A12345");
        assert!(!search.contains_observation(&obs), "no position");

        obs.lat = Some(35.1);
        obs.lon = Some(-82.1);
        assert!(search.contains_observation(&obs));

        obs.lat = Some(40.0);
        assert!(!search.contains_observation(&obs), "out of range");

        obs.lat = Some(95.0);
        assert!(!search.contains_observation(&obs), "invalid latitude");
    }

    #[test]
    fn test_bounding_box() {
        let search = SearchRadius::new(coord(35.0, -82.0), 111.0).unwrap();
        let bbox = search.bounding_box();
        assert!((bbox.south - 34.0).abs() < 1e-9);
        assert!((bbox.north - 36.0).abs() < 1e-9);
        assert!((bbox.west - (-83.0)).abs() < 1e-9);
        assert!((bbox.east - (-81.0)).abs() < 1e-9);
    }
}
