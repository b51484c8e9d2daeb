//! Straight-line distance between coordinates.
//!
//! Great-circle distance is the routing metric throughout the planner; the
//! grid estimate is a cheaper directed proxy for coarse comparisons.

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude used by the grid estimate.
const KM_PER_DEGREE: f64 = 111.0;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the pair lies within valid latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Mean of the given coordinates, or the origin for an empty set.
    pub fn centroid<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let mut lat = 0.0;
        let mut lng = 0.0;
        let mut n = 0usize;
        for c in coords {
            lat += c.lat;
            lng += c.lng;
            n += 1;
        }
        if n == 0 {
            return Self::default();
        }
        Self::new(lat / n as f64, lng / n as f64)
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance in kilometers (haversine formula).
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Grid ("city block") estimate in kilometers.
///
/// Longitude is scaled by the cosine of `from`'s latitude, so the estimate is
/// directed: `grid_km(a, b)` and `grid_km(b, a)` differ away from the equator.
pub fn grid_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat_diff = (to.lat - from.lat).abs() * KM_PER_DEGREE;
    let lng_diff = (to.lng - from.lng).abs() * KM_PER_DEGREE * from.lat.to_radians().cos();
    lat_diff + lng_diff
}

/// Length of the closed tour through `coords` (including the edge back to the start).
pub fn closed_tour_km(coords: &[Coordinates]) -> f64 {
    let n = coords.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| haversine_km(coords[i], coords[(i + 1) % n])).sum()
}

/// Length of the open path through `coords`.
pub fn open_path_km(coords: &[Coordinates]) -> f64 {
    coords.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CENTRO: Coordinates = Coordinates::new(-10.965490, -37.057259);
    const RUA_B: Coordinates = Coordinates::new(-10.967000, -37.058000);

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_km(CENTRO, CENTRO), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Aracaju to Salvador, ~275 km
        let dist = haversine_km(
            Coordinates::new(-10.9472, -37.0731),
            Coordinates::new(-12.9714, -38.5014),
        );
        assert!(dist > 250.0 && dist < 300.0, "Aracaju to Salvador should be ~275km, got {}", dist);
    }

    #[test]
    fn test_haversine_symmetric() {
        assert_relative_eq!(haversine_km(CENTRO, RUA_B), haversine_km(RUA_B, CENTRO), epsilon = 1e-12);
    }

    #[test]
    fn test_nearby_points_under_one_km() {
        let dist = haversine_km(CENTRO, RUA_B);
        assert!(dist > 0.0 && dist < 1.0);
    }

    #[test]
    fn test_triangle_inequality() {
        let c = Coordinates::new(-10.91, -37.07);
        let ab = haversine_km(CENTRO, RUA_B);
        let bc = haversine_km(RUA_B, c);
        let ac = haversine_km(CENTRO, c);
        assert!(ac <= ab + bc + 1e-9);
    }

    #[test]
    fn test_grid_is_directed() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(60.0, 1.0);
        assert_relative_eq!(grid_km(a, b), 60.0 * 111.0 + 111.0, epsilon = 1e-9);
        assert!(grid_km(b, a) < grid_km(a, b));
    }

    #[test]
    fn test_centroid_averages() {
        let c = Coordinates::centroid([Coordinates::new(1.0, 2.0), Coordinates::new(3.0, 6.0)]);
        assert_relative_eq!(c.lat, 2.0);
        assert_relative_eq!(c.lng, 4.0);
        assert_eq!(Coordinates::centroid(Vec::new()), Coordinates::default());
    }

    #[test]
    fn test_closed_tour_includes_return_edge() {
        let d = haversine_km(CENTRO, RUA_B);
        assert_relative_eq!(closed_tour_km(&[CENTRO, RUA_B]), 2.0 * d, epsilon = 1e-12);
        assert_relative_eq!(open_path_km(&[CENTRO, RUA_B]), d, epsilon = 1e-12);
        assert_eq!(closed_tour_km(&[CENTRO]), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(CENTRO.is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
    }
}
