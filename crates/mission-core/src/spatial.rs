//! Spatial math for distance-to-waypoint reporting.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// This is the standard formula for calculating great-circle distance
/// between two points on a sphere given their latitudes and longitudes.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

// ==== ENU (East-North-Up) Coordinate Conversion ====
// These functions convert between meters and degrees using latitude-aware scaling.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lat(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert an east/west offset in meters to degrees longitude.
/// Requires the reference latitude for proper scaling.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lon(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(33.6846, -117.8265, 33.6846, -117.8265);
        assert!(dist < 0.001);
    }

    #[test]
    fn meters_to_degrees_round_trip() {
        let lat = 33.0;
        let dlat = meters_to_lat(100.0, lat);
        assert!((dlat * meters_per_deg_lat(lat) - 100.0).abs() < 0.01);

        let dlon = meters_to_lon(100.0, lat);
        assert!((dlon * meters_per_deg_lon(lat) - 100.0).abs() < 0.01);
    }

    #[test]
    fn haversine_matches_local_scaling_for_short_distances() {
        let lat = 33.6846;
        let lon = -117.8265;
        let dlat = meters_to_lat(50.0, lat);
        let dist = haversine_distance(lat, lon, lat + dlat, lon);
        assert!((dist - 50.0).abs() < 0.5);
    }
}
