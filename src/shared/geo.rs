use crate::shared::constants::EARTH_RADIUS_KM;

/// Great-circle distance in kilometers between two points given in degrees.
///
/// Non-finite input is not guarded against; coordinates are validated when a
/// driver is written.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (41.0, 29.0), (-6.2088, 106.8456), (89.9, -179.9)] {
            assert_eq!(haversine_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_quarter_great_circle() {
        // (0, 0) to (0, 90): a quarter of the equator
        let distance = haversine_km(0.0, 0.0, 0.0, 90.0);
        assert!((distance - 10_007.543).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn test_symmetric() {
        let a = (41.0082, 28.9784);
        let b = (39.9334, 32.8597);

        let forward = haversine_km(a.0, a.1, b.0, b.1);
        let backward = haversine_km(b.0, b.1, a.0, a.1);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Jakarta to Bandung, roughly 116km as the crow flies
        let distance = haversine_km(-6.2088, 106.8456, -6.9175, 107.6191);
        assert!(distance > 110.0 && distance < 125.0);
    }

    #[test]
    fn test_small_longitude_step() {
        // 0.01 degree of longitude at 41N is about 839 meters
        let distance = haversine_km(41.0, 29.0, 41.0, 29.01);
        assert!((distance - 0.839).abs() < 0.005, "got {}", distance);
    }
}
