use crate::catalog::CoordinateBounds;

/// Mean earth radius of the spherical approximation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinate pairs via the haversine
/// formula. Accurate enough at the city radii this marketplace serves.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Coordinate window that encloses the search circle, used to pre-filter
/// candidates at the store before exact distances are computed.
pub fn bounds_for(latitude: f64, longitude: f64, radius_km: f64) -> CoordinateBounds {
    let lat_delta = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let lon_scale = latitude.to_radians().cos().abs().max(0.01);
    let lon_delta = lat_delta / lon_scale;

    CoordinateBounds {
        min_latitude: (latitude - lat_delta).max(-90.0),
        max_latitude: (latitude + lat_delta).min(90.0),
        min_longitude: (longitude - lon_delta).max(-180.0),
        max_longitude: (longitude + lon_delta).min(180.0),
    }
}

/// Distances are reported to callers rounded to two decimal places.
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}
