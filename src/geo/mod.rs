use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Great-circle distance in kilometres between two points given in decimal
/// degrees. Argument order is longitude first.
pub fn distance_km(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> f64 {
    let lat1 = lat_a.to_radians();
    let lat2 = lat_b.to_radians();
    let delta_lat = (lat_b - lat_a).to_radians();
    let delta_lng = (lon_b - lon_a).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.lng, a.lat, b.lng, b.lat)
}
