//! Great-circle road lengths.
//!
//! Cities placed on a map get straight-line roads whose length is the
//! haversine distance between them, in kilometres.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let half_lat = (other.lat - self.lat).to_radians() / 2.0;
        let half_lng = (other.lng - self.lng).to_radians() / 2.0;

        let a = half_lat.sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * half_lng.sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}
