use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres. Radius arguments given in metres are
/// converted to central angles against this value.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A GeoJSON point: `{"type": "Point", "coordinates": [longitude, latitude]}`.
///
/// Longitude comes first, always exactly two coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Whether this is a well-formed point on the globe.
    pub fn is_valid(&self) -> bool {
        self.kind == "Point"
            && (-180.0..=180.0).contains(&self.longitude())
            && (-90.0..=90.0).contains(&self.latitude())
    }

    /// Haversine central angle in radians between two points.
    pub fn central_angle(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude().to_radians();
        let lat2 = other.latitude().to_radians();
        let dlat = (other.latitude() - self.latitude()).to_radians();
        let dlon = (other.longitude() - self.longitude()).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * a.sqrt().asin()
    }

    /// Great-circle distance in metres between two points.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        EARTH_RADIUS_M * self.central_angle(other)
    }
}

/// Convert a spherical-cap radius in metres to the equivalent central angle.
pub fn radius_to_radians(radius_m: f64) -> f64 {
    radius_m / EARTH_RADIUS_M
}
