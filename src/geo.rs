use serde::Deserialize;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Fixed submission geofence: reference point plus an inclusive radius.
/// Configured once when the workspace is selected, never discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Geofence {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "radiusMeters")]
    pub radius_m: f64,
}

impl Default for Geofence {
    fn default() -> Self {
        // Main lecture hall reference point.
        Geofence {
            latitude: 8.4799,
            longitude: 4.5418,
            radius_m: 150.0,
        }
    }
}

impl Geofence {
    pub fn reference(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn distance_to(&self, pos: Position) -> f64 {
        distance_meters(
            pos.latitude,
            pos.longitude,
            self.latitude,
            self.longitude,
        )
    }

    /// Boundary is inclusive: exactly on the radius counts as inside.
    pub fn contains(&self, pos: Position) -> bool {
        is_within_radius(pos, self.reference(), self.radius_m)
    }
}

/// Great-circle distance between two coordinates, haversine formula.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

pub fn is_within_radius(pos: Position, reference: Position, radius_m: f64) -> bool {
    distance_meters(pos.latitude, pos.longitude, reference.latitude, reference.longitude)
        <= radius_m
}
