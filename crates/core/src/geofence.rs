//! Geofence evaluation against the campus center.
//!
//! Distance is the great-circle (haversine) distance on a sphere of radius
//! [`EARTH_RADIUS_METERS`]. A point is inside when its distance from the
//! center is less than or equal to the radius; the boundary counts as inside.

use serde::{Deserialize, Serialize};

use crate::limits::{
    CAMPUS_CENTER_LATITUDE, CAMPUS_CENTER_LONGITUDE, EARTH_RADIUS_METERS, GEOFENCE_RADIUS_METERS,
};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Outcome of a geofence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceStatus {
    Inside,
    Outside,
    #[default]
    Unknown,
}

impl GeofenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Unknown => "unknown",
        }
    }
}

/// Classification of one reported location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceResult {
    pub status: GeofenceStatus,
    pub is_inside: bool,
    /// Distance from the center; `None` when no location was reported.
    pub distance_meters: Option<f64>,
    /// The reported point; `None` when status is unknown.
    pub point: Option<GeoPoint>,
}

impl GeofenceResult {
    /// Result for a scan with no usable location.
    pub const fn unknown() -> Self {
        Self {
            status: GeofenceStatus::Unknown,
            is_inside: false,
            distance_meters: None,
            point: None,
        }
    }
}

/// Haversine distance between two points, in meters.
///
/// Symmetric in its arguments and never negative.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Circular fence around a fixed center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl Default for Geofence {
    fn default() -> Self {
        Self::campus()
    }
}

impl Geofence {
    pub const fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// The reference campus fence.
    pub const fn campus() -> Self {
        Self::new(
            GeoPoint::new(CAMPUS_CENTER_LATITUDE, CAMPUS_CENTER_LONGITUDE),
            GEOFENCE_RADIUS_METERS,
        )
    }

    /// Distance of `point` from the fence center.
    pub fn distance_from_center(&self, point: GeoPoint) -> f64 {
        haversine_distance(self.center, point)
    }

    /// Classify a reported location. Either coordinate missing means unknown.
    pub fn classify(&self, latitude: Option<f64>, longitude: Option<f64>) -> GeofenceResult {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return GeofenceResult::unknown();
        };

        let point = GeoPoint::new(latitude, longitude);
        let distance = self.distance_from_center(point);
        let is_inside = distance <= self.radius_meters;

        GeofenceResult {
            status: if is_inside {
                GeofenceStatus::Inside
            } else {
                GeofenceStatus::Outside
            },
            is_inside,
            distance_meters: Some(distance),
            point: Some(point),
        }
    }
}
