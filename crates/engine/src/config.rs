//! Engine configuration.

use attendance_core::{
    limits::{
        CAMPUS_CENTER_LATITUDE, CAMPUS_CENTER_LONGITUDE, GEOFENCE_RADIUS_METERS,
        MAX_ROTATION_INTERVAL_MS, ROTATION_INTERVAL_MS,
    },
    Error, GeoPoint, Geofence, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token lifetime and rotation cadence
    #[serde(default = "default_interval_ms")]
    pub rotation_interval_ms: u64,
    #[serde(default)]
    pub geofence: GeofenceConfig,
    /// Buffered events per subscriber before the slowest one lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_interval_ms() -> u64 {
    ROTATION_INTERVAL_MS
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotation_interval_ms: default_interval_ms(),
            geofence: GeofenceConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Rejects a rotation interval outside `1..=MAX_ROTATION_INTERVAL_MS`.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ROTATION_INTERVAL_MS).contains(&self.rotation_interval_ms) {
            return Err(Error::validation(format!(
                "rotation interval must be between 1 and {} ms, got {}",
                MAX_ROTATION_INTERVAL_MS, self.rotation_interval_ms
            )));
        }
        Ok(())
    }

    /// Token lifetime, clamped into the accepted range.
    pub fn rotation_interval(&self) -> chrono::Duration {
        let ms = self.rotation_interval_ms.clamp(1, MAX_ROTATION_INTERVAL_MS);
        i64::try_from(ms)
            .map(chrono::Duration::milliseconds)
            .unwrap_or_else(|_| chrono::Duration::milliseconds(MAX_ROTATION_INTERVAL_MS as i64))
    }
}

/// Campus fence, in decimal degrees and meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceConfig {
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
}

fn default_center_latitude() -> f64 {
    CAMPUS_CENTER_LATITUDE
}

fn default_center_longitude() -> f64 {
    CAMPUS_CENTER_LONGITUDE
}

fn default_radius_meters() -> f64 {
    GEOFENCE_RADIUS_METERS
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            radius_meters: default_radius_meters(),
        }
    }
}

impl GeofenceConfig {
    pub fn fence(&self) -> Geofence {
        Geofence::new(
            GeoPoint::new(self.center_latitude, self.center_longitude),
            self.radius_meters,
        )
    }
}
