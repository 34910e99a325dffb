//! Attendance records and per-session aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geofence::{GeofenceResult, GeofenceStatus};

/// Recorded attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Manual,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Manual => "manual",
        }
    }
}

/// Faculty override action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualAction {
    Present,
    Absent,
}

impl From<ManualAction> for AttendanceStatus {
    fn from(action: ManualAction) -> Self {
        match action {
            ManualAction::Present => Self::Present,
            ManualAction::Absent => Self::Absent,
        }
    }
}

/// How a record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkMethod {
    Scan,
    Manual,
}

/// The durable outcome of one student's participation in one session.
///
/// At most one exists per `(session_id, student_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub geofencing_status: GeofenceStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Faculty id for manual entries; `None` for self-service scans.
    pub marked_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Builds a record from a submitted status and a geofence result.
    ///
    /// Coordinates are kept only when the geofence status is known.
    pub fn new(
        session_id: Uuid,
        student_id: impl Into<String>,
        status: AttendanceStatus,
        geofence: GeofenceResult,
        marked_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let point = match geofence.status {
            GeofenceStatus::Unknown => None,
            _ => geofence.point,
        };

        Self {
            id: Uuid::new_v4(),
            session_id,
            student_id: student_id.into(),
            status,
            geofencing_status: geofence.status,
            latitude: point.map(|p| p.latitude),
            longitude: point.map(|p| p.longitude),
            marked_by,
            created_at: now,
        }
    }

    /// A self-service scan: always present, located by the geofence result.
    pub fn self_scan(
        session_id: Uuid,
        student_id: impl Into<String>,
        geofence: GeofenceResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            session_id,
            student_id,
            AttendanceStatus::Present,
            geofence,
            None,
            now,
        )
    }

    /// A faculty entry: no location, attributed to the faculty member.
    pub fn manual(
        session_id: Uuid,
        student_id: impl Into<String>,
        action: ManualAction,
        faculty_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            session_id,
            student_id,
            action.into(),
            GeofenceResult::unknown(),
            Some(faculty_id.into()),
            now,
        )
    }

    pub fn method(&self) -> MarkMethod {
        if self.marked_by.is_some() {
            MarkMethod::Manual
        } else {
            MarkMethod::Scan
        }
    }
}

/// Live counts for the faculty dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub session_id: Uuid,
    pub is_active: bool,
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub manual: u64,
    pub inside: u64,
    pub outside: u64,
    pub unknown: u64,
}

impl AttendanceSummary {
    /// Tallies records belonging to `session_id`; others are ignored.
    pub fn tally<'a>(
        session_id: Uuid,
        is_active: bool,
        records: impl IntoIterator<Item = &'a AttendanceRecord>,
    ) -> Self {
        let mut summary = Self {
            session_id,
            is_active,
            ..Default::default()
        };

        for record in records.into_iter().filter(|r| r.session_id == session_id) {
            summary.total += 1;
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::Manual => summary.manual += 1,
            }
            match record.geofencing_status {
                GeofenceStatus::Inside => summary.inside += 1,
                GeofenceStatus::Outside => summary.outside += 1,
                GeofenceStatus::Unknown => summary.unknown += 1,
            }
        }

        summary
    }
}
