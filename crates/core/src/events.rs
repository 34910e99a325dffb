//! Domain events emitted after state changes.
//!
//! These are handed to whatever notification layer sits above the engine;
//! no transport is implemented here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendance::{AttendanceRecord, AttendanceStatus, MarkMethod};
use crate::geofence::GeofenceStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttendanceEvent {
    SessionOpened {
        session_id: Uuid,
        faculty_id: String,
        subject: String,
        at: DateTime<Utc>,
    },
    TokenRotated {
        session_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    AttendanceMarked {
        session_id: Uuid,
        student_id: String,
        status: AttendanceStatus,
        geofencing_status: GeofenceStatus,
        method: MarkMethod,
        /// Records in the session after this one was committed.
        count: u64,
        at: DateTime<Utc>,
    },
    SessionEnded {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
}

impl AttendanceEvent {
    pub fn marked(record: &AttendanceRecord, count: u64) -> Self {
        Self::AttendanceMarked {
            session_id: record.session_id,
            student_id: record.student_id.clone(),
            status: record.status,
            geofencing_status: record.geofencing_status,
            method: record.method(),
            count,
            at: record.created_at,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            Self::SessionOpened { session_id, .. }
            | Self::TokenRotated { session_id, .. }
            | Self::AttendanceMarked { session_id, .. }
            | Self::SessionEnded { session_id, .. } => *session_id,
        }
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionOpened { .. } => "session_opened",
            Self::TokenRotated { .. } => "token_rotated",
            Self::AttendanceMarked { .. } => "attendance_marked",
            Self::SessionEnded { .. } => "session_ended",
        }
    }

    /// Topic a subscriber would listen on for this session.
    pub fn topic(&self) -> String {
        format!("attendance:session:{}", self.session_id())
    }
}
