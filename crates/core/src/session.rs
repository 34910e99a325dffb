//! Attendance session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Display context embedded into issued tokens.
///
/// Never used for authorization; only the session id and token string are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScope {
    pub subject: String,
    pub branch: String,
    pub semester: u32,
}

/// A faculty-led attendance-taking window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub faculty_id: String,
    pub semester: u32,
    pub branch: String,
    pub subject: String,
    pub geofencing_enabled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a new, active session.
    pub fn new(
        faculty_id: impl Into<String>,
        scope: SessionScope,
        geofencing_enabled: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            faculty_id: faculty_id.into(),
            semester: scope.semester,
            branch: scope.branch,
            subject: scope.subject,
            geofencing_enabled,
            is_active: true,
            created_at: now,
            ended_at: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn scope(&self) -> SessionScope {
        SessionScope {
            subject: self.subject.clone(),
            branch: self.branch.clone(),
            semester: self.semester,
        }
    }

    /// Ends the session. One-way: a second call fails and changes nothing.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active {
            return Err(Error::session_inactive(self.id));
        }
        self.is_active = false;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Fails with `SESSION_002` unless the session is still running.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(Error::session_inactive(self.id))
        }
    }
}
