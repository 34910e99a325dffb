//! In-process store backed by locked hash maps.
//!
//! Attendance rows live in a map keyed by session then student, and the
//! existence check and insert happen under a single write guard, which gives
//! the same guarantee as a unique index on `(session_id, student_id)`.

use async_trait::async_trait;
use attendance_core::{AttendanceRecord, Error, QrToken, Result, Session};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::store::{AttendanceStore, InsertOutcome, TokenInsert};

type AttendanceBySession = HashMap<Uuid, HashMap<String, AttendanceRecord>>;

pub struct MemoryStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Unique index on the token string.
    tokens: RwLock<HashMap<String, QrToken>>,
    attendance: RwLock<AttendanceBySession>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            tokens: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            attendance: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
        }
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_session(&self, session: Session) -> Result<Session> {
        let mut sessions = self.sessions.write();
        match sessions.entry(session.id) {
            Entry::Occupied(_) => Err(Error::store_failed(format!(
                "session {} already exists",
                session.id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(session).clone()),
        }
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn end_session(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::session_not_found(id))?;
        session.end(ended_at)?;
        Ok(session.clone())
    }

    async fn insert_token(&self, token: QrToken) -> Result<TokenInsert> {
        let mut tokens = self.tokens.write();
        match tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Ok(TokenInsert::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(token);
                Ok(TokenInsert::Inserted)
            }
        }
    }

    async fn find_token(&self, token: &str) -> Result<Option<QrToken>> {
        Ok(self.tokens.read().get(token).cloned())
    }

    async fn latest_token(&self, session_id: Uuid) -> Result<Option<QrToken>> {
        Ok(self
            .tokens
            .read()
            .values()
            .filter(|t| t.session_id == session_id)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn count_tokens(&self, session_id: Uuid) -> Result<u64> {
        Ok(self
            .tokens
            .read()
            .values()
            .filter(|t| t.session_id == session_id)
            .count() as u64)
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired(now));
        let purged = before - tokens.len();
        if purged > 0 {
            debug!(purged, remaining = tokens.len(), "Purged expired tokens");
        }
        Ok(purged)
    }

    async fn insert_attendance_if_absent(&self, record: AttendanceRecord) -> Result<InsertOutcome> {
        let mut attendance = self.attendance.write();
        let by_student = attendance.entry(record.session_id).or_default();
        match by_student.entry(record.student_id.clone()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Duplicate(existing.get().clone())),
            Entry::Vacant(slot) => Ok(InsertOutcome::Inserted(slot.insert(record).clone())),
        }
    }

    async fn list_attendance(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self
            .attendance
            .read()
            .get(&session_id)
            .map(|by_student| by_student.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.student_id.cmp(&b.student_id))
        });
        Ok(records)
    }

    async fn count_attendance(&self, session_id: Uuid) -> Result<u64> {
        Ok(self
            .attendance
            .read()
            .get(&session_id)
            .map_or(0, |by_student| by_student.len() as u64))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
