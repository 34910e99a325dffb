//! Storage contract for sessions, tokens, and attendance records.

use async_trait::async_trait;
use attendance_core::{AttendanceRecord, QrToken, Result, Session};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of an atomic insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted(AttendanceRecord),
    /// A record for the same `(session_id, student_id)` already existed;
    /// nothing was written. Carries the existing record.
    Duplicate(AttendanceRecord),
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Result of inserting a token under the unique token-string index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenInsert {
    Inserted,
    /// Another token already uses this string; nothing was written.
    Conflict,
}

/// Persistence used by the engine.
///
/// Implementations must make [`insert_attendance_if_absent`] atomic per
/// `(session_id, student_id)`: of any number of concurrent calls for the
/// same pair, exactly one returns `Inserted`. A unique index, a per-key
/// lock, or a transaction all satisfy this; a read followed by a separate
/// write does not.
///
/// Every method either fully applies or returns an error with nothing
/// committed.
///
/// [`insert_attendance_if_absent`]: AttendanceStore::insert_attendance_if_absent
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn insert_session(&self, session: Session) -> Result<Session>;

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>>;

    /// Deactivates a session exactly once.
    ///
    /// Fails with `SESSION_001` if missing and `SESSION_002` if already ended.
    async fn end_session(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<Session>;

    async fn insert_token(&self, token: QrToken) -> Result<TokenInsert>;

    /// Looks a token up by its string.
    async fn find_token(&self, token: &str) -> Result<Option<QrToken>>;

    /// Most recently issued token for a session, expired or not.
    async fn latest_token(&self, session_id: Uuid) -> Result<Option<QrToken>>;

    async fn count_tokens(&self, session_id: Uuid) -> Result<u64>;

    /// Deletes tokens with `expires_at <= now`. Returns how many were removed.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize>;

    async fn insert_attendance_if_absent(&self, record: AttendanceRecord) -> Result<InsertOutcome>;

    /// Records for a session, oldest first.
    async fn list_attendance(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>>;

    async fn count_attendance(&self, session_id: Uuid) -> Result<u64>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<()>;
}
