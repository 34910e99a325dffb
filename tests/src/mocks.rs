//! Mock implementations for testing.

use async_trait::async_trait;
use attendance_core::{AttendanceRecord, Error, QrToken, Result, Session};
use attendance_store::{AttendanceStore, InsertOutcome, MemoryStore, TokenInsert};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Store that delegates to [`MemoryStore`] but can be switched to fail
/// attendance writes, attendance listing and the health probe.
#[derive(Clone, Default)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    should_fail: Arc<Mutex<bool>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            Err(Error::store_failed("mock store failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AttendanceStore for FailingStore {
    async fn insert_session(&self, session: Session) -> Result<Session> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        self.inner.get_session(id).await
    }

    async fn end_session(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<Session> {
        self.inner.end_session(id, ended_at).await
    }

    async fn insert_token(&self, token: QrToken) -> Result<TokenInsert> {
        self.inner.insert_token(token).await
    }

    async fn find_token(&self, token: &str) -> Result<Option<QrToken>> {
        self.inner.find_token(token).await
    }

    async fn latest_token(&self, session_id: Uuid) -> Result<Option<QrToken>> {
        self.inner.latest_token(session_id).await
    }

    async fn count_tokens(&self, session_id: Uuid) -> Result<u64> {
        self.inner.count_tokens(session_id).await
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        self.inner.purge_expired_tokens(now).await
    }

    async fn insert_attendance_if_absent(&self, record: AttendanceRecord) -> Result<InsertOutcome> {
        self.check()?;
        self.inner.insert_attendance_if_absent(record).await
    }

    async fn list_attendance(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        self.check()?;
        self.inner.list_attendance(session_id).await
    }

    async fn count_attendance(&self, session_id: Uuid) -> Result<u64> {
        self.inner.count_attendance(session_id).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::Geofence;

    #[tokio::test]
    async fn test_failing_store_failure_mode() {
        let store = FailingStore::new();
        assert!(store.ping().await.is_ok());

        store.set_should_fail(true);
        assert!(store.ping().await.is_err());

        let record = AttendanceRecord::self_scan(
            Uuid::new_v4(),
            "stu-1",
            Geofence::campus().classify(None, None),
            Utc::now(),
        );
        let err = store.insert_attendance_if_absent(record).await.unwrap_err();
        assert_eq!(err.error_code(), Some("DB_001"));
    }
}
