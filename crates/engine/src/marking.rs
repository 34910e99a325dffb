//! Attendance marking.
//!
//! Every write goes through [`AttendanceEngine::mark_attendance`], which
//! relies on the store's atomic insert-if-absent for the one-record-per-
//! student guarantee. Token checks happen before it, in `verify_scan`.

use attendance_core::{
    schema::{
        validate_faculty_id, validate_manual_request, validate_verify_request, ManualMarkRequest,
        VerifyRequest,
    },
    AttendanceEvent, AttendanceRecord, AttendanceStatus, AttendanceSummary, Error, Geofence,
    GeofenceResult, Result, Session, TokenValidation,
};
use attendance_store::{AttendanceStore, InsertOutcome};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::events::EventBus;
use crate::tokens::TokenService;
use crate::track_storage;

#[derive(Clone)]
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    tokens: TokenService,
    geofence: Geofence,
    events: EventBus,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        tokens: TokenService,
        geofence: Geofence,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            tokens,
            geofence,
            events,
        }
    }

    pub fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    /// Commits the first record for `(session_id, student_id)`.
    ///
    /// Later attempts fail with `ATTEND_001` and write nothing. Tokens are
    /// not consulted here.
    pub async fn mark_attendance(
        &self,
        session_id: Uuid,
        student_id: &str,
        status: AttendanceStatus,
        geofence: GeofenceResult,
        marked_by: Option<String>,
    ) -> Result<AttendanceRecord> {
        let started = Instant::now();
        let record = AttendanceRecord::new(
            session_id,
            student_id,
            status,
            geofence,
            marked_by,
            Utc::now(),
        );

        let outcome = self
            .store
            .insert_attendance_if_absent(record)
            .await
            .map_err(track_storage)?;
        telemetry::metrics()
            .mark_latency_ms
            .observe_duration(started.elapsed());

        let record = match outcome {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::Duplicate(existing) => {
                telemetry::metrics().duplicate_attempts.inc();
                debug!(
                    session_id = %session_id,
                    student_id = %student_id,
                    existing_status = existing.status.as_str(),
                    "Attendance already marked"
                );
                return Err(Error::duplicate(student_id));
            }
        };

        // Committed; a failed count only costs the event its running total.
        let count = match self.store.count_attendance(session_id).await {
            Ok(count) => count,
            Err(e) => {
                track_storage(e);
                0
            }
        };

        info!(
            session_id = %session_id,
            student_id = %record.student_id,
            status = record.status.as_str(),
            geofencing_status = record.geofencing_status.as_str(),
            count,
            "Attendance marked"
        );
        self.events.publish(AttendanceEvent::marked(&record, count));

        Ok(record)
    }

    /// Self-service scan: validate, check the code, locate, mark.
    ///
    /// A missing or ended session is reported as an invalid code, since no
    /// live code can exist for it.
    pub async fn verify_scan(&self, request: &VerifyRequest) -> Result<AttendanceRecord> {
        let metrics = telemetry::metrics();
        metrics.scans_received.inc();

        if let Err(e) = validate_verify_request(request) {
            metrics.validation_failures.inc();
            return Err(e);
        }

        let session = self
            .store
            .get_session(request.session_id)
            .await
            .map_err(track_storage)?
            .filter(Session::is_active);
        let Some(session) = session else {
            metrics.invalid_tokens.inc();
            debug!(session_id = %request.session_id, "Scan for missing or ended session");
            return Err(Error::invalid_token());
        };

        if let TokenValidation::Invalid(reason) = self
            .tokens
            .validate(session.id, &request.token)
            .await?
        {
            metrics.invalid_tokens.inc();
            debug!(
                session_id = %session.id,
                student_id = %request.student_id,
                reason = reason.as_str(),
                "Rejected scan"
            );
            return Err(Error::invalid_token());
        }

        let location = if session.geofencing_enabled {
            self.geofence.classify(request.latitude, request.longitude)
        } else {
            GeofenceResult::unknown()
        };

        let record = self
            .mark_attendance(
                session.id,
                &request.student_id,
                AttendanceStatus::Present,
                location,
                None,
            )
            .await?;
        metrics.scans_accepted.inc();

        Ok(record)
    }

    /// Faculty override for one student. Skips token checks and is allowed
    /// after the session ended.
    pub async fn manual_mark(
        &self,
        session_id: Uuid,
        request: &ManualMarkRequest,
        faculty_id: &str,
    ) -> Result<AttendanceRecord> {
        validate_faculty_id(faculty_id)?;
        validate_manual_request(request)?;
        self.require_session(session_id).await?;

        let record = self
            .mark_attendance(
                session_id,
                &request.student_id,
                request.action.into(),
                GeofenceResult::unknown(),
                Some(faculty_id.to_string()),
            )
            .await?;
        telemetry::metrics().manual_marks.inc();

        Ok(record)
    }

    /// Records for a session, oldest first.
    pub async fn records(&self, session_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        self.require_session(session_id).await?;
        self.store
            .list_attendance(session_id)
            .await
            .map_err(track_storage)
    }

    /// Live counts for the faculty dashboard.
    pub async fn summary(&self, session_id: Uuid) -> Result<AttendanceSummary> {
        let session = self.require_session(session_id).await?;
        let records = self
            .store
            .list_attendance(session_id)
            .await
            .map_err(track_storage)?;
        Ok(AttendanceSummary::tally(
            session_id,
            session.is_active,
            &records,
        ))
    }

    async fn require_session(&self, session_id: Uuid) -> Result<Session> {
        self.store
            .get_session(session_id)
            .await
            .map_err(track_storage)?
            .ok_or_else(|| Error::session_not_found(session_id))
    }
}
