//! Faculty manual override over HTTP.

use attendance_core::{AttendanceRecord, AttendanceStatus, GeofenceStatus, MarkMethod};
use attendance_store::AttendanceStore;
use axum::http::StatusCode;
use integration_tests::fixtures::{self, CENTER, FACULTY_ID};
use integration_tests::setup::TestContext;
use serde_json::Value;
use uuid::Uuid;

fn manual_path(session_id: Uuid) -> String {
    format!("/sessions/{}/attendance/manual", session_id)
}

#[tokio::test]
async fn test_manual_absent() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    let response = server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-400", "absent"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let record: AttendanceRecord = response.json();
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(record.geofencing_status, GeofenceStatus::Unknown);
    assert_eq!(record.marked_by.as_deref(), Some(FACULTY_ID));
    assert!(record.latitude.is_none() && record.longitude.is_none());
    assert_eq!(record.method(), MarkMethod::Manual);
}

#[tokio::test]
async fn test_manual_present_in_summary() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-401", "present"))
        .await
        .assert_status(StatusCode::CREATED);

    let summary: Value = server
        .get(&format!("/sessions/{}/summary", session_id))
        .await
        .json();
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["present"], 1);
    assert_eq!(summary["manual"], 0);
    assert_eq!(summary["unknown"], 1);
}

#[tokio::test]
async fn test_manual_after_scan_is_duplicate() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-402", Some(CENTER)))
        .await
        .assert_status_ok();

    let response = server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-402", "absent"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let error: Value = response.json();
    assert_eq!(error["code"], "ATTEND_001");

    // The scan record is untouched.
    let records = ctx.store.list_attendance(session_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Present);
    assert!(records[0].marked_by.is_none());
}

#[tokio::test]
async fn test_scan_after_manual_is_duplicate() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-403", "absent"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-403", Some(CENTER)))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_manual_allowed_after_session_end() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    server
        .post(&format!("/sessions/{}/end", session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .await
        .assert_status_ok();

    server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-404", "present"))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_manual_unknown_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post(&manual_path(Uuid::new_v4()))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-405", "present"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["code"], "SESSION_001");
}

#[tokio::test]
async fn test_manual_requires_faculty() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    let response = server
        .post(&manual_path(session_id))
        .json(&fixtures::manual_body("stu-406", "present"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALID_002");
    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_manual_rejects_unknown_action() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    let response = server
        .post(&manual_path(session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::manual_body("stu-407", "late"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALID_001");
}
