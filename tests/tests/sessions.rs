//! Session lifecycle over HTTP.

use attendance_core::{QrPayload, Session};
use attendance_store::AttendanceStore;
use axum::http::StatusCode;
use integration_tests::fixtures::{self, FACULTY_ID};
use integration_tests::setup::TestContext;
use serde_json::Value;
use uuid::Uuid;

#[tokio::test]
async fn test_open_session_returns_active_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/sessions")
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&fixtures::open_session_body(true))
        .await;

    response.assert_status(StatusCode::CREATED);
    let session: Session = response.json();
    assert_eq!(session.faculty_id, FACULTY_ID);
    assert_eq!(session.semester, 5);
    assert_eq!(session.branch, "CSE");
    assert!(session.is_active);
    assert!(session.geofencing_enabled);
    assert!(session.ended_at.is_none());
    assert!(ctx.state.rotations.is_running(session.id));
}

#[tokio::test]
async fn test_open_session_requires_faculty_header() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/sessions")
        .json(&fixtures::open_session_body(true))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_002");
}

#[tokio::test]
async fn test_open_session_rejects_bad_semester() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let mut body = fixtures::open_session_body(true);
    body["semester"] = serde_json::json!(0);

    let response = server
        .post("/sessions")
        .add_header("X-Faculty-Id", FACULTY_ID)
        .json(&body)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert!(body["details"].is_array());
}

#[tokio::test]
async fn test_get_unknown_session() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get(&format!("/sessions/{}", Uuid::new_v4())).await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "SESSION_001");
}

#[tokio::test]
async fn test_malformed_session_id() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/sessions/not-a-uuid").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_qr_payload_carries_scope() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    let token = ctx.live_token(&server, session_id).await;
    let payload: QrPayload = server
        .get(&format!("/sessions/{}/qr", session_id))
        .await
        .json();

    assert_eq!(payload.session_id, session_id);
    assert_eq!(payload.subject, "Distributed Systems");
    assert_eq!(payload.semester, 5);
    assert_eq!(payload.branch, "CSE");
    assert!(payload.token.starts_with("qr_"));
    // Within one lifetime the payload keeps pointing at a stored token.
    assert!(ctx.store.find_token(&token).await.unwrap().is_some());
}

#[tokio::test]
async fn test_end_session_once() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    ctx.live_token(&server, session_id).await;

    let response = server
        .post(&format!("/sessions/{}/end", session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .await;
    response.assert_status_ok();
    let session: Session = response.json();
    assert!(!session.is_active);
    assert!(session.ended_at.is_some());
    assert!(!ctx.state.rotations.is_running(session_id));

    let response = server
        .post(&format!("/sessions/{}/end", session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "SESSION_002");
}

#[tokio::test]
async fn test_no_qr_after_session_ends() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    ctx.live_token(&server, session_id).await;

    server
        .post(&format!("/sessions/{}/end", session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .await
        .assert_status_ok();

    let response = server.get(&format!("/sessions/{}/qr", session_id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "TOKEN_002");
}

#[tokio::test]
async fn test_rotation_issues_fresh_tokens() {
    let ctx = TestContext::with_rotation_interval(40);
    let server = ctx.server();
    let session_id = ctx.open_session(&server, false).await;

    let first = ctx.live_token(&server, session_id).await;
    tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    let later = ctx.live_token(&server, session_id).await;

    assert_ne!(first, later);
    assert!(ctx.store.count_tokens(session_id).await.unwrap() >= 2);
}
