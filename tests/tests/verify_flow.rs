//! Student scan verification over HTTP.

use api::middleware::rate_limit::RateLimitConfig;
use api::response::VerifyResponse;
use attendance_core::schema::OpenSessionRequest;
use attendance_core::{AttendanceStatus, AttendanceSummary, GeofenceStatus};
use attendance_store::AttendanceStore;
use axum::http::StatusCode;
use integration_tests::fixtures::{self, CENTER, FACULTY_ID, FAR_NORTH};
use integration_tests::setup::TestContext;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_scan_at_center_is_inside() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-100", Some(CENTER)))
        .await;

    response.assert_status_ok();
    let body: VerifyResponse = response.json();
    assert!(body.success);
    assert_eq!(body.geofencing_status, GeofenceStatus::Inside);
    assert_eq!(body.record.status, AttendanceStatus::Present);
    assert_eq!(body.record.student_id, "stu-100");
    assert_eq!(body.record.latitude, Some(CENTER.0));
    assert!(body.record.marked_by.is_none());
}

#[tokio::test]
async fn test_scan_far_away_is_outside_but_recorded() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-101", Some(FAR_NORTH)))
        .await;

    response.assert_status_ok();
    let body: VerifyResponse = response.json();
    assert_eq!(body.geofencing_status, GeofenceStatus::Outside);
    assert_eq!(body.record.status, AttendanceStatus::Present);
}

#[tokio::test]
async fn test_scan_without_location_is_unknown() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-102", None))
        .await;

    response.assert_status_ok();
    let body: VerifyResponse = response.json();
    assert_eq!(body.geofencing_status, GeofenceStatus::Unknown);
}

#[tokio::test]
async fn test_geofencing_disabled_ignores_location() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, false).await;
    let token = ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-103", Some(FAR_NORTH)))
        .await;

    response.assert_status_ok();
    let body: VerifyResponse = response.json();
    assert_eq!(body.geofencing_status, GeofenceStatus::Unknown);
}

#[tokio::test]
async fn test_second_scan_is_duplicate() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;
    let body = fixtures::verify_body(session_id, &token, "stu-104", Some(CENTER));

    server.post("/attendance/verify").json(&body).await.assert_status_ok();

    let response = server.post("/attendance/verify").json(&body).await;
    response.assert_status(StatusCode::CONFLICT);
    let error: Value = response.json();
    assert_eq!(error["code"], "ATTEND_001");
    assert_eq!(error["error"], "Attendance already marked");

    let records = ctx.store.list_attendance(session_id).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(
            session_id,
            "qr_1700000000000_0123456789abcdef0123456789abcdef",
            "stu-105",
            None,
        ))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOKEN_001");
    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_token_from_other_session_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let first = ctx.open_session(&server, true).await;
    let second = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, first).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(second, &token, "stu-106", None))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOKEN_001");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let ctx = TestContext::with_rotation_interval(50);
    let server = ctx.server();

    // Opened through the engine so no rotation task keeps issuing.
    let request = OpenSessionRequest {
        semester: 2,
        branch: "ECE".into(),
        subject: "Signals".into(),
        geofencing_enabled: true,
    };
    let session = ctx.state.sessions.open(FACULTY_ID, &request).await.unwrap();
    let token = ctx.state.tokens.issue(session.id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session.id, &token.token, "stu-107", None))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOKEN_001");
}

#[tokio::test]
async fn test_scan_after_session_end_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    server
        .post(&format!("/sessions/{}/end", session_id))
        .add_header("X-Faculty-Id", FACULTY_ID)
        .await
        .assert_status_ok();

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-108", None))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOKEN_001");
}

#[tokio::test]
async fn test_scan_for_unknown_session_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(
            Uuid::new_v4(),
            "qr_1700000000000_0123456789abcdef0123456789abcdef",
            "stu-109",
            None,
        ))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOKEN_001");
}

#[tokio::test]
async fn test_half_coordinate_pair_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let mut body = fixtures::verify_body(session_id, &token, "stu-110", None);
    body["latitude"] = serde_json::json!(CENTER.0);

    let response = server.post("/attendance/verify").json(&body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALID_002");
    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_out_of_range_coordinates_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let response = server
        .post("/attendance/verify")
        .json(&fixtures::verify_body(session_id, &token, "stu-111", Some((95.0, 10.0))))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALID_003");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/attendance/verify")
        .content_type("application/json")
        .bytes("{\"token\": ".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALID_001");
}

#[tokio::test]
async fn test_repeated_scans_from_one_student_rate_limited() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig {
        rate: 1,
        burst: 2,
        idle_secs: 600,
    });
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;
    let body = fixtures::verify_body(session_id, &token, "stu-200", None);

    server
        .post("/attendance/verify")
        .add_header("X-Forwarded-For", "10.0.0.7")
        .json(&body)
        .await
        .assert_status_ok();
    server
        .post("/attendance/verify")
        .add_header("X-Forwarded-For", "10.0.0.7")
        .json(&body)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = server
        .post("/attendance/verify")
        .add_header("X-Forwarded-For", "10.0.0.7")
        .json(&body)
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
    let error: Value = response.json();
    assert_eq!(error["code"], "RATE_001");

    // Another student behind the same address has their own bucket.
    server
        .post("/attendance/verify")
        .add_header("X-Forwarded-For", "10.0.0.7")
        .json(&fixtures::verify_body(session_id, &token, "stu-201", None))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_class_behind_one_address_all_marked_with_default_limits() {
    let ctx = TestContext::with_rate_limit(RateLimitConfig::default());
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;

    for i in 0..40 {
        let token = ctx.live_token(&server, session_id).await;
        let student = format!("stu-9{:02}", i);
        server
            .post("/attendance/verify")
            .add_header("X-Forwarded-For", "203.0.113.10")
            .json(&fixtures::verify_body(session_id, &token, &student, Some(CENTER)))
            .await
            .assert_status_ok();
    }

    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 40);
}

#[tokio::test]
async fn test_summary_and_records_reflect_scans() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    for (student, location) in [
        ("stu-300", Some(CENTER)),
        ("stu-301", Some(FAR_NORTH)),
        ("stu-302", None),
    ] {
        server
            .post("/attendance/verify")
            .json(&fixtures::verify_body(session_id, &token, student, location))
            .await
            .assert_status_ok();
    }

    let summary: AttendanceSummary = server
        .get(&format!("/sessions/{}/summary", session_id))
        .await
        .json();
    assert!(summary.is_active);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.present, 3);
    assert_eq!(summary.inside, 1);
    assert_eq!(summary.outside, 1);
    assert_eq!(summary.unknown, 1);

    let records: Vec<Value> = server
        .get(&format!("/sessions/{}/attendance", session_id))
        .await
        .json();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["studentId"], "stu-300");
}
