//! Concurrent marking against the shared application state.

use attendance_core::schema::{ManualMarkRequest, VerifyRequest};
use attendance_core::ManualAction;
use attendance_store::AttendanceStore;
use axum::http::StatusCode;
use integration_tests::fixtures::{self, CENTER, FACULTY_ID};
use integration_tests::setup::TestContext;
use std::future::IntoFuture;

#[tokio::test]
async fn test_simultaneous_double_scan_over_http() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;
    let body = fixtures::verify_body(session_id, &token, "stu-500", Some(CENTER));

    let (a, b) = tokio::join!(
        server.post("/attendance/verify").json(&body).into_future(),
        server.post("/attendance/verify").json(&body).into_future(),
    );

    let mut statuses = [a.status_code(), b.status_code()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_concurrent_marks_for_one_student() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let attempts = 48;
    let handles: Vec<_> = (0..attempts)
        .map(|i| {
            let engine = ctx.state.attendance.clone();
            let token = token.clone();
            tokio::spawn(async move {
                if i % 3 == 0 {
                    let request = ManualMarkRequest {
                        student_id: "stu-501".into(),
                        action: ManualAction::Present,
                    };
                    engine.manual_mark(session_id, &request, FACULTY_ID).await
                } else {
                    let request = VerifyRequest {
                        session_id,
                        token,
                        student_id: "stu-501".into(),
                        latitude: Some(CENTER.0),
                        longitude: Some(CENTER.1),
                    };
                    engine.verify_scan(&request).await
                }
            })
        })
        .collect();

    let mut accepted = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) if e.is_duplicate() => duplicates += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(duplicates, attempts - 1);
    assert_eq!(ctx.store.count_attendance(session_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_scans_for_distinct_students() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let session_id = ctx.open_session(&server, true).await;
    let token = ctx.live_token(&server, session_id).await;

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let engine = ctx.state.attendance.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let request = VerifyRequest {
                    session_id,
                    token,
                    student_id: format!("stu-6{:02}", i),
                    latitude: None,
                    longitude: None,
                };
                engine.verify_scan(&request).await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let summary = ctx.state.attendance.summary(session_id).await.unwrap();
    assert_eq!(summary.total, 40);
    assert_eq!(summary.unknown, 40);
}
