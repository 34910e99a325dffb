//! Request bodies and coordinates used across tests.

use serde_json::{json, Value};
use uuid::Uuid;

/// Faculty id sent in the identity header.
pub const FACULTY_ID: &str = "fac-001";

/// Campus center.
pub const CENTER: (f64, f64) = (12.9716, 77.5946);

/// About 1.5 km due north of the center.
pub const FAR_NORTH: (f64, f64) = (12.98509, 77.5946);

pub fn open_session_body(geofencing_enabled: bool) -> Value {
    json!({
        "semester": 5,
        "branch": "CSE",
        "subject": "Distributed Systems",
        "geofencingEnabled": geofencing_enabled,
    })
}

pub fn verify_body(
    session_id: Uuid,
    token: &str,
    student_id: &str,
    location: Option<(f64, f64)>,
) -> Value {
    let mut body = json!({
        "sessionId": session_id,
        "token": token,
        "studentId": student_id,
    });
    if let Some((lat, lng)) = location {
        body["latitude"] = json!(lat);
        body["longitude"] = json!(lng);
    }
    body
}

pub fn manual_body(student_id: &str, action: &str) -> Value {
    json!({ "studentId": student_id, "action": action })
}

