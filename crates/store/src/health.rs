//! Store health checks.

use crate::store::AttendanceStore;
use tracing::{debug, error};

/// Check store health.
pub async fn check_connection(store: &dyn AttendanceStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            debug!("Attendance store healthy");
            true
        }
        Err(e) => {
            error!("Attendance store health check failed: {}", e);
            false
        }
    }
}
