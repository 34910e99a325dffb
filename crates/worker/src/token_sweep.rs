//! Garbage collection of expired tokens.
//!
//! Expired tokens can never validate again, so they are deleted outright
//! with no grace period.

use attendance_core::Result;
use attendance_store::AttendanceStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TokenSweeper {
    store: Arc<dyn AttendanceStore>,
}

impl TokenSweeper {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Deletes tokens that expired at or before `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let purged = self.store.purge_expired_tokens(now).await?;
        telemetry::metrics().tokens_swept.inc_by(purged as u64);

        if purged > 0 {
            info!(purged, "Swept expired tokens");
        } else {
            debug!("No expired tokens to sweep");
        }
        Ok(purged)
    }

    pub async fn run(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }
}
