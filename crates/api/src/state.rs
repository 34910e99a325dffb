//! Application state shared across handlers.

use attendance_store::AttendanceStore;
use engine::{AttendanceEngine, EngineConfig, EventBus, Services, SessionService, TokenService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use worker::RotationRegistry;

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};

/// How often idle rate-limit buckets are dropped.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AttendanceStore>,
    pub sessions: SessionService,
    pub tokens: TokenService,
    pub attendance: AttendanceEngine,
    pub events: EventBus,
    /// Token rotation per active session
    pub rotations: RotationRegistry,
    /// Scan rate limiter
    pub rate_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn AttendanceStore>, config: &EngineConfig) -> Self {
        Self::with_rate_limit(store, config, RateLimitConfig::default())
    }

    /// Create with custom rate limit config.
    pub fn with_rate_limit(
        store: Arc<dyn AttendanceStore>,
        config: &EngineConfig,
        rate_config: RateLimitConfig,
    ) -> Self {
        let Services {
            sessions,
            tokens,
            attendance,
            events,
        } = Services::new(store.clone(), config);

        Self {
            store,
            sessions,
            rotations: RotationRegistry::new(tokens.clone()),
            tokens,
            attendance,
            events,
            rate_limiter: Arc::new(RateLimiter::new(rate_config)),
        }
    }

    /// Start the rate limiter cleanup background task.
    pub fn start_rate_limiter_cleanup(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let dropped = rate_limiter.cleanup_stale();
                        debug!(dropped, "Rate limiter cleanup");
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }
}
