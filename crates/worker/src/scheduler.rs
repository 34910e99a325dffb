//! Worker scheduler for background tasks.

use attendance_store::{health::check_connection, AttendanceStore};
use engine::EventBus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::notifications::NotificationRelay;
use crate::token_sweep::TokenSweeper;

/// Worker scheduler configuration, read from the `workers` config table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Expired-token sweep interval
    #[serde(default = "default_token_sweep_interval_ms")]
    pub token_sweep_interval_ms: u64,
    /// Metrics log and store health probe interval
    #[serde(default = "default_metrics_log_interval_secs")]
    pub metrics_log_interval_secs: u64,
}

fn default_token_sweep_interval_ms() -> u64 {
    30_000
}

fn default_metrics_log_interval_secs() -> u64 {
    60
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            token_sweep_interval_ms: default_token_sweep_interval_ms(),
            metrics_log_interval_secs: default_metrics_log_interval_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn token_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.token_sweep_interval_ms.max(1))
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_log_interval_secs.max(1))
    }
}

/// Background worker scheduler.
///
/// Per-session rotation is owned by [`crate::RotationRegistry`]; this runs
/// the service-wide loops.
pub struct WorkerScheduler {
    config: WorkerConfig,
    store: Arc<dyn AttendanceStore>,
    events: EventBus,
    shutdown: watch::Receiver<bool>,
}

impl WorkerScheduler {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn AttendanceStore>,
        events: EventBus,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            store,
            events,
            shutdown,
        }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_token_sweeper().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_log().await;
        }));

        let relay = NotificationRelay::new(self.events.subscribe());
        let shutdown = self.shutdown.clone();
        handles.push(tokio::spawn(async move {
            relay.run(shutdown).await;
        }));

        info!("Background workers started");
        handles
    }

    async fn run_token_sweeper(&self) {
        let sweeper = TokenSweeper::new(self.store.clone());
        let mut ticker = interval(self.config.token_sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = sweeper.run().await {
                        error!("Token sweep error: {}", e);
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("Token sweeper stopped");
    }

    async fn run_metrics_log(&self) {
        let mut ticker = interval(self.config.metrics_log_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if check_connection(self.store.as_ref()).await {
                        telemetry::health().store.set_healthy();
                    } else {
                        telemetry::health().store.set_unhealthy("store ping failed");
                    }
                    telemetry::log_snapshot(telemetry::metrics());
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("Metrics logger stopped");
    }
}
