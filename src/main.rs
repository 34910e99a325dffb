//! Campus Attendance Engine
//!
//! Real-time QR attendance service:
//! - Faculty sessions with rotating, short-lived QR codes
//! - Student scan verification with campus geofencing
//! - At most one attendance record per student per session
//! - Background token rotation, expired-token sweeps, and metrics logging

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use api::{middleware::rate_limit::RateLimitConfig, router, AppState};
use attendance_store::{health::check_connection, open_store, StoreConfig};
use engine::{config::GeofenceConfig, EngineConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    rotation: RotationConfig,

    #[serde(default)]
    geofence: GeofenceConfig,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    workers: WorkerConfig,

    #[serde(default)]
    rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RotationConfig {
    /// Token lifetime and issue cadence
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_interval_ms() -> u64 {
    attendance_core::limits::ROTATION_INTERVAL_MS
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rotation: RotationConfig::default(),
            geofence: GeofenceConfig::default(),
            store: StoreConfig::default(),
            workers: WorkerConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    fn engine(&self) -> EngineConfig {
        EngineConfig {
            rotation_interval_ms: self.rotation.interval_ms,
            geofence: self.geofence.clone(),
            ..EngineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Campus Attendance Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config
        .engine()
        .validate()
        .context("Invalid rotation.interval_ms")?;

    info!(
        rotation_interval_ms = config.rotation.interval_ms,
        center_latitude = config.geofence.center_latitude,
        center_longitude = config.geofence.center_longitude,
        radius_meters = config.geofence.radius_meters,
        store = ?config.store.backend,
        "Loaded configuration"
    );

    let store = open_store(&config.store);

    if check_connection(store.as_ref()).await {
        health().store.set_healthy();
        info!("Attendance store: healthy");
    } else {
        health().store.set_unhealthy("Connection failed");
        error!("Attendance store: unhealthy");
    }
    // No rotations yet; nothing can be failing.
    health().rotation.set_healthy();

    let state = AppState::with_rate_limit(
        store.clone(),
        &config.engine(),
        config.rate_limit.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_scheduler = Arc::new(WorkerScheduler::new(
        config.workers.clone(),
        store.clone(),
        state.events.clone(),
        shutdown_rx.clone(),
    ));
    let worker_handles = worker_scheduler.start();

    let rate_limiter_cleanup = state.start_rate_limiter_cleanup(shutdown_rx);
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let rotations = state.rotations.clone();
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    rotations.shutdown().await;

    let _ = shutdown_tx.send(true);
    for handle in worker_handles.into_iter().chain([rate_limiter_cleanup]) {
        if let Err(e) = handle.await {
            warn!("Background task ended abnormally: {}", e);
        }
    }

    telemetry::log_snapshot(telemetry::metrics());
    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
///
/// Environment keys look like `ATTENDANCE__ROTATION__INTERVAL_MS`.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::with_prefix("ATTENDANCE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
