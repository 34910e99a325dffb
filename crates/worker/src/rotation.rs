//! Per-session token rotation.
//!
//! Each active session gets one task that issues a token immediately and
//! then every interval until the session ends. Tasks stop when signalled
//! through their watch channel or when issuance reports the session gone.

use attendance_core::Error;
use engine::TokenService;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct RotationHandle {
    generation: u64,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

type Handles = Arc<Mutex<HashMap<Uuid, RotationHandle>>>;

/// Owns the rotation task of every active session.
#[derive(Clone)]
pub struct RotationRegistry {
    tokens: TokenService,
    handles: Handles,
    generation: Arc<AtomicU64>,
}

impl RotationRegistry {
    pub fn new(tokens: TokenService) -> Self {
        Self {
            tokens,
            handles: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts rotating tokens for a session. Returns false if a rotation is
    /// already running for it.
    pub fn start(&self, session_id: Uuid) -> bool {
        let mut handles = self.handles.lock();
        if handles.contains_key(&session_id) {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = watch::channel(false);
        let task = tokio::spawn(rotate(
            self.tokens.clone(),
            session_id,
            cancelled,
            self.handles.clone(),
            generation,
        ));

        handles.insert(
            session_id,
            RotationHandle {
                generation,
                cancel,
                task,
            },
        );
        telemetry::metrics().active_rotations.inc();
        info!(session_id = %session_id, "Token rotation started");
        true
    }

    /// Signals a session's rotation to stop. Returns false if none was running.
    pub fn stop(&self, session_id: Uuid) -> bool {
        match self.handles.lock().remove(&session_id) {
            Some(handle) => {
                let _ = handle.cancel.send(true);
                telemetry::metrics().active_rotations.dec();
                info!(session_id = %session_id, "Token rotation stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, session_id: Uuid) -> bool {
        self.handles.lock().contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops every rotation and waits for the tasks to finish.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.handles.lock().drain().collect();
        let count = drained.len();

        for (_, handle) in &drained {
            let _ = handle.cancel.send(true);
        }
        for (session_id, handle) in drained {
            telemetry::metrics().active_rotations.dec();
            if let Err(e) = handle.task.await {
                warn!(session_id = %session_id, error = %e, "Rotation task panicked");
            }
        }

        info!(stopped = count, "All token rotations stopped");
    }
}

async fn rotate(
    tokens: TokenService,
    session_id: Uuid,
    mut cancelled: watch::Receiver<bool>,
    handles: Handles,
    generation: u64,
) {
    let interval = tokens
        .lifetime()
        .to_std()
        .unwrap_or(std::time::Duration::from_millis(
            attendance_core::limits::ROTATION_INTERVAL_MS,
        ));

    loop {
        if *cancelled.borrow() {
            break;
        }

        match tokens.issue(session_id).await {
            Ok(_) => telemetry::health().rotation.set_healthy(),
            Err(Error::Session { code, .. }) => {
                debug!(
                    session_id = %session_id,
                    code,
                    "Session no longer active, rotation exiting"
                );
                break;
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Token issue failed, retrying next tick"
                );
                telemetry::health()
                    .rotation
                    .set_unhealthy(format!("issue failed for {}: {}", session_id, e));
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = cancelled.changed() => {
                // A dropped sender means the registry is gone.
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }
        }
    }

    // Self-terminated: clear our own entry, but not a newer one.
    let mut handles = handles.lock();
    if handles
        .get(&session_id)
        .is_some_and(|h| h.generation == generation)
    {
        handles.remove(&session_id);
        telemetry::metrics().active_rotations.dec();
    }
}
