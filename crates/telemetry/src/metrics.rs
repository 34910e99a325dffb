//! In-process metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge that never drops below zero.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }
}

/// Latency histogram with millisecond buckets.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 2ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, +Inf
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [1, 2, 5, 10, 25, 50, 100, 250, 500, 1000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_duration(&self, elapsed: Duration) {
        self.observe(elapsed.as_millis().min(u64::MAX as u128) as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Upper bound of the bucket holding the given quantile, `None` if empty.
    /// Values past the last bound report `u64::MAX`.
    pub fn quantile_bound(&self, q: f64) -> Option<u64> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let target = ((count as f64) * q.clamp(0.0, 1.0)).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (i, bucket) in self.buckets.iter().enumerate() {
            seen += bucket.load(Ordering::Relaxed);
            if seen >= target {
                return Some(Self::BUCKET_BOUNDS.get(i).copied().unwrap_or(u64::MAX));
            }
        }
        Some(u64::MAX)
    }
}

/// Counters for the attendance engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Scan pipeline
    pub scans_received: Counter,
    pub scans_accepted: Counter,
    pub invalid_tokens: Counter,
    pub duplicate_attempts: Counter,
    pub validation_failures: Counter,
    pub rate_limited_requests: Counter,

    // Faculty actions
    pub manual_marks: Counter,
    pub sessions_opened: Counter,
    pub sessions_ended: Counter,

    // Token lifecycle
    pub tokens_issued: Counter,
    pub token_collisions: Counter,
    pub tokens_swept: Counter,

    // Storage
    pub storage_errors: Counter,

    // Latency
    pub mark_latency_ms: Histogram,

    // Gauges
    pub active_sessions: Gauge,
    pub active_rotations: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A point-in-time view of [`Metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub scans_received: u64,
    pub scans_accepted: u64,
    pub invalid_tokens: u64,
    pub duplicate_attempts: u64,
    pub validation_failures: u64,
    pub rate_limited_requests: u64,
    pub manual_marks: u64,
    pub sessions_opened: u64,
    pub sessions_ended: u64,
    pub tokens_issued: u64,
    pub token_collisions: u64,
    pub tokens_swept: u64,
    pub storage_errors: u64,
    pub mark_latency_mean_ms: f64,
    pub mark_latency_p99_ms: Option<u64>,
    pub active_sessions: u64,
    pub active_rotations: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            scans_received: self.scans_received.get(),
            scans_accepted: self.scans_accepted.get(),
            invalid_tokens: self.invalid_tokens.get(),
            duplicate_attempts: self.duplicate_attempts.get(),
            validation_failures: self.validation_failures.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            manual_marks: self.manual_marks.get(),
            sessions_opened: self.sessions_opened.get(),
            sessions_ended: self.sessions_ended.get(),
            tokens_issued: self.tokens_issued.get(),
            token_collisions: self.token_collisions.get(),
            tokens_swept: self.tokens_swept.get(),
            storage_errors: self.storage_errors.get(),
            mark_latency_mean_ms: self.mark_latency_ms.mean(),
            mark_latency_p99_ms: self.mark_latency_ms.quantile_bound(0.99),
            active_sessions: self.active_sessions.get(),
            active_rotations: self.active_rotations.get(),
        }
    }
}

/// Writes the current snapshot to the log as one structured line.
pub fn log_snapshot(metrics: &Metrics) {
    let s = metrics.snapshot();
    tracing::info!(
        scans_received = s.scans_received,
        scans_accepted = s.scans_accepted,
        invalid_tokens = s.invalid_tokens,
        duplicate_attempts = s.duplicate_attempts,
        manual_marks = s.manual_marks,
        tokens_issued = s.tokens_issued,
        tokens_swept = s.tokens_swept,
        storage_errors = s.storage_errors,
        mark_latency_mean_ms = s.mark_latency_mean_ms,
        active_sessions = s.active_sessions,
        active_rotations = s.active_rotations,
        "Attendance metrics"
    );
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
