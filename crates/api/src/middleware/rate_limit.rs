//! Per-client scan rate limiting.

use attendance_core::{error::RateLimitErrorCode, Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Token bucket rate limiter keyed by client.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained scans per second per student and client
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Burst size
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Buckets idle this long are dropped by cleanup
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
}

fn default_rate() -> u32 {
    5
}

fn default_burst() -> u32 {
    20
}

fn default_idle_secs() -> u64 {
    600
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            burst: default_burst(),
            idle_secs: default_idle_secs(),
        }
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(burst: u32) -> Self {
        Self {
            tokens: burst as f64,
            last_update: Instant::now(),
        }
    }

    /// Takes one token, or returns how long until one is available.
    fn try_acquire(&mut self, rate: u32, burst: u32) -> std::result::Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        self.tokens = (self.tokens + elapsed * rate as f64).min(burst as f64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / rate.max(1) as f64))
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admits one request for `key`, or fails with `RATE_001`.
    pub fn check(&self, key: &str) -> Result<()> {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.burst));

        bucket
            .try_acquire(self.config.rate, self.config.burst)
            .map_err(|wait| {
                let retry_after = wait.as_secs_f64().ceil().max(1.0) as u64;
                Error::rate_limit(
                    RateLimitErrorCode::Exceeded,
                    "Too many scans, slow down",
                    Some(retry_after),
                )
            })
    }

    /// Drops buckets idle for longer than `max_age`.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let mut buckets = self.buckets.lock();
        let before = buckets.len();
        let now = Instant::now();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
        before - buckets.len()
    }

    pub fn cleanup_stale(&self) -> usize {
        self.cleanup(Duration::from_secs(self.config.idle_secs))
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Bucket key for a scan: one bucket per student per client address.
///
/// A whole class often arrives through one NAT address, so the address alone
/// must never be the key.
pub fn scan_key(client_ip: Option<&str>, student_id: &str) -> String {
    match client_ip {
        Some(ip) => format!("{}|student:{}", ip, student_id),
        None => format!("student:{}", student_id),
    }
}
