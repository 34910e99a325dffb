//! Telemetry for the attendance engine.
//!
//! Metrics live in process and are periodically written to the log by the
//! worker; there is no external metrics backend.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
