//! Persistence for the attendance engine.

pub mod config;
pub mod health;
pub mod memory;
pub mod store;

use std::sync::Arc;
use tracing::info;

pub use config::*;
pub use memory::MemoryStore;
pub use store::*;

/// Builds the configured backend.
pub fn open_store(config: &StoreConfig) -> Arc<dyn AttendanceStore> {
    match config.backend {
        StoreBackend::Memory => {
            info!(capacity = config.initial_capacity, "Using in-memory attendance store");
            Arc::new(MemoryStore::with_config(config))
        }
    }
}
