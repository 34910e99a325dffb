//! Store configuration.

use serde::{Deserialize, Serialize};

/// Which backend holds sessions, tokens, and records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Pre-allocated slots per table
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

fn default_initial_capacity() -> usize {
    256
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            initial_capacity: default_initial_capacity(),
        }
    }
}
