//! Tracing setup for structured logging.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directive, e.g. "info" or "engine=debug,api=info"
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit one JSON object per line
    #[serde(default)]
    pub json: bool,
    /// Log span open/close
    #[serde(default)]
    pub span_events: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            span_events: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
///
/// Returns false if a subscriber was already installed.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = if config.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(filter = %config.filter, json = config.json, "Tracing initialized");
    }
    installed
}

/// Initialize tracing from `RUST_LOG` and `LOG_JSON`.
pub fn init_tracing_from_env() -> bool {
    let json = std::env::var("LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter());

    init_tracing(&TracingConfig::new().with_filter(filter).with_json(json))
}
