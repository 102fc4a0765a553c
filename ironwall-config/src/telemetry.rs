//! Observability configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[validate(length(min = 1))]
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Collect Prometheus metrics.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            metrics: default_true(),
        }
    }
}
