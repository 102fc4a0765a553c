//! Monitoring configuration.
//!
//! Defines the per-source event threshold used for automatic blocking.

use ironwall_monitor::{SecurityMonitor, DEFAULT_THREAT_THRESHOLD};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Monitoring configuration parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MonitorConfig {
    /// Events from one source before it is blocked.
    #[validate(range(min = 1))]
    #[serde(default = "default_threat_threshold")]
    pub threat_threshold: u32,
}

fn default_threat_threshold() -> u32 {
    DEFAULT_THREAT_THRESHOLD
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threat_threshold: default_threat_threshold(),
        }
    }
}

impl MonitorConfig {
    pub fn build_monitor(&self) -> SecurityMonitor {
        SecurityMonitor::with_threshold(self.threat_threshold)
    }
}
