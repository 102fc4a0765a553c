//! # Ironwall Telemetry
//!
//! Crate for logging and metrics.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::{MetricsRecorder, TelemetryError};
