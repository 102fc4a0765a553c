//! # Ironwall Monitor
//!
//! Keeps a log of security events keyed by source address and blocks any
//! source whose cumulative event count reaches the threat threshold.

pub mod event;
pub mod monitor;

pub use event::{SecurityEvent, Severity, SeverityError};
pub use monitor::{EventFilter, MonitorStatistics, SecurityMonitor, DEFAULT_THREAT_THRESHOLD};
