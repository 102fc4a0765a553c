//! Security event records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeverityError {
    #[error("Unknown severity level: {0}")]
    Unknown(String),
}

/// How serious an observed occurrence is, from informational to critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(SeverityError::Unknown(s.to_string())),
        }
    }
}

/// An observed security-relevant occurrence tied to a source address.
///
/// The timestamp is captured when the event is constructed, not when it is
/// logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityEvent {
    event_type: String,
    source_ip: String,
    description: String,
    severity: Severity,
    timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(
        event_type: impl Into<String>,
        source_ip: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source_ip: source_ip.into(),
            description: description.into(),
            severity,
            timestamp: Utc::now(),
        }
    }

    /// Event with [`Severity::Info`].
    pub fn info(
        event_type: impl Into<String>,
        source_ip: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(event_type, source_ip, description, Severity::Info)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source_ip(&self) -> &str {
        &self.source_ip
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} from {} at {}: {}",
            self.severity,
            self.event_type,
            self.source_ip,
            self.timestamp.to_rfc3339(),
            self.description
        )
    }
}
