//! ## ironwall-telemetry::metrics
//! **Prometheus counters for classification and monitoring**
//!
//! Each recorder owns its registry, so several can coexist in one process.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub packets: IntCounterVec,
    pub security_events: IntCounter,
    pub blocked_ips: IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();
        let packets = IntCounterVec::new(
            Opts::new("ironwall_packets_total", "Classified packets by resulting action"),
            &["action"],
        )?;
        let security_events = IntCounter::new(
            "ironwall_security_events_total",
            "Security events recorded by the monitor",
        )?;
        let blocked_ips = IntGauge::new("ironwall_blocked_ips", "Currently blocked source addresses")?;

        registry.register(Box::new(packets.clone()))?;
        registry.register(Box::new(security_events.clone()))?;
        registry.register(Box::new(blocked_ips.clone()))?;

        Ok(Self {
            registry,
            packets,
            security_events,
            blocked_ips,
        })
    }

    /// Counts one packet under the given action label (`allow`, `deny`, `log`, `blocked`).
    pub fn record_packet(&self, action: &str) {
        self.packets.with_label_values(&[action]).inc();
    }

    pub fn inc_security_events(&self) {
        self.security_events.inc();
    }

    pub fn set_blocked_ips(&self, count: usize) {
        self.blocked_ips.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn gather_metrics(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_exported() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.record_packet("allow");
        metrics.record_packet("allow");
        metrics.record_packet("deny");
        metrics.inc_security_events();
        metrics.set_blocked_ips(3);

        let output = metrics.gather_metrics().unwrap();
        assert!(output.contains(r#"ironwall_packets_total{action="allow"} 2"#));
        assert!(output.contains(r#"ironwall_packets_total{action="deny"} 1"#));
        assert!(output.contains("ironwall_security_events_total 1"));
        assert!(output.contains("ironwall_blocked_ips 3"));
    }

    #[test]
    fn test_independent_registries() {
        let first = MetricsRecorder::new().unwrap();
        let second = MetricsRecorder::new().unwrap();
        first.inc_security_events();

        assert_eq!(first.security_events.get(), 1);
        assert_eq!(second.security_events.get(), 0);
    }
}
