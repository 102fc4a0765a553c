//! Traffic replay through the firewall and the security monitor.
//!
//! Per packet:
//! 1. a source already on the block list is dropped and logged as `BLOCKED_TRAFFIC`;
//! 2. otherwise the firewall decides;
//! 3. a denied packet is logged as `DENIED_CONNECTION`, which may push its
//!    source over the threat threshold.
//!
//! Packets without a source address are classified but never reach the monitor.

use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::Context;
use ironwall_monitor::{MonitorStatistics, SecurityEvent, SecurityMonitor, Severity};
use ironwall_prevention::{Decision, Firewall, PacketDescriptor, RuleAction};
use ironwall_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Source was on the block list; the firewall was not consulted.
    Blocked,
    Allowed { rule: Option<String> },
    Logged { rule: Option<String> },
    Denied { rule: Option<String> },
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn by(rule: &Option<String>) -> String {
            match rule {
                Some(name) => format!("by rule {name}"),
                None => "by default policy".to_string(),
            }
        }

        match self {
            Disposition::Blocked => f.write_str("BLOCKED source is on the block list"),
            Disposition::Allowed { rule } => write!(f, "ALLOWED {}", by(rule)),
            Disposition::Logged { rule } => write!(f, "LOGGED {}", by(rule)),
            Disposition::Denied { rule } => write!(f, "DENIED {}", by(rule)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PacketOutcome {
    pub packet: PacketDescriptor,
    pub disposition: Disposition,
    /// The monitor blocked the source while handling this packet.
    pub newly_blocked: bool,
}

#[derive(Debug)]
pub struct ReplayReport {
    pub outcomes: Vec<PacketOutcome>,
    pub statistics: MonitorStatistics,
    /// Blocked sources with their cumulative event counts, sorted by address.
    pub blocked: Vec<(String, u32)>,
}

pub struct TrafficReplay<'a> {
    firewall: &'a Firewall,
    monitor: &'a SecurityMonitor,
    metrics: Option<&'a MetricsRecorder>,
}

impl<'a> TrafficReplay<'a> {
    pub fn new(firewall: &'a Firewall, monitor: &'a SecurityMonitor) -> Self {
        Self {
            firewall,
            monitor,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: &'a MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn process(&self, packet: &PacketDescriptor) -> PacketOutcome {
        let source = packet.source_ip.as_deref();

        if let Some(src) = source.filter(|src| self.monitor.is_blocked(src)) {
            self.count_packet("blocked");
            self.record(SecurityEvent::new(
                "BLOCKED_TRAFFIC",
                src,
                "Traffic from blocked source",
                Severity::Medium,
            ))
            .await;
            return PacketOutcome {
                packet: packet.clone(),
                disposition: Disposition::Blocked,
                newly_blocked: false,
            };
        }

        let Decision { action, rule } = self.firewall.check_packet(packet);
        self.count_packet(action.as_str());

        let mut newly_blocked = false;
        let disposition = match action {
            RuleAction::Allow => Disposition::Allowed { rule },
            RuleAction::Log => {
                EventLogger::log_event("LOGGED_TRAFFIC", packet_metadata(packet, rule.as_deref()))
                    .await;
                Disposition::Logged { rule }
            }
            RuleAction::Deny => {
                if let Some(src) = source {
                    let description = match packet.port {
                        Some(port) => format!("Denied connection attempt to port {port}"),
                        None => "Denied connection attempt".to_string(),
                    };
                    self.record(SecurityEvent::new(
                        "DENIED_CONNECTION",
                        src,
                        description,
                        Severity::Low,
                    ))
                    .await;
                    newly_blocked = self.monitor.is_blocked(src);
                }
                Disposition::Denied { rule }
            }
        };

        PacketOutcome {
            packet: packet.clone(),
            disposition,
            newly_blocked,
        }
    }

    pub async fn run(&self, packets: &[PacketDescriptor]) -> ReplayReport {
        let mut outcomes = Vec::with_capacity(packets.len());
        for packet in packets {
            outcomes.push(self.process(packet).await);
        }

        let blocked = self
            .monitor
            .blocked_ips()
            .into_iter()
            .map(|addr| {
                let count = self.monitor.event_count(&addr);
                (addr, count)
            })
            .collect();

        ReplayReport {
            outcomes,
            statistics: self.monitor.get_statistics(),
            blocked,
        }
    }

    async fn record(&self, event: SecurityEvent) {
        EventLogger::log_event(
            event.event_type(),
            vec![
                KeyValue::new("source_ip", event.source_ip().to_string()),
                KeyValue::new("severity", event.severity().as_str()),
                KeyValue::new("description", event.description().to_string()),
            ],
        )
        .await;
        self.monitor.log_event(event);

        if let Some(metrics) = self.metrics {
            metrics.inc_security_events();
            metrics.set_blocked_ips(self.monitor.get_statistics().blocked_ips);
        }
    }

    fn count_packet(&self, label: &str) {
        if let Some(metrics) = self.metrics {
            metrics.record_packet(label);
        }
    }
}

fn packet_metadata(packet: &PacketDescriptor, rule: Option<&str>) -> Vec<KeyValue> {
    let mut metadata = Vec::with_capacity(5);
    if let Some(addr) = &packet.source_ip {
        metadata.push(KeyValue::new("source_ip", addr.clone()));
    }
    if let Some(addr) = &packet.dest_ip {
        metadata.push(KeyValue::new("dest_ip", addr.clone()));
    }
    if let Some(port) = packet.port {
        metadata.push(KeyValue::new("port", i64::from(port)));
    }
    if let Some(protocol) = &packet.protocol {
        metadata.push(KeyValue::new("protocol", protocol.clone()));
    }
    if let Some(rule) = rule {
        metadata.push(KeyValue::new("rule", rule.to_string()));
    }
    metadata
}

/// Reads a YAML sequence of packet descriptors.
pub fn load_traffic(path: &Path) -> anyhow::Result<Vec<PacketDescriptor>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open traffic file {}", path.display()))?;
    serde_yaml::from_reader(file)
        .with_context(|| format!("failed to parse traffic file {}", path.display()))
}
