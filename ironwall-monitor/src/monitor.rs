//! Monitor Module
//!
//! Provides the event log and threshold-based blocking.
//!
//! A source moves to "blocked" when its cumulative event count reaches the
//! threat threshold or when it is blocked explicitly. Only [`SecurityMonitor::unblock_ip`]
//! moves it back. Counts are never reset by unblocking, so the next event from
//! a source already at or above the threshold blocks it again.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::event::{SecurityEvent, Severity};

pub const DEFAULT_THREAT_THRESHOLD: u32 = 5;

/// Counters reported by [`SecurityMonitor::get_statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStatistics {
    pub total_events: usize,
    pub blocked_ips: usize,
    /// Distinct sources logged since the last clear. Unaffected by unblocking.
    pub unique_sources: usize,
}

/// Conjunction of optional predicates for [`SecurityMonitor::get_events`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub source_ip: Option<String>,
    pub severity: Option<Severity>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_ip(mut self, addr: impl Into<String>) -> Self {
        self.source_ip = Some(addr.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn matches(&self, event: &SecurityEvent) -> bool {
        self.source_ip
            .as_deref()
            .map_or(true, |addr| event.source_ip() == addr)
            && self
                .severity
                .map_or(true, |severity| event.severity() == severity)
    }
}

#[derive(Debug)]
struct MonitorState {
    events: Vec<SecurityEvent>,
    blocked: HashSet<String>,
    event_counts: HashMap<String, u32>,
    threat_threshold: u32,
}

#[derive(Debug)]
pub struct SecurityMonitor {
    state: RwLock<MonitorState>,
}

impl SecurityMonitor {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THREAT_THRESHOLD)
    }

    /// Creates a monitor with the given threshold; `0` falls back to the default.
    pub fn with_threshold(threat_threshold: u32) -> Self {
        let threat_threshold = if threat_threshold > 0 {
            threat_threshold
        } else {
            DEFAULT_THREAT_THRESHOLD
        };
        Self {
            state: RwLock::new(MonitorState {
                events: Vec::new(),
                blocked: HashSet::new(),
                event_counts: HashMap::new(),
                threat_threshold,
            }),
        }
    }

    /// Appends an event and blocks its source once the count reaches the threshold.
    pub fn log_event(&self, event: SecurityEvent) {
        let mut state = self.state.write();
        let source = event.source_ip().to_string();
        let count = {
            let count = state.event_counts.entry(source.clone()).or_insert(0);
            *count += 1;
            *count
        };
        debug!(
            source = %source,
            event_type = event.event_type(),
            severity = %event.severity(),
            count,
            "security event logged"
        );
        state.events.push(event);

        if count >= state.threat_threshold && state.blocked.insert(source.clone()) {
            warn!(
                source = %source,
                count,
                threshold = state.threat_threshold,
                "threat threshold reached, auto-blocking source"
            );
        }
    }

    pub fn block_ip(&self, addr: &str) {
        if self.state.write().blocked.insert(addr.to_string()) {
            info!(source = addr, "source blocked");
        }
    }

    /// Returns `false` if the address was not blocked. Its event count is kept.
    pub fn unblock_ip(&self, addr: &str) -> bool {
        let removed = self.state.write().blocked.remove(addr);
        if removed {
            info!(source = addr, "source unblocked");
        }
        removed
    }

    pub fn is_blocked(&self, addr: &str) -> bool {
        self.state.read().blocked.contains(addr)
    }

    /// Events matching `filter`, in the order they were logged.
    pub fn get_events(&self, filter: &EventFilter) -> Vec<SecurityEvent> {
        self.state
            .read()
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn get_statistics(&self) -> MonitorStatistics {
        let state = self.state.read();
        MonitorStatistics {
            total_events: state.events.len(),
            blocked_ips: state.blocked.len(),
            unique_sources: state.event_counts.len(),
        }
    }

    /// Empties the log and the per-source counts. Blocked sources stay blocked.
    pub fn clear_events(&self) {
        let mut state = self.state.write();
        state.events.clear();
        state.event_counts.clear();
        info!("security event log cleared");
    }

    /// Sets the threshold for subsequent events. Zero is ignored.
    ///
    /// Existing counts are not re-evaluated against the new value.
    pub fn set_threat_threshold(&self, threshold: u32) {
        if threshold == 0 {
            warn!("ignoring threat threshold of 0");
            return;
        }
        self.state.write().threat_threshold = threshold;
    }

    pub fn threat_threshold(&self) -> u32 {
        self.state.read().threat_threshold
    }

    /// Cumulative number of events logged for `addr` since the last clear.
    pub fn event_count(&self, addr: &str) -> u32 {
        self.state
            .read()
            .event_counts
            .get(addr)
            .copied()
            .unwrap_or(0)
    }

    /// Sorted snapshot of the blocked sources.
    pub fn blocked_ips(&self) -> Vec<String> {
        let mut blocked: Vec<String> = self.state.read().blocked.iter().cloned().collect();
        blocked.sort();
        blocked
    }
}

impl Default for SecurityMonitor {
    fn default() -> Self {
        Self::new()
    }
}
