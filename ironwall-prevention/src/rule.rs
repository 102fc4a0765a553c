//! ## ironwall-prevention::rule
//! **Match predicates over packet descriptors**
//!
//! A [`Rule`] pairs a predicate with an action and a priority. Any field left
//! unset is a wildcard; any field that is set must equal the packet's field,
//! and a packet that omits the field never satisfies it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Disposition for traffic matched by a rule (or by the default policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
    Log,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
            RuleAction::Log => "log",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable fields of an inbound connection attempt.
///
/// Every field is optional; an absent field is "unspecified" and will not
/// satisfy a rule that requires a specific value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl PacketDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_ip(mut self, addr: impl Into<String>) -> Self {
        self.source_ip = Some(addr.into());
        self
    }

    pub fn with_dest_ip(mut self, addr: impl Into<String>) -> Self {
        self.dest_ip = Some(addr.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }
}

/// A named, prioritized predicate mapped to an action.
///
/// Fields are fixed once built. Higher `priority` is evaluated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    name: String,
    action: RuleAction,
    source_ip: Option<String>,
    dest_ip: Option<String>,
    port: Option<u16>,
    protocol: Option<String>,
    priority: i32,
}

impl Rule {
    /// Start building a rule. Every match field begins as a wildcard and the
    /// priority as `0`.
    pub fn builder(name: impl Into<String>, action: RuleAction) -> RuleBuilder {
        RuleBuilder {
            rule: Rule {
                name: name.into(),
                action,
                source_ip: None,
                dest_ip: None,
                port: None,
                protocol: None,
                priority: 0,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    pub fn dest_ip(&self) -> Option<&str> {
        self.dest_ip.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns `true` when every set field equals the packet's field.
    pub fn matches(&self, packet: &PacketDescriptor) -> bool {
        field_matches(self.source_ip.as_deref(), packet.source_ip.as_deref())
            && field_matches(self.dest_ip.as_deref(), packet.dest_ip.as_deref())
            && field_matches(self.port.as_ref(), packet.port.as_ref())
            && field_matches(self.protocol.as_deref(), packet.protocol.as_deref())
    }
}

#[inline]
fn field_matches<T: PartialEq + ?Sized>(expected: Option<&T>, actual: Option<&T>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual == Some(expected),
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_any(field: Option<&str>) -> &str {
            field.unwrap_or("*")
        }

        let port = self
            .port
            .map_or_else(|| "*".to_string(), |p| p.to_string());
        write!(
            f,
            "{} [{}] src={} dst={} port={} proto={} priority={}",
            self.name,
            self.action,
            or_any(self.source_ip()),
            or_any(self.dest_ip()),
            port,
            or_any(self.protocol()),
            self.priority
        )
    }
}

/// Builder for [`Rule`].
///
/// Empty strings and a zero port are treated as "not set" so that callers
/// forwarding blank form fields get a wildcard instead of an unmatchable rule.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    pub fn source_ip(mut self, addr: impl Into<String>) -> Self {
        self.rule.source_ip = non_empty(addr.into());
        self
    }

    pub fn dest_ip(mut self, addr: impl Into<String>) -> Self {
        self.rule.dest_ip = non_empty(addr.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.rule.port = (port != 0).then_some(port);
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.rule.protocol = non_empty(protocol.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.rule.priority = priority;
        self
    }

    pub fn build(self) -> Rule {
        self.rule
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
