//! Firewall configuration.
//!
//! Declares the default policy and the rule set loaded at startup.

use ironwall_prevention::{Firewall, Rule, RuleAction};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::error::ConfigError;
use crate::validation;

/// Firewall configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FirewallConfig {
    /// Action for packets no rule matches.
    #[serde(default = "default_action")]
    pub default_action: RuleAction,

    /// Rules registered at startup.
    #[validate(nested)]
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_action() -> RuleAction {
    RuleAction::Deny
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            default_action: default_action(),
            rules: Vec::new(),
        }
    }
}

impl FirewallConfig {
    /// Builds a firewall holding every configured rule.
    ///
    /// Fails if two rules share a name.
    pub fn build_firewall(&self) -> Result<Firewall, ConfigError> {
        let firewall = Firewall::with_default_action(self.default_action);
        for rule in &self.rules {
            firewall.add_rule(rule.to_rule())?;
        }
        Ok(firewall)
    }
}

/// A single configured rule. Omitted match fields are wildcards.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RuleConfig {
    #[validate(custom(function = validation::validate_rule_name))]
    pub name: String,

    pub action: RuleAction,

    #[validate(custom(function = validation::validate_address))]
    #[serde(default)]
    pub source_ip: Option<String>,

    #[validate(custom(function = validation::validate_address))]
    #[serde(default)]
    pub dest_ip: Option<String>,

    #[validate(range(min = 1))]
    #[serde(default)]
    pub port: Option<u16>,

    #[validate(custom(function = validation::validate_protocol))]
    #[serde(default)]
    pub protocol: Option<String>,

    /// Higher values are evaluated first.
    #[serde(default)]
    pub priority: i32,
}

impl RuleConfig {
    pub fn to_rule(&self) -> Rule {
        let mut builder = Rule::builder(self.name.as_str(), self.action).priority(self.priority);
        if let Some(addr) = &self.source_ip {
            builder = builder.source_ip(addr.as_str());
        }
        if let Some(addr) = &self.dest_ip {
            builder = builder.dest_ip(addr.as_str());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(protocol) = &self.protocol {
            builder = builder.protocol(protocol.as_str());
        }
        builder.build()
    }
}
