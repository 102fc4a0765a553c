//! # Ironwall Configuration System
//!
//! Hierarchical configuration for the firewall, the security monitor and
//! telemetry.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files, then `IRONWALL_*` environment variables
//! - **Validation**: rule fields and thresholds are checked before anything is built

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod firewall;
mod monitor;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use firewall::{FirewallConfig, RuleConfig};
pub use monitor::MonitorConfig;
pub use telemetry::TelemetryConfig;

const BASE_CONFIG: &str = "config/ironwall.yaml";
const ENV_PREFIX: &str = "IRONWALL_";

/// Top‑level configuration container for all Ironwall components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct IronwallConfig {
    /// Default policy and rule set.
    #[validate(nested)]
    #[serde(default)]
    pub firewall: FirewallConfig,

    /// Auto-blocking threshold.
    #[validate(nested)]
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl IronwallConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/ironwall.yaml`, if present
    /// 3. `config/<IRONWALL_ENV>.yaml`, if present (`IRONWALL_ENV` defaults to `production`)
    /// 4. `IRONWALL_*` environment variables, nested with `__`
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(IronwallConfig::default()));

        if Path::new(BASE_CONFIG).exists() {
            figment = figment.merge(Yaml::file(BASE_CONFIG));
        }

        let env = std::env::var("IRONWALL_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honouring environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let figment = Figment::from(Serialized::defaults(IronwallConfig::default()))
            .merge(Yaml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use ironwall_prevention::{PacketDescriptor, RuleAction};

    #[test]
    fn full_config_validation() {
        let config = IronwallConfig::default();
        config.validate().expect("Default config should validate");
        assert_eq!(config.firewall.default_action, RuleAction::Deny);
        assert_eq!(config.monitor.threat_threshold, 5);
        assert_eq!(config.telemetry.log_filter, "info");
    }

    #[test]
    fn environment_override() {
        Jail::expect_with(|jail| {
            jail.set_env("IRONWALL_MONITOR__THREAT_THRESHOLD", "3");
            jail.set_env("IRONWALL_FIREWALL__DEFAULT_ACTION", "allow");

            let config = IronwallConfig::load().expect("config should load");
            assert_eq!(config.monitor.threat_threshold, 3);
            assert_eq!(config.firewall.default_action, RuleAction::Allow);
            Ok(())
        });
    }

    #[test]
    fn load_rules_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ironwall.yaml",
                r#"
firewall:
  default_action: deny
  rules:
    - name: allow_http
      action: allow
      port: 80
      protocol: TCP
      priority: 10
    - name: block_malicious_ip
      action: deny
      source_ip: 192.168.1.100
      priority: 20
monitor:
  threat_threshold: 2
"#,
            )?;

            let config = IronwallConfig::load_from_path("ironwall.yaml").expect("config should load");
            assert_eq!(config.monitor.threat_threshold, 2);
            assert_eq!(config.telemetry.log_filter, "info");

            let firewall = config.firewall.build_firewall().expect("rules should register");
            assert_eq!(firewall.len(), 2);
            let decision = firewall.check_packet(
                &PacketDescriptor::new()
                    .with_source_ip("192.168.1.100")
                    .with_port(80)
                    .with_protocol("TCP"),
            );
            assert_eq!(decision.action, RuleAction::Deny);
            assert_eq!(decision.rule.as_deref(), Some("block_malicious_ip"));
            Ok(())
        });
    }

    #[test]
    fn invalid_file_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "monitor:\n  threat_threshold: 0\n")?;

            let err = IronwallConfig::load_from_path("bad.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("monitor.threat_threshold"));
            Ok(())
        });
    }

    #[test]
    fn missing_file() {
        let err = IronwallConfig::load_from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
