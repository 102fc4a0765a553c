//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use std::net::IpAddr;

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref RULE_NAME: Regex = Regex::new("^[A-Za-z0-9_.-]+$").expect("valid rule name regex");
    static ref PROTOCOL: Regex = Regex::new("^[A-Za-z0-9]+$").expect("valid protocol regex");
}

/// Validate that a rule name is a non-empty identifier.
pub fn validate_rule_name(name: &str) -> Result<(), ValidationError> {
    if RULE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_rule_name"))
    }
}

/// Validate that a configured rule address is a literal IPv4 or IPv6 address.
pub fn validate_address(addr: &str) -> Result<(), ValidationError> {
    addr.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_ip_address"))
}

/// Validate a protocol name such as `TCP` or `UDP`.
pub fn validate_protocol(protocol: &str) -> Result<(), ValidationError> {
    if PROTOCOL.is_match(protocol) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_protocol"))
    }
}
