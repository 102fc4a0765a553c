//! # Ironwall Prevention
//!
//! Crate for the rule-based packet classifier. Rules are evaluated in
//! priority order and the first match decides the packet's disposition.

pub mod firewall;
pub mod rule;

pub use firewall::{Decision, Firewall, FirewallError};
pub use rule::{PacketDescriptor, Rule, RuleAction, RuleBuilder};
