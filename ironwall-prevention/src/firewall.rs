//! ## ironwall-prevention::firewall
//! **Priority-ordered, first-match-wins packet classification**
//!
//! ### Expectations:
//! - Rules kept sorted by descending priority, ties in insertion order
//! - Classification never fails; unknown fields simply do not match
//! - Safe to share across threads behind an `Arc`
//!
//! Rule names are unique within a firewall, so lookup and removal by name
//! always refer to the same entry.
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::rule::{PacketDescriptor, Rule, RuleAction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FirewallError {
    #[error("A rule named '{name}' is already registered")]
    DuplicateRule { name: String },
}

/// Outcome of classifying a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: RuleAction,
    /// Name of the rule that matched, `None` when the default policy applied.
    pub rule: Option<String>,
}

impl Decision {
    pub fn is_default(&self) -> bool {
        self.rule.is_none()
    }
}

#[derive(Debug)]
struct RuleSet {
    rules: Vec<Rule>,
    default_action: RuleAction,
}

#[derive(Debug)]
pub struct Firewall {
    inner: RwLock<RuleSet>,
}

impl Firewall {
    /// Creates an empty firewall with a default-deny policy.
    pub fn new() -> Self {
        Self::with_default_action(RuleAction::Deny)
    }

    pub fn with_default_action(default_action: RuleAction) -> Self {
        Self {
            inner: RwLock::new(RuleSet {
                rules: Vec::new(),
                default_action,
            }),
        }
    }

    /// Registers a rule at its priority position.
    ///
    /// The rule lands after every existing rule of greater or equal priority,
    /// which keeps equal-priority rules in insertion order.
    pub fn add_rule(&self, rule: Rule) -> Result<(), FirewallError> {
        let mut set = self.inner.write();
        if set.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(FirewallError::DuplicateRule {
                name: rule.name().to_string(),
            });
        }

        let idx = set
            .rules
            .partition_point(|r| r.priority() >= rule.priority());
        debug!(rule = rule.name(), priority = rule.priority(), position = idx, "rule added");
        set.rules.insert(idx, rule);
        Ok(())
    }

    /// Removes the rule with the given name. Returns `false` if none existed.
    pub fn remove_rule(&self, name: &str) -> bool {
        let mut set = self.inner.write();
        match set.rules.iter().position(|r| r.name() == name) {
            Some(pos) => {
                set.rules.remove(pos);
                debug!(rule = name, "rule removed");
                true
            }
            None => false,
        }
    }

    pub fn get_rule(&self, name: &str) -> Option<Rule> {
        self.inner
            .read()
            .rules
            .iter()
            .find(|r| r.name() == name)
            .cloned()
    }

    /// Classifies a packet against the rules in priority order.
    pub fn check_packet(&self, packet: &PacketDescriptor) -> Decision {
        let set = self.inner.read();
        set.rules
            .iter()
            .find(|r| r.matches(packet))
            .map_or(
                Decision {
                    action: set.default_action,
                    rule: None,
                },
                |r| Decision {
                    action: r.action(),
                    rule: Some(r.name().to_string()),
                },
            )
    }

    /// Snapshot of the rules in evaluation order.
    pub fn list_rules(&self) -> Vec<Rule> {
        self.inner.read().rules.clone()
    }

    /// Removes every rule. The default action is kept.
    pub fn clear_rules(&self) {
        let mut set = self.inner.write();
        let removed = set.rules.len();
        set.rules.clear();
        info!(removed, "firewall rules cleared");
    }

    pub fn set_default_action(&self, action: RuleAction) {
        self.inner.write().default_action = action;
        info!(action = %action, "default action updated");
    }

    pub fn default_action(&self) -> RuleAction {
        self.inner.read().default_action
    }

    pub fn len(&self) -> usize {
        self.inner.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rules.is_empty()
    }
}

impl Default for Firewall {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn port_rule(name: &str, action: RuleAction, port: u16, priority: i32) -> Rule {
        Rule::builder(name, action)
            .port(port)
            .priority(priority)
            .build()
    }

    #[test]
    fn test_firewall_init() {
        let fw = Firewall::new();
        assert_eq!(fw.default_action(), RuleAction::Deny);
        assert!(fw.is_empty());
        assert!(fw.list_rules().is_empty());
    }

    #[test]
    fn test_add_and_get_rule() {
        let fw = Firewall::new();
        let rule = Rule::builder("allow_http", RuleAction::Allow).port(80).build();

        fw.add_rule(rule.clone()).unwrap();
        assert_eq!(fw.len(), 1);
        assert_eq!(fw.get_rule("allow_http"), Some(rule));
        assert_eq!(fw.get_rule("missing"), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let fw = Firewall::new();
        fw.add_rule(port_rule("dup", RuleAction::Allow, 80, 1)).unwrap();

        let err = fw
            .add_rule(port_rule("dup", RuleAction::Deny, 22, 5))
            .unwrap_err();
        assert_eq!(
            err,
            FirewallError::DuplicateRule {
                name: "dup".to_string()
            }
        );
        assert_eq!(fw.len(), 1);
        assert_eq!(fw.get_rule("dup").unwrap().action(), RuleAction::Allow);
    }

    #[test]
    fn test_remove_rule() {
        let fw = Firewall::new();
        fw.add_rule(Rule::builder("test_rule", RuleAction::Deny).build())
            .unwrap();

        assert!(fw.remove_rule("test_rule"));
        assert!(fw.is_empty());
        assert!(!fw.remove_rule("non_existent"));
    }

    #[test]
    fn test_matching_rule_decides() {
        let fw = Firewall::new();
        fw.add_rule(
            Rule::builder("allow_ssh", RuleAction::Allow)
                .port(22)
                .protocol("TCP")
                .build(),
        )
        .unwrap();

        let packet = PacketDescriptor::new()
            .with_port(22)
            .with_protocol("TCP")
            .with_source_ip("192.168.1.1");

        let decision = fw.check_packet(&packet);
        assert_eq!(decision.action, RuleAction::Allow);
        assert_eq!(decision.rule.as_deref(), Some("allow_ssh"));
        assert!(!decision.is_default());
    }

    #[test]
    fn test_default_action_fallback() {
        let fw = Firewall::new();
        fw.add_rule(port_rule("deny_80", RuleAction::Deny, 80, 0))
            .unwrap();

        let decision = fw.check_packet(&PacketDescriptor::new().with_port(443));
        assert_eq!(decision.action, RuleAction::Deny);
        assert!(decision.is_default());
    }

    #[test]
    fn test_higher_priority_wins() {
        let fw = Firewall::new();
        fw.add_rule(port_rule("A", RuleAction::Deny, 80, 1)).unwrap();
        fw.add_rule(port_rule("B", RuleAction::Allow, 80, 10)).unwrap();

        let decision = fw.check_packet(&PacketDescriptor::new().with_port(80));
        assert_eq!(decision.action, RuleAction::Allow);
        assert_eq!(decision.rule.as_deref(), Some("B"));
    }

    #[test]
    fn test_list_rules_is_ordered_snapshot() {
        let fw = Firewall::new();
        fw.add_rule(port_rule("low", RuleAction::Allow, 1, -5)).unwrap();
        fw.add_rule(port_rule("high", RuleAction::Allow, 2, 20)).unwrap();
        fw.add_rule(port_rule("mid_a", RuleAction::Allow, 3, 7)).unwrap();
        fw.add_rule(port_rule("mid_b", RuleAction::Allow, 4, 7)).unwrap();

        let mut snapshot = fw.list_rules();
        let names: Vec<_> = snapshot.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["high", "mid_a", "mid_b", "low"]);

        snapshot.clear();
        assert_eq!(fw.len(), 4);
    }

    #[test]
    fn test_set_default_action_affects_later_checks() {
        let fw = Firewall::new();
        let packet = PacketDescriptor::new().with_port(9999);

        let before = fw.check_packet(&packet);
        fw.set_default_action(RuleAction::Allow);
        let after = fw.check_packet(&packet);

        assert_eq!(before.action, RuleAction::Deny);
        assert_eq!(after.action, RuleAction::Allow);
        assert!(after.is_default());
    }

    #[traced_test]
    #[test]
    fn test_clear_rules_keeps_default() {
        let fw = Firewall::with_default_action(RuleAction::Log);
        fw.add_rule(Rule::builder("rule1", RuleAction::Allow).build())
            .unwrap();
        fw.add_rule(Rule::builder("rule2", RuleAction::Deny).build())
            .unwrap();
        assert_eq!(fw.len(), 2);

        fw.clear_rules();
        assert!(fw.is_empty());
        assert_eq!(fw.default_action(), RuleAction::Log);
        assert!(logs_contain("firewall rules cleared"));
    }

    #[test]
    fn test_shared_across_threads() {
        let fw = Arc::new(Firewall::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fw = Arc::clone(&fw);
                std::thread::spawn(move || {
                    fw.add_rule(port_rule(&format!("r{i}"), RuleAction::Allow, 1000 + i, i as i32))
                        .unwrap();
                    fw.check_packet(&PacketDescriptor::new().with_port(1000 + i))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().action, RuleAction::Allow);
        }
        let priorities: Vec<_> = fw.list_rules().iter().map(|r| r.priority()).collect();
        assert_eq!(priorities, [3, 2, 1, 0]);
    }

    proptest! {
        #[test]
        fn prop_higher_priority_matching_rule_wins(
            p1 in -100i32..100,
            p2 in -100i32..100,
            first_inserted_is_r1 in any::<bool>(),
        ) {
            prop_assume!(p1 != p2);
            let fw = Firewall::new();
            let r1 = port_rule("r1", RuleAction::Allow, 80, p1);
            let r2 = port_rule("r2", RuleAction::Deny, 80, p2);
            if first_inserted_is_r1 {
                fw.add_rule(r1).unwrap();
                fw.add_rule(r2).unwrap();
            } else {
                fw.add_rule(r2).unwrap();
                fw.add_rule(r1).unwrap();
            }

            let decision = fw.check_packet(&PacketDescriptor::new().with_port(80));
            let expected = if p1 > p2 { "r1" } else { "r2" };
            prop_assert_eq!(decision.rule.as_deref(), Some(expected));
        }

        #[test]
        fn prop_equal_priority_resolves_to_first_inserted(
            priority in -100i32..100,
            count in 2usize..8,
        ) {
            let fw = Firewall::new();
            for i in 0..count {
                fw.add_rule(port_rule(&format!("rule{i}"), RuleAction::Log, 443, priority))
                    .unwrap();
            }

            let decision = fw.check_packet(&PacketDescriptor::new().with_port(443));
            prop_assert_eq!(decision.rule.as_deref(), Some("rule0"));
        }

        #[test]
        fn prop_rules_stay_sorted_descending(priorities in proptest::collection::vec(-50i32..50, 0..20)) {
            let fw = Firewall::new();
            for (i, p) in priorities.iter().enumerate() {
                fw.add_rule(port_rule(&format!("rule{i}"), RuleAction::Allow, 80, *p))
                    .unwrap();
            }

            let listed = fw.list_rules();
            prop_assert!(listed.windows(2).all(|w| w[0].priority() >= w[1].priority()));
            prop_assert_eq!(listed.len(), priorities.len());
        }
    }
}
