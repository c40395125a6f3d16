//! Escalation advisor.
//!
//! Layered after the decision policy. It can only move a decision toward
//! `Escalated`, never away from it. Any one trigger is sufficient:
//!
//! (a) the policy already escalated;
//! (b) a violation belongs to an inviolable rule category, at any severity;
//! (c) an override was requested by an actor without override authority;
//! (d) confidence is below `min_confidence`.
//!
//! Every trigger that fires contributes to the reason.

use std::collections::BTreeSet;

use tracing::debug;

use librarian_contracts::{
    config::PolicyConfig,
    decision::{EscalationDecision, ValidationStatus},
    violation::Severity,
};
use librarian_core::traits::{EscalationAdvisor, EscalationInput};

#[derive(Debug, Clone, Default)]
pub struct ConfiguredEscalationAdvisor {
    config: PolicyConfig,
}

impl ConfiguredEscalationAdvisor {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    fn is_inviolable(&self, category: &str) -> bool {
        self.config
            .inviolable_categories
            .iter()
            .any(|c| c == category)
    }
}

impl EscalationAdvisor for ConfiguredEscalationAdvisor {
    fn advise(&self, input: &EscalationInput<'_>) -> EscalationDecision {
        let mut reasons = Vec::new();

        // (a)
        if input.outcome.status == ValidationStatus::Escalated {
            let critical = input
                .violations
                .iter()
                .filter(|v| v.severity == Severity::Critical)
                .count();
            let high = input
                .violations
                .iter()
                .filter(|v| v.severity == Severity::High)
                .count();
            let detail = if critical > 0 {
                format!("{} critical violation(s)", critical)
            } else if high >= self.config.high_severity_escalation_threshold {
                format!(
                    "{} high-severity violations (threshold {})",
                    high, self.config.high_severity_escalation_threshold
                )
            } else {
                "rules could not run to certify approval".to_string()
            };
            reasons.push(format!("decision policy escalated: {}", detail));
        }

        // (b)
        let inviolable: BTreeSet<&str> = input
            .violations
            .iter()
            .filter(|v| self.is_inviolable(v.category()))
            .map(|v| v.rule_id.as_str())
            .collect();
        if !inviolable.is_empty() {
            let ids = inviolable.into_iter().collect::<Vec<_>>().join(", ");
            reasons.push(format!("inviolable rule(s) violated: {}", ids));
        }

        // (c)
        if input.override_requested && !input.actor_has_override {
            reasons.push("override requested by an actor without override authority".to_string());
        }

        // (d)
        if input.outcome.confidence < self.config.min_confidence {
            reasons.push(format!(
                "confidence {:.2} below minimum {:.2}",
                input.outcome.confidence, self.config.min_confidence
            ));
        }

        if reasons.is_empty() {
            return EscalationDecision::none();
        }

        let reason = reasons.join("; ");
        debug!(reason = %reason, "escalation required");
        EscalationDecision {
            escalate: true,
            reason,
        }
    }
}
