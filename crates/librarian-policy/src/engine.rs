//! Threshold-based decision policy.
//!
//! `ThresholdPolicy` implements the `DecisionPolicy` trait from
//! librarian-core.
//!
//! Decision algorithm (first match wins):
//!
//! 1. No violations and no rule errors → `Approved`.
//! 2. Any `critical` violation → `Escalated`.
//! 3. `high` count ≥ `high_severity_escalation_threshold` → `Escalated`
//!    (treated as equivalent to a single critical).
//! 4. Any violation → `RevisionRequired`.
//! 5. No violations but some rule errors → `Escalated` (a rule that did not
//!    run cannot certify approval).
//!
//! Critical always wins over the high-count rule because it is checked first.

use tracing::debug;

use librarian_contracts::{
    config::PolicyConfig,
    decision::{ImpactLevel, PolicyOutcome, ValidationStatus},
    violation::{RuleError, Severity, Violation},
};
use librarian_core::traits::DecisionPolicy;

/// A `DecisionPolicy` driven by `PolicyConfig` thresholds.
///
/// ```rust,ignore
/// use librarian_policy::engine::ThresholdPolicy;
///
/// let policy = ThresholdPolicy::new(config.policy.clone());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThresholdPolicy {
    config: PolicyConfig,
}

impl ThresholdPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl DecisionPolicy for ThresholdPolicy {
    fn decide(&self, violations: &[Violation], rule_errors: &[RuleError]) -> PolicyOutcome {
        let (status, rationale) = decide(violations, rule_errors, &self.config);
        let confidence = confidence(violations, &self.config);
        let impact_level = impact_level(violations, rule_errors);

        debug!(
            status = %status,
            violations = violations.len(),
            rule_errors = rule_errors.len(),
            confidence = confidence,
            impact = %impact_level,
            "policy decided"
        );

        PolicyOutcome {
            status,
            rationale,
            confidence,
            impact_level,
        }
    }
}

/// The status and rationale for a set of findings.
///
/// `violations` are expected in presentation order (see
/// `sort_violations`); the rationale lists them in that order.
pub fn decide(
    violations: &[Violation],
    rule_errors: &[RuleError],
    config: &PolicyConfig,
) -> (ValidationStatus, String) {
    let high_count = violations
        .iter()
        .filter(|v| v.severity == Severity::High)
        .count();

    let status = if violations.is_empty() && rule_errors.is_empty() {
        ValidationStatus::Approved
    } else if violations.iter().any(|v| v.severity == Severity::Critical)
        || high_count >= config.high_severity_escalation_threshold
    {
        ValidationStatus::Escalated
    } else if !violations.is_empty() {
        ValidationStatus::RevisionRequired
    } else {
        ValidationStatus::Escalated
    };

    let rationale = if !violations.is_empty() {
        rationale(violations, config.max_rationale_len)
    } else if !rule_errors.is_empty() {
        let failed = rule_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        cap(
            format!(
                "no violations found, but {} rule(s) could not run: {}",
                rule_errors.len(),
                failed
            ),
            config.max_rationale_len,
        )
    } else {
        "all compliance checks passed".to_string()
    };

    (status, rationale)
}

/// "[RULE] severity: message" per violation, joined with "; ".
///
/// The result never exceeds `max_len` characters, including the " (+N more)"
/// suffix added when entries were dropped. An entry cut short ends in `…`.
pub fn rationale(violations: &[Violation], max_len: usize) -> String {
    let entries: Vec<String> = violations
        .iter()
        .map(|v| format!("[{}] {}: {}", v.rule_id, v.severity, v.message))
        .collect();

    let mut out = String::new();
    let mut out_len = 0;
    let mut included = 0;
    for entry in &entries {
        let sep_len = if included == 0 { 0 } else { 2 };
        let next_len = out_len + sep_len + entry.chars().count();
        let dropped_after = entries.len() - included - 1;
        if next_len + more_suffix(dropped_after).chars().count() > max_len {
            break;
        }
        if included > 0 {
            out.push_str("; ");
        }
        out.push_str(entry);
        out_len = next_len;
        included += 1;
    }

    // The first entry alone does not fit: keep a marked prefix of it rather
    // than nothing.
    if included == 0 {
        if let Some(first) = entries.first() {
            let suffix = more_suffix(entries.len() - 1);
            let budget = max_len.saturating_sub(suffix.chars().count() + 1);
            out = first.chars().take(budget).collect();
            out.push(ELLIPSIS);
            out.push_str(&suffix);
            return cap(out, max_len);
        }
    }

    out.push_str(&more_suffix(entries.len() - included));
    out
}

/// `1.0` minus the configured penalty per violation, clamped to `[0, 1]`.
pub fn confidence(violations: &[Violation], config: &PolicyConfig) -> f64 {
    let penalty: f64 = violations
        .iter()
        .map(|v| config.penalties.for_severity(v.severity))
        .sum();
    (1.0 - penalty).clamp(0.0, 1.0)
}

/// Highest violation severity, never below `Medium` when a rule failed.
pub fn impact_level(violations: &[Violation], rule_errors: &[RuleError]) -> ImpactLevel {
    let from_violations = violations
        .iter()
        .map(|v| v.severity)
        .max()
        .map(ImpactLevel::from)
        .unwrap_or(ImpactLevel::Low);

    if rule_errors.is_empty() {
        from_violations
    } else {
        from_violations.max(ImpactLevel::Medium)
    }
}

const ELLIPSIS: char = '…';

fn more_suffix(dropped: usize) -> String {
    if dropped == 0 {
        String::new()
    } else {
        format!(" (+{} more)", dropped)
    }
}

/// Cut `text` to `max_len` characters, the last of them `…`.
fn cap(text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text;
    }
    let mut out: String = text.chars().take(max_len.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}
