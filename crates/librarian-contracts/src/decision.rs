//! Decision types.
//!
//! The decision policy produces a `PolicyOutcome`, the escalation advisor an
//! `EscalationDecision`, and the orchestrator folds both into the durable
//! `Decision` that is written to the audit ledger and returned to the caller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::violation::{RuleError, Severity, Violation};

/// Terminal outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    RevisionRequired,
    Escalated,
    /// Only ever set by a human review; the automatic policy never rejects.
    Rejected,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Approved => "approved",
            ValidationStatus::RevisionRequired => "revision_required",
            ValidationStatus::Escalated => "escalated",
            ValidationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far-reaching the decided change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<Severity> for ImpactLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => ImpactLevel::Low,
            Severity::Medium => ImpactLevel::Medium,
            Severity::High => ImpactLevel::High,
            Severity::Critical => ImpactLevel::Critical,
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// What the decision policy concluded from the aggregated findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    pub status: ValidationStatus,
    pub rationale: String,
    /// 1.0 minus the per-severity penalties, clamped to [0, 1].
    pub confidence: f64,
    pub impact_level: ImpactLevel,
}

/// Whether a decision must go to human review regardless of its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub escalate: bool,
    /// Every trigger that fired, joined with "; ". Empty when not escalating.
    pub reason: String,
}

impl EscalationDecision {
    pub fn none() -> Self {
        Self {
            escalate: false,
            reason: String::new(),
        }
    }
}

/// The durable outcome of one evaluation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub request_id: String,
    pub status: ValidationStatus,
    /// Snapshot of the findings, in presentation order.
    pub violations: Vec<Violation>,
    /// Rules that could not run. A non-empty list forces impact >= medium.
    #[serde(default)]
    pub rule_errors: Vec<RuleError>,
    pub rationale: String,
    pub confidence: f64,
    pub impact_level: ImpactLevel,
    /// Set when the escalation advisor upgraded the status.
    #[serde(default)]
    pub escalation_reason: Option<String>,
    #[serde(default)]
    pub rules_executed: usize,
    #[serde(default)]
    pub processing_time_ms: u64,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn critical_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
    }

    /// The fixes suggested by the violations, in presentation order.
    pub fn required_changes(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter_map(|v| v.suggestion.as_deref())
            .collect()
    }
}

/// A human reviewer's resolution of an earlier decision.
///
/// Recorded as a new decision event that supersedes the original one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The audit event holding the decision under review.
    pub supersedes_event_id: String,
    pub reviewer_id: String,
    /// Approved, RevisionRequired or Rejected. Escalated is not a resolution.
    pub status: ValidationStatus,
    pub rationale: String,
}
