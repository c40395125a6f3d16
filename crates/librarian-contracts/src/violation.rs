//! Rule findings and rule failures.
//!
//! A `Violation` is one finding raised by exactly one rule. A `RuleError`
//! records that a rule could not produce findings at all; it travels with the
//! decision as metadata and is never silently treated as a pass.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Violation severity, totally ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule finding against a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// ID of the rule that raised this, e.g. "ARCH-001".
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    /// How to fix it, when the rule knows.
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl Violation {
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            details: Map::new(),
            suggestion: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The rule category: the rule ID up to its first '-' ("CONST-001" -> "CONST").
    pub fn category(&self) -> &str {
        self.rule_id
            .split_once('-')
            .map(|(prefix, _)| prefix)
            .unwrap_or(&self.rule_id)
    }

    /// Canonical presentation order: severity descending, then rule ID
    /// ascending, then message. Arrival order never matters.
    pub fn presentation_order(a: &Violation, b: &Violation) -> Ordering {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.message.cmp(&b.message))
    }
}

/// Sort violations into canonical presentation order in place.
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(Violation::presentation_order);
}

/// Why a rule produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleErrorCause {
    /// The rule returned an error.
    Failed { reason: String },
    /// The rule panicked.
    Panicked { message: String },
    /// The rule exceeded its per-rule timeout.
    TimedOut { timeout_ms: u64 },
    /// The request deadline passed while the rule was still in flight.
    Cancelled,
}

impl fmt::Display for RuleErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleErrorCause::Failed { reason } => write!(f, "failed: {reason}"),
            RuleErrorCause::Panicked { message } => write!(f, "panicked: {message}"),
            RuleErrorCause::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            RuleErrorCause::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A rule that failed to run, recorded for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    pub rule_id: String,
    pub cause: RuleErrorCause,
}

impl RuleError {
    pub fn new(rule_id: impl Into<String>, cause: RuleErrorCause) -> Self {
        Self {
            rule_id: rule_id.into(),
            cause,
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.cause)
    }
}
