//! Engine configuration.
//!
//! Read-only after startup and shared by reference across every concurrent
//! evaluation. Every field has a default, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! [policy]
//! high_severity_escalation_threshold = 3
//! min_confidence = 0.5
//! inviolable_categories = ["CONST"]
//!
//! [policy.penalties]
//! critical = 0.4
//!
//! [runner]
//! per_rule_timeout_ms = 2000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::violation::Severity;

/// Top-level configuration, one section per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: PolicyConfig,
    pub runner: RunnerConfig,
    pub drift: DriftConfig,
    pub ledger: LedgerConfig,
}

/// Decision policy and escalation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// This many high-severity violations escalate like one critical.
    pub high_severity_escalation_threshold: usize,
    /// Rationale text is cut to this many characters with a "+N more" suffix.
    pub max_rationale_len: usize,
    /// Decisions with lower confidence are escalated.
    pub min_confidence: f64,
    /// Rule categories (rule ID prefix) whose violations always escalate.
    pub inviolable_categories: Vec<String>,
    pub penalties: SeverityPenalties,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            high_severity_escalation_threshold: 3,
            max_rationale_len: 1024,
            min_confidence: 0.5,
            inviolable_categories: vec!["CONST".to_string()],
            penalties: SeverityPenalties::default(),
        }
    }
}

/// Confidence lost per violation of each severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPenalties {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityPenalties {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            critical: 0.4,
            high: 0.2,
            medium: 0.1,
            low: 0.05,
        }
    }
}

/// Rule runner limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub per_rule_timeout_ms: u64,
    /// Whole-evaluation deadline. `None` waits for every rule (each still
    /// bounded by its own timeout).
    pub request_deadline_ms: Option<u64>,
    /// Worker cap. `None` uses the available CPU parallelism.
    pub max_workers: Option<usize>,
}

impl RunnerConfig {
    pub fn per_rule_timeout(&self) -> Duration {
        Duration::from_millis(self.per_rule_timeout_ms)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_ms.map(Duration::from_millis)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            per_rule_timeout_ms: 2_000,
            request_deadline_ms: Some(10_000),
            max_workers: None,
        }
    }
}

/// Drift detector limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub query_timeout_ms: u64,
    /// Undocumented artifacts older than this are not reported.
    pub undocumented_window_days: i64,
    pub max_concurrent_checks: Option<usize>,
}

impl DriftConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000,
            undocumented_window_days: 30,
            max_concurrent_checks: None,
        }
    }
}

/// Audit ledger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Appends retried after a store conflict before giving up.
    pub max_append_retries: u32,
    /// Actor recorded on drift events.
    pub drift_actor_id: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_append_retries: 3,
            drift_actor_id: "drift-detector".to_string(),
        }
    }
}
