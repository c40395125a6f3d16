//! Drift findings: structural inconsistencies found after the fact.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::violation::Severity;

/// The fixed battery of structural checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// A dependent entity was edited after its basis without an approval.
    DesignAheadOfBasis,
    /// An active requirement has nothing satisfying it.
    UncoveredRequirement,
    /// A recent code artifact implements nothing.
    UndocumentedArtifact,
    /// A dependent declares a basis version the basis no longer has.
    VersionMismatch,
}

impl DriftKind {
    pub const ALL: [DriftKind; 4] = [
        DriftKind::DesignAheadOfBasis,
        DriftKind::UncoveredRequirement,
        DriftKind::UndocumentedArtifact,
        DriftKind::VersionMismatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftKind::DesignAheadOfBasis => "design_ahead_of_basis",
            DriftKind::UncoveredRequirement => "uncovered_requirement",
            DriftKind::UndocumentedArtifact => "undocumented_artifact",
            DriftKind::VersionMismatch => "version_mismatch",
        }
    }
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One drift finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFinding {
    pub kind: DriftKind,
    pub severity: Severity,
    /// The entity that drifted.
    pub subject_id: String,
    /// Its basis, when the check involves one.
    #[serde(default)]
    pub related_id: Option<String>,
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

/// A structural check that could not run. Does not abort the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftQueryError {
    pub kind: DriftKind,
    pub reason: String,
}

/// Everything one drift scan produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftScanReport {
    /// Sorted by severity descending, then kind, then subject.
    pub findings: Vec<DriftFinding>,
    pub errors: Vec<DriftQueryError>,
}

impl DriftScanReport {
    /// Totals by kind and by severity, plus the critical findings.
    pub fn summary(&self) -> DriftSummary {
        let mut summary = DriftSummary {
            total_findings: self.findings.len(),
            failed_checks: self.errors.len(),
            ..DriftSummary::default()
        };
        for finding in &self.findings {
            *summary.by_kind.entry(finding.kind).or_insert(0) += 1;
            *summary.by_severity.entry(finding.severity).or_insert(0) += 1;
            if finding.severity == Severity::Critical {
                summary.critical.push(finding.clone());
            }
        }
        summary
    }
}

/// Aggregate view over a drift scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub total_findings: usize,
    pub failed_checks: usize,
    pub by_kind: BTreeMap<DriftKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub critical: Vec<DriftFinding>,
}
