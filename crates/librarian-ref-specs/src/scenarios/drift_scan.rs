//! Scenario D: the drift detector finds a design that moved ahead of its
//! architecture.
//!
//! ARCH-PLATFORM was modified at T0; DES-CHECKOUT was modified at T1 > T0 and
//! no approval decision has been recorded since. The graph also holds a
//! covered requirement, a retired one, and a range-pinned version, none of
//! which are drift.
//!
//! Pipeline walk-through for the demo run:
//!   1. Four structural checks run concurrently against the graph store
//!   2. Exactly one finding: design_ahead_of_basis, high
//!   3. The finding is appended to the ledger under the detector's actor

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use librarian_contracts::{
    audit::{AuditCategory, AuditEvent, AuditFilter},
    drift::DriftScanReport,
    error::LibrarianResult,
};
use librarian_drift::DriftDetector;

use crate::mock_data::{drifted_graph, engine_config};
use crate::scenarios::reference_engine;

#[derive(Debug)]
pub struct DriftScanOutcome {
    pub report: DriftScanReport,
    pub drift_events: Vec<AuditEvent>,
    pub basis_modified: DateTime<Utc>,
    pub dependent_modified: DateTime<Utc>,
}

pub async fn execute() -> LibrarianResult<DriftScanOutcome> {
    let config = engine_config()?;
    let engine = reference_engine(&config).await?;

    let basis_modified = Utc::now() - Duration::days(5);
    let dependent_modified = basis_modified + Duration::days(2);
    let detector = DriftDetector::new(
        Arc::new(drifted_graph(basis_modified, dependent_modified)),
        config.drift.clone(),
    );
    let orchestrator = engine.orchestrator.with_drift_scanner(Box::new(detector));

    let report = orchestrator.run_drift_scan().await?;
    let drift_events = orchestrator
        .query_audit(&AuditFilter::for_category(AuditCategory::Drift))
        .await?;

    Ok(DriftScanOutcome {
        report,
        drift_events,
        basis_modified,
        dependent_modified,
    })
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario D and print the scan report.
pub async fn run_scenario() -> LibrarianResult<()> {
    println!("=== Scenario D: Drift Scan ===");
    println!();

    let outcome = execute().await?;

    println!("  ARCH-PLATFORM modified: {}", outcome.basis_modified.to_rfc3339());
    println!("  DES-CHECKOUT modified:  {}", outcome.dependent_modified.to_rfc3339());
    println!();
    println!("  Findings:");
    for f in &outcome.report.findings {
        println!("    {} ({}) {}: {}", f.kind, f.severity, f.subject_id, f.description);
    }
    for e in &outcome.report.errors {
        println!("    check {} FAILED: {}", e.kind, e.reason);
    }

    let summary = outcome.report.summary();
    println!();
    println!("  Total findings:         {}", summary.total_findings);
    println!("  Failed checks:          {}", summary.failed_checks);
    println!("  Drift events recorded:  {}", outcome.drift_events.len());
    println!();
    println!("  Scenario D complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use librarian_contracts::{drift::DriftKind, violation::Severity};

    use super::*;

    #[tokio::test]
    async fn test_exactly_one_design_ahead_finding() {
        let outcome = execute().await.unwrap();
        let report = &outcome.report;

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.findings.len(), 1, "{:?}", report.findings);
        let finding = &report.findings[0];
        assert_eq!(finding.kind, DriftKind::DesignAheadOfBasis);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.subject_id, "DES-CHECKOUT");
        assert_eq!(finding.related_id.as_deref(), Some("ARCH-PLATFORM"));
    }

    #[tokio::test]
    async fn test_finding_recorded_as_drift_event() {
        let outcome = execute().await.unwrap();

        assert_eq!(outcome.drift_events.len(), 1);
        let event = &outcome.drift_events[0];
        assert_eq!(event.actor_id, "drift-detector");
        assert_eq!(event.target_id.as_deref(), Some("DES-CHECKOUT"));
        assert_eq!(event.payload["kind"], "design_ahead_of_basis");
        assert_eq!(event.payload["severity"], "high");
    }
}
