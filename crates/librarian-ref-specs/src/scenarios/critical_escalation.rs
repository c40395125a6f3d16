//! Scenario B: a critical violation escalates, and a reviewer rejects.
//!
//! A ledger-sync design is proposed against the draft legacy architecture,
//! names no requirement, and sits outside `docs/design/`. That is one
//! critical finding (unapproved basis) and two medium ones.
//!
//! Pipeline walk-through for the demo run:
//!   1. Rules: ARCH-001 critical, DOC-001 medium, REQ-001 medium
//!   2. Decision policy: a critical violation → escalated
//!   3. Decision appended; rationale leads with the critical finding
//!   4. A lead architect reviews the escalation and rejects it
//!   5. The rejection is appended as a new event superseding the original

use serde_json::json;

use librarian_contracts::{
    audit::{AuditEvent, AuditFilter},
    decision::{Decision, ReviewOutcome, ValidationStatus},
    error::{LibrarianError, LibrarianResult},
    request::{ChangeAction, ChangeRequest, TargetType},
};

use crate::mock_data::{engine_config, spec_catalog};
use crate::scenarios::reference_engine;

#[derive(Debug)]
pub struct CriticalEscalationOutcome {
    pub decision: Decision,
    pub review: Decision,
    /// Every event for the target, in chain order.
    pub events: Vec<AuditEvent>,
    pub chain_intact: bool,
}

pub fn ledger_sync_design() -> LibrarianResult<ChangeRequest> {
    ChangeRequest::builder("req-ledger-sync-007", "design-agent", ChangeAction::Create, TargetType::Design)
        .target("DES-LEDGER-SYNC")
        .field("doc", "design")
        .field("component", "ledger-sync")
        .field("id", "DES-LEDGER-SYNC")
        .field("version", "0.5.0")
        .field("status", "draft")
        .field("owners", json!(["eli"]))
        .field("implements", "ARCH-LEGACY")
        .path("notes/ledger-sync.md")
        .rationale("Nightly reconciliation against the legacy ledger")
        .build()
}

pub async fn execute() -> LibrarianResult<CriticalEscalationOutcome> {
    let config = engine_config()?;
    let engine = reference_engine(&config).await?;
    let orchestrator = &engine.orchestrator;

    let decision = orchestrator
        .evaluate(ledger_sync_design()?, spec_catalog())
        .await?;

    let filter = AuditFilter::for_target("DES-LEDGER-SYNC");
    let original = orchestrator
        .query_audit(&filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| LibrarianError::AuditReadFailed {
            reason: "escalated decision was not recorded".to_string(),
        })?;

    let review = orchestrator
        .record_review(ReviewOutcome {
            supersedes_event_id: original.id.clone(),
            reviewer_id: "lead-architect".to_string(),
            status: ValidationStatus::Rejected,
            rationale: "ARCH-LEGACY is being retired; build on ARCH-PLATFORM".to_string(),
        })
        .await?;

    let events = orchestrator.query_audit(&filter).await?;
    let chain_intact = orchestrator.verify_audit_chain(0, u64::MAX).await?.is_intact();

    Ok(CriticalEscalationOutcome {
        decision,
        review,
        events,
        chain_intact,
    })
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario B and print each pipeline step.
pub async fn run_scenario() -> LibrarianResult<()> {
    println!("=== Scenario B: Critical Violation Escalated, Then Rejected ===");
    println!();
    println!("  Request:  create design DES-LEDGER-SYNC");
    println!("  Basis:    ARCH-LEGACY (draft)");
    println!();

    let outcome = execute().await?;
    let decision = &outcome.decision;

    println!("  Violations:");
    for v in &decision.violations {
        println!("    [{}] {}: {}", v.rule_id, v.severity, v.message);
    }
    println!("  Status:                 {}", decision.status);
    println!(
        "  Escalation reason:      {}",
        decision.escalation_reason.as_deref().unwrap_or("-")
    );
    println!();
    println!("  Review by lead-architect → {}", outcome.review.status);
    println!("  Review rationale:       {}", outcome.review.rationale);
    println!();
    println!(
        "  Audit chain integrity:  {} ({} event(s) for DES-LEDGER-SYNC)",
        if outcome.chain_intact { "VERIFIED" } else { "FAILED" },
        outcome.events.len()
    );
    println!();
    println!("  Scenario B complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use librarian_contracts::violation::Severity;

    use super::*;

    #[tokio::test]
    async fn test_critical_violation_escalates() {
        let outcome = execute().await.unwrap();
        let decision = &outcome.decision;

        let found: Vec<_> = decision
            .violations
            .iter()
            .map(|v| (v.rule_id.as_str(), v.severity))
            .collect();
        assert_eq!(
            found,
            vec![
                ("ARCH-001", Severity::Critical),
                ("DOC-001", Severity::Medium),
                ("REQ-001", Severity::Medium),
            ]
        );
        assert_eq!(decision.status, ValidationStatus::Escalated);
        assert!(
            decision.rationale.starts_with("[ARCH-001] critical:"),
            "rationale must lead with the critical violation: {}",
            decision.rationale
        );
        let reason = decision.escalation_reason.as_deref().unwrap();
        assert!(reason.contains("1 critical violation(s)"), "{}", reason);
    }

    #[tokio::test]
    async fn test_review_supersedes_without_mutating() {
        let outcome = execute().await.unwrap();

        assert_eq!(outcome.review.status, ValidationStatus::Rejected);
        assert_eq!(outcome.review.request_id, outcome.decision.request_id);
        assert_eq!(outcome.review.violations, outcome.decision.violations);

        assert_eq!(outcome.events.len(), 2);
        let (original, review) = (&outcome.events[0], &outcome.events[1]);
        assert_eq!(original.payload["status"], "escalated", "original left untouched");
        assert_eq!(review.payload["status"], "rejected");
        assert_eq!(review.supersedes_event_id.as_deref(), Some(original.id.as_str()));
        assert_eq!(review.actor_id, "lead-architect");
        assert!(outcome.chain_intact);
    }
}
