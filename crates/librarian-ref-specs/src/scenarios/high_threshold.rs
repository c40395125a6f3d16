//! Scenario C: enough high-severity findings escalate like a critical one.
//!
//! A data-export design is missing its version and owners and claims two
//! requirements the catalog has never heard of. Every finding is high, and
//! there are four of them against a threshold of three.
//!
//! Pipeline walk-through for the demo run:
//!   1. Rules: DOC-001 high (missing fields), VER-001 high (no version),
//!      REQ-001 high twice (unknown requirements)
//!   2. Decision policy: 4 high ≥ threshold 3 → escalated, not
//!      revision_required
//!   3. Decision appended to the hash chain

use serde_json::json;

use librarian_contracts::{
    decision::Decision,
    error::LibrarianResult,
    request::{ChangeAction, ChangeRequest, TargetType},
};

use crate::mock_data::{engine_config, spec_catalog};
use crate::scenarios::reference_engine;

#[derive(Debug)]
pub struct HighThresholdOutcome {
    pub decision: Decision,
    pub threshold: usize,
}

pub fn export_design() -> LibrarianResult<ChangeRequest> {
    ChangeRequest::builder("req-export-019", "design-agent", ChangeAction::Create, TargetType::Design)
        .target("DES-EXPORT")
        .field("doc", "design")
        .field("component", "export")
        .field("id", "DES-EXPORT")
        .field("status", "draft")
        .field("implements", "ARCH-PLATFORM")
        .field("satisfies", json!(["REQ-EXPORT-CSV", "REQ-EXPORT-PDF"]))
        .path("docs/design/export.md")
        .rationale("Customer data export")
        .build()
}

pub async fn execute() -> LibrarianResult<HighThresholdOutcome> {
    let config = engine_config()?;
    let engine = reference_engine(&config).await?;

    let decision = engine
        .orchestrator
        .evaluate(export_design()?, spec_catalog())
        .await?;

    Ok(HighThresholdOutcome {
        decision,
        threshold: config.policy.high_severity_escalation_threshold,
    })
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario C and print each pipeline step.
pub async fn run_scenario() -> LibrarianResult<()> {
    println!("=== Scenario C: High-Severity Threshold Escalation ===");
    println!();
    println!("  Request:  create design DES-EXPORT (no version, no owners)");
    println!();

    let outcome = execute().await?;
    let decision = &outcome.decision;

    println!("  Violations:");
    for v in &decision.violations {
        println!("    [{}] {}: {}", v.rule_id, v.severity, v.message);
    }
    println!("  High threshold:         {}", outcome.threshold);
    println!("  Status:                 {}", decision.status);
    println!("  Impact:                 {}", decision.impact_level);
    println!(
        "  Escalation reason:      {}",
        decision.escalation_reason.as_deref().unwrap_or("-")
    );
    println!();
    println!("  Scenario C complete.");
    println!();

    Ok(())
}
