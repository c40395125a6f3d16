//! # librarian-ref-specs
//!
//! Reference runtime for the Librarian governance engine.
//!
//! Demonstrates the engine end to end on a fictional specification catalog:
//!
//! - **A. Approved change**: a compliant design passes every rule.
//! - **B. Critical escalation**: an unapproved basis escalates, and a human
//!   review rejects the change through a superseding event.
//! - **C. High threshold**: four high findings escalate rather than request
//!   revision.
//! - **D. Drift scan**: a design edited after its architecture is flagged and
//!   recorded.
//! - **E. Concurrent append**: two replicas race for one chain tail and both
//!   land, in order.
//!
//! All data is hardcoded. No external systems are contacted.

pub mod mock_data;
pub mod scenarios;

#[cfg(test)]
mod tests {
    use librarian_contracts::{
        audit::AuditFilter,
        decision::{ReviewOutcome, ValidationStatus},
        error::LibrarianError,
        request::{ChangeAction, ChangeRequest, TargetType},
    };

    use crate::mock_data::{engine_config, spec_catalog, ENGINE_TOML};
    use crate::scenarios::reference_engine;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = engine_config().unwrap();
        assert_eq!(config.policy.high_severity_escalation_threshold, 3);
        assert_eq!(config.ledger.drift_actor_id, "drift-detector");
        assert!(ENGINE_TOML.contains("[runner]"));
    }

    /// Deleting an audit record is a constitutional violation, which is
    /// inviolable and always escalates.
    #[tokio::test]
    async fn test_deleting_audit_record_escalates() {
        let config = engine_config().unwrap();
        let engine = reference_engine(&config).await.unwrap();

        let request = ChangeRequest::builder("req-purge", "cleanup-agent", ChangeAction::Delete, TargetType::AuditEvent)
            .target("evt-0001")
            .rationale("tidy up old events")
            .build()
            .unwrap();
        let decision = engine.orchestrator.evaluate(request, spec_catalog()).await.unwrap();

        assert_eq!(decision.status, ValidationStatus::Escalated);
        assert_eq!(decision.violations[0].rule_id, "CONST-001");
        assert!(decision
            .escalation_reason
            .as_deref()
            .unwrap()
            .contains("inviolable rule(s) violated: CONST-001"));
    }

    /// An override request from an actor without authority escalates an
    /// otherwise approved change.
    #[tokio::test]
    async fn test_unauthorized_override_escalates() {
        let config = engine_config().unwrap();
        let engine = reference_engine(&config).await.unwrap();

        let request = crate::scenarios::approved_change::refunds_design().unwrap();
        let request = ChangeRequest {
            override_requested: true,
            ..request
        };
        let decision = engine.orchestrator.evaluate(request.clone(), spec_catalog()).await.unwrap();
        assert_eq!(decision.status, ValidationStatus::Escalated);

        let authorized = ChangeRequest {
            id: "req-refunds-002".to_string(),
            actor_id: "lead-architect".to_string(),
            ..request
        };
        let decision = engine.orchestrator.evaluate(authorized, spec_catalog()).await.unwrap();
        assert_eq!(decision.status, ValidationStatus::Approved);

        let stats = engine.orchestrator.audit_statistics().await.unwrap();
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.by_status.get("escalated"), Some(&1));
        assert_eq!(stats.by_status.get("approved"), Some(&1));
    }

    /// An approved change is final; a reviewer cannot flip it.
    #[tokio::test]
    async fn test_approved_change_cannot_be_reviewed() {
        let config = engine_config().unwrap();
        let engine = reference_engine(&config).await.unwrap();
        let orchestrator = &engine.orchestrator;

        let request = crate::scenarios::approved_change::refunds_design().unwrap();
        let decision = orchestrator.evaluate(request, spec_catalog()).await.unwrap();
        assert_eq!(decision.status, ValidationStatus::Approved);
        let approved_event = orchestrator.query_audit(&AuditFilter::default()).await.unwrap()[0].clone();

        let result = orchestrator
            .record_review(ReviewOutcome {
                supersedes_event_id: approved_event.id.clone(),
                reviewer_id: "lead-architect".to_string(),
                status: ValidationStatus::Rejected,
                rationale: "second thoughts".to_string(),
            })
            .await;
        assert!(matches!(result, Err(LibrarianError::InvalidRequest { .. })), "{:?}", result);

        let stats = orchestrator.audit_statistics().await.unwrap();
        assert_eq!(stats.total_events, 1, "refused reviews are not recorded");
    }
}
