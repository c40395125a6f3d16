//! The validation orchestrator: the composition root of the engine.
//!
//! The orchestrator enforces the evaluation pipeline:
//!
//!   Validate → Rules (parallel) → Policy → Authority → Escalation → Ledger
//!
//! The audit invariant is absolute: `evaluate()` NEVER returns a `Decision`
//! that the ledger has not confirmed. If the append fails, the whole
//! evaluation fails. The orchestrator owns no mutable state; the only shared
//! mutable state (the chain tail) lives behind the `AuditLedger`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use librarian_contracts::{
    audit::{AuditCategory, AuditEntry, AuditEvent, AuditFilter, AuditStatistics, ChainReport},
    config::{EngineConfig, LedgerConfig},
    context::EvaluationContext,
    decision::{Decision, ReviewOutcome, ValidationStatus},
    drift::DriftScanReport,
    error::{LibrarianError, LibrarianResult},
    request::ChangeRequest,
};

use crate::runner::RuleRunner;
use crate::traits::{
    AuditLedger, DecisionPolicy, DriftScanner, EscalationAdvisor, EscalationInput,
    OverrideAuthority, Rule,
};

/// Wires the rule set, policy, advisor, authority and ledger into one
/// `evaluate()` call.
///
/// Construct one orchestrator at startup and share it; `evaluate()` takes
/// `&self` and is safe to call concurrently.
pub struct Orchestrator {
    rules: Vec<Arc<dyn Rule>>,
    runner: RuleRunner,
    request_deadline: Option<std::time::Duration>,
    policy: Box<dyn DecisionPolicy>,
    advisor: Box<dyn EscalationAdvisor>,
    authority: Box<dyn OverrideAuthority>,
    ledger: Arc<dyn AuditLedger>,
    drift: Option<Box<dyn DriftScanner>>,
    ledger_config: LedgerConfig,
}

impl Orchestrator {
    /// Create an orchestrator over a fixed rule set.
    pub fn new(
        rules: Vec<Arc<dyn Rule>>,
        policy: Box<dyn DecisionPolicy>,
        advisor: Box<dyn EscalationAdvisor>,
        authority: Box<dyn OverrideAuthority>,
        ledger: Arc<dyn AuditLedger>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            rules,
            runner: RuleRunner::new(&config.runner),
            request_deadline: config.runner.request_deadline(),
            policy,
            advisor,
            authority,
            ledger,
            drift: None,
            ledger_config: config.ledger.clone(),
        }
    }

    /// Attach the drift detector used by `run_drift_scan()`.
    pub fn with_drift_scanner(mut self, scanner: Box<dyn DriftScanner>) -> Self {
        self.drift = Some(scanner);
        self
    }

    /// IDs of the registered rules, in registration order.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Evaluate one change request and record the decision.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the request shape; a malformed request is an error, not a
    ///    decision
    /// 2. Run every rule concurrently under the request deadline
    /// 3. Reduce findings through the decision policy
    /// 4. If an override was requested, ask the authority collaborator
    /// 5. Ask the escalation advisor; it may only upgrade to `Escalated`
    /// 6. Append the decision to the audit ledger
    /// 7. Return the decision **only after step 6 succeeded**
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for malformed requests, and any ledger error from
    /// step 6. Rule failures are NOT errors; they travel on the decision.
    pub async fn evaluate(
        &self,
        request: ChangeRequest,
        ctx: EvaluationContext,
    ) -> LibrarianResult<Decision> {
        request.validate()?;
        let started = Instant::now();

        debug!(
            request_id = %request.id,
            actor_id = %request.actor_id,
            action = %request.action,
            target_type = %request.target_type,
            rules = self.rules.len(),
            "evaluation starting"
        );

        // ── Step 2: Rules ────────────────────────────────────────────────────
        let request = Arc::new(request);
        let deadline = self
            .request_deadline
            .map(|d| tokio::time::Instant::now() + d);
        let run = self
            .runner
            .run_all(&self.rules, Arc::clone(&request), Arc::new(ctx), deadline)
            .await;

        // ── Step 3: Policy ───────────────────────────────────────────────────
        let outcome = self.policy.decide(&run.violations, &run.rule_errors);

        // ── Step 4: Authority lookup ─────────────────────────────────────────
        //
        // Hoisted out of the advisor so the advisor stays pure. A failed
        // lookup counts as lacking authority.
        let actor_has_override = if request.override_requested {
            match self
                .authority
                .has_override_authority(&request.actor_id)
                .await
            {
                Ok(has) => has,
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        actor_id = %request.actor_id,
                        error = %e,
                        "authority lookup failed, treating actor as lacking override authority"
                    );
                    false
                }
            }
        } else {
            false
        };

        // ── Step 5: Escalation ───────────────────────────────────────────────
        let escalation = self.advisor.advise(&EscalationInput {
            outcome: &outcome,
            violations: &run.violations,
            override_requested: request.override_requested,
            actor_has_override,
        });

        let status = if escalation.escalate {
            ValidationStatus::Escalated
        } else {
            outcome.status
        };

        let decision = Decision {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            status,
            violations: run.violations,
            rule_errors: run.rule_errors,
            rationale: outcome.rationale,
            confidence: outcome.confidence,
            impact_level: outcome.impact_level,
            escalation_reason: escalation.escalate.then_some(escalation.reason),
            rules_executed: run.rules_executed,
            processing_time_ms: started.elapsed().as_millis() as u64,
            decided_at: Utc::now(),
        };

        // ── Step 6: Audit ────────────────────────────────────────────────────
        //
        // An unrecorded decision is never returned.
        let entry = AuditEntry::new(
            AuditCategory::Decision,
            request.actor_id.clone(),
            serde_json::to_value(&decision)?,
        )
        .with_target(request.target_id.clone());
        let event = self.ledger.append(entry).await?;

        info!(
            request_id = %request.id,
            decision_id = %decision.id,
            status = %decision.status,
            violations = decision.violations.len(),
            rule_errors = decision.rule_errors.len(),
            event_id = %event.id,
            sequence = event.sequence,
            "decision recorded"
        );

        Ok(decision)
    }

    /// Resolve an escalated decision after human review.
    ///
    /// Appends a new decision event superseding the reviewed one; the original
    /// event is left untouched. This is the only path that produces
    /// `Rejected`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the event is missing, is not a decision, was not
    /// escalated, or already has a superseding review.
    pub async fn record_review(&self, review: ReviewOutcome) -> LibrarianResult<Decision> {
        if review.status == ValidationStatus::Escalated {
            return Err(LibrarianError::InvalidRequest {
                reason: "a review must resolve to approved, revision_required or rejected"
                    .to_string(),
            });
        }
        if review.reviewer_id.trim().is_empty() || review.rationale.trim().is_empty() {
            return Err(LibrarianError::InvalidRequest {
                reason: "a review needs a reviewer and a rationale".to_string(),
            });
        }

        let original_event = self
            .ledger
            .get(&review.supersedes_event_id)
            .await?
            .ok_or_else(|| LibrarianError::InvalidRequest {
                reason: format!("audit event '{}' not found", review.supersedes_event_id),
            })?;
        if original_event.category != AuditCategory::Decision {
            return Err(LibrarianError::InvalidRequest {
                reason: format!(
                    "audit event '{}' is a {} event, not a decision",
                    original_event.id, original_event.category
                ),
            });
        }
        let original: Decision = serde_json::from_value(original_event.payload.clone())?;
        if original.status != ValidationStatus::Escalated {
            return Err(LibrarianError::InvalidRequest {
                reason: format!(
                    "decision '{}' is {}; only escalated decisions can be reviewed",
                    original.id, original.status
                ),
            });
        }
        let prior = self
            .ledger
            .query(&AuditFilter::superseding(original_event.id.clone()).page(0, 1))
            .await?;
        if let Some(resolution) = prior.first() {
            return Err(LibrarianError::InvalidRequest {
                reason: format!(
                    "audit event '{}' was already resolved by event '{}' from '{}'",
                    original_event.id, resolution.id, resolution.actor_id
                ),
            });
        }

        let decision = Decision {
            id: Uuid::new_v4().to_string(),
            request_id: original.request_id,
            status: review.status,
            violations: original.violations,
            rule_errors: original.rule_errors,
            rationale: review.rationale,
            confidence: 1.0,
            impact_level: original.impact_level,
            escalation_reason: None,
            rules_executed: 0,
            processing_time_ms: 0,
            decided_at: Utc::now(),
        };

        let entry = AuditEntry::new(
            AuditCategory::Decision,
            review.reviewer_id.clone(),
            serde_json::to_value(&decision)?,
        )
        .with_target(original_event.target_id.clone())
        .superseding(original_event.id.clone());
        let event = self.ledger.append(entry).await?;

        info!(
            request_id = %decision.request_id,
            reviewer_id = %review.reviewer_id,
            status = %decision.status,
            supersedes = %original_event.id,
            event_id = %event.id,
            "review recorded"
        );

        Ok(decision)
    }

    /// Run the drift detector and record every finding.
    ///
    /// Failed checks are reported on the returned report and are not
    /// recorded. A failed append fails the scan.
    pub async fn run_drift_scan(&self) -> LibrarianResult<DriftScanReport> {
        let scanner = self.drift.as_ref().ok_or_else(|| LibrarianError::ConfigError {
            reason: "no drift scanner configured".to_string(),
        })?;

        let report = scanner.scan().await;
        for finding in &report.findings {
            let entry = AuditEntry::new(
                AuditCategory::Drift,
                self.ledger_config.drift_actor_id.clone(),
                serde_json::to_value(finding)?,
            )
            .with_target(Some(finding.subject_id.clone()));
            self.ledger.append(entry).await?;
        }

        info!(
            findings = report.findings.len(),
            failed_checks = report.errors.len(),
            "drift scan recorded"
        );
        Ok(report)
    }

    /// Read audit events.
    pub async fn query_audit(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>> {
        self.ledger.query(filter).await
    }

    /// Verify the chain over `from <= sequence < to`.
    pub async fn verify_audit_chain(&self, from: u64, to: u64) -> LibrarianResult<ChainReport> {
        self.ledger.verify_chain(from, to).await
    }

    pub async fn audit_statistics(&self) -> LibrarianResult<AuditStatistics> {
        self.ledger.statistics().await
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;

    use librarian_contracts::{
        audit::{AuditCategory, AuditEntry, AuditEvent, AuditFilter, AuditStatistics, ChainReport},
        authority::AuthorityGrants,
        config::EngineConfig,
        context::EvaluationContext,
        decision::{
            Decision, EscalationDecision, ImpactLevel, PolicyOutcome, ReviewOutcome,
            ValidationStatus,
        },
        drift::{DriftFinding, DriftKind, DriftScanReport},
        error::{LibrarianError, LibrarianResult},
        request::{ChangeAction, ChangeRequest, TargetType},
        violation::{RuleError, Severity, Violation},
    };

    use crate::traits::{
        AuditLedger, DecisionPolicy, DriftScanner, EscalationAdvisor, EscalationInput,
        OverrideAuthority, Rule,
    };

    use super::Orchestrator;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A rule that always returns the same findings.
    struct FixedRule {
        id: &'static str,
        severities: Vec<Severity>,
    }

    impl Rule for FixedRule {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn evaluate(
            &self,
            _request: &ChangeRequest,
            _ctx: &EvaluationContext,
        ) -> LibrarianResult<Vec<Violation>> {
            Ok(self
                .severities
                .iter()
                .map(|s| Violation::new(self.id, *s, format!("{} finding", s)))
                .collect())
        }
    }

    /// Approve when clean, escalate on critical, otherwise revise.
    struct SimplePolicy;

    impl DecisionPolicy for SimplePolicy {
        fn decide(&self, violations: &[Violation], rule_errors: &[RuleError]) -> PolicyOutcome {
            let status = if violations.is_empty() && rule_errors.is_empty() {
                ValidationStatus::Approved
            } else if violations.iter().any(|v| v.severity == Severity::Critical) {
                ValidationStatus::Escalated
            } else {
                ValidationStatus::RevisionRequired
            };
            PolicyOutcome {
                status,
                rationale: format!("{} violation(s)", violations.len()),
                confidence: 1.0,
                impact_level: ImpactLevel::Low,
            }
        }
    }

    /// Escalates on an escalated outcome or an unauthorized override.
    struct SimpleAdvisor;

    impl EscalationAdvisor for SimpleAdvisor {
        fn advise(&self, input: &EscalationInput<'_>) -> EscalationDecision {
            if input.outcome.status == ValidationStatus::Escalated {
                return EscalationDecision {
                    escalate: true,
                    reason: "policy escalated".to_string(),
                };
            }
            if input.override_requested && !input.actor_has_override {
                return EscalationDecision {
                    escalate: true,
                    reason: "override requested without authority".to_string(),
                };
            }
            EscalationDecision::none()
        }
    }

    struct UnavailableAuthority;

    #[async_trait]
    impl OverrideAuthority for UnavailableAuthority {
        async fn has_override_authority(&self, _actor_id: &str) -> LibrarianResult<bool> {
            Err(LibrarianError::AuthorityUnavailable {
                reason: "connection refused".to_string(),
            })
        }
    }

    /// A ledger that keeps events in a Vec and can be told to fail.
    struct MockLedger {
        events: Mutex<Vec<AuditEvent>>,
        fail: bool,
    }

    impl MockLedger {
        fn new() -> Arc<Self> {
            Arc::new(Self { events: Mutex::new(vec![]), fail: false })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { events: Mutex::new(vec![]), fail: true })
        }

        fn events(&self) -> Vec<AuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuditLedger for MockLedger {
        async fn append(&self, entry: AuditEntry) -> LibrarianResult<AuditEvent> {
            if self.fail {
                return Err(LibrarianError::AuditWriteFailed {
                    reason: "disk full".to_string(),
                });
            }
            let mut events = self.events.lock().unwrap();
            let event = AuditEvent {
                id: format!("evt-{}", events.len()),
                sequence: events.len() as u64,
                timestamp: Utc::now(),
                category: entry.category,
                actor_id: entry.actor_id,
                target_id: entry.target_id,
                payload: entry.payload,
                supersedes_event_id: entry.supersedes_event_id,
                previous_hash: AuditEvent::SEED_HASH.to_string(),
                event_hash: AuditEvent::SEED_HASH.to_string(),
            };
            events.push(event.clone());
            Ok(event)
        }

        async fn query(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>> {
            Ok(self
                .events()
                .into_iter()
                .filter(|e| filter.matches(e))
                .collect())
        }

        async fn get(&self, event_id: &str) -> LibrarianResult<Option<AuditEvent>> {
            Ok(self.events().into_iter().find(|e| e.id == event_id))
        }

        async fn verify_chain(&self, from: u64, to: u64) -> LibrarianResult<ChainReport> {
            Ok(ChainReport { from, to, checked: 0, mismatch: None })
        }

        async fn statistics(&self) -> LibrarianResult<AuditStatistics> {
            Ok(AuditStatistics {
                total_events: self.events().len(),
                ..AuditStatistics::default()
            })
        }
    }

    struct OneFindingScanner;

    #[async_trait]
    impl DriftScanner for OneFindingScanner {
        async fn scan(&self) -> DriftScanReport {
            DriftScanReport {
                findings: vec![DriftFinding {
                    kind: DriftKind::DesignAheadOfBasis,
                    severity: Severity::High,
                    subject_id: "DES-1".to_string(),
                    related_id: Some("ARCH-1".to_string()),
                    description: "design edited after its architecture".to_string(),
                    detected_at: Utc::now() - Duration::seconds(1),
                }],
                errors: vec![],
            }
        }
    }

    fn make_orchestrator(
        severities: Vec<Severity>,
        authority: Box<dyn OverrideAuthority>,
        ledger: Arc<MockLedger>,
    ) -> Orchestrator {
        let rules: Vec<Arc<dyn Rule>> = vec![Arc::new(FixedRule { id: "TEST-001", severities })];
        Orchestrator::new(
            rules,
            Box::new(SimplePolicy),
            Box::new(SimpleAdvisor),
            authority,
            ledger,
            &EngineConfig::default(),
        )
    }

    fn make_request(override_requested: bool) -> ChangeRequest {
        ChangeRequest::builder("req-1", "agent-1", ChangeAction::Modify, TargetType::Design)
            .target("DES-1")
            .rationale("align with architecture")
            .override_requested(override_requested)
            .build()
            .unwrap()
    }

    // ── Test cases ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clean_request_is_approved_and_recorded() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), ledger.clone());

        let decision = orchestrator
            .evaluate(make_request(false), EvaluationContext::new())
            .await
            .unwrap();

        assert_eq!(decision.status, ValidationStatus::Approved);
        assert_eq!(decision.rules_executed, 1);
        assert!(decision.escalation_reason.is_none());

        let events = ledger.events();
        assert_eq!(events.len(), 1, "exactly one decision event per evaluation");
        assert_eq!(events[0].category, AuditCategory::Decision);
        assert_eq!(events[0].target_id.as_deref(), Some("DES-1"));
        assert_eq!(events[0].payload["status"], json!("approved"));
    }

    /// The audit guarantee is stronger than availability.
    #[tokio::test]
    async fn test_ledger_failure_fails_evaluation() {
        let orchestrator = make_orchestrator(
            vec![],
            Box::new(AuthorityGrants::default()),
            MockLedger::failing(),
        );

        let result = orchestrator
            .evaluate(make_request(false), EvaluationContext::new())
            .await;

        match result {
            Err(LibrarianError::AuditWriteFailed { reason }) => assert_eq!(reason, "disk full"),
            other => panic!("expected AuditWriteFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_recorded() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), ledger.clone());

        let mut request = make_request(false);
        request.rationale = String::new();
        let result = orchestrator.evaluate(request, EvaluationContext::new()).await;

        assert!(matches!(result, Err(LibrarianError::InvalidRequest { .. })));
        assert!(ledger.events().is_empty());
    }

    #[tokio::test]
    async fn test_critical_violation_escalates_with_reason() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(
            vec![Severity::Critical, Severity::Medium],
            Box::new(AuthorityGrants::default()),
            ledger,
        );

        let decision = orchestrator
            .evaluate(make_request(false), EvaluationContext::new())
            .await
            .unwrap();

        assert_eq!(decision.status, ValidationStatus::Escalated);
        assert_eq!(decision.escalation_reason.as_deref(), Some("policy escalated"));
        assert_eq!(decision.violations[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_override_without_authority_escalates() {
        let orchestrator = make_orchestrator(
            vec![Severity::Low],
            Box::new(AuthorityGrants::default()),
            MockLedger::new(),
        );

        let decision = orchestrator
            .evaluate(make_request(true), EvaluationContext::new())
            .await
            .unwrap();

        assert_eq!(decision.status, ValidationStatus::Escalated);
    }

    #[tokio::test]
    async fn test_override_with_authority_keeps_policy_status() {
        let mut grants = AuthorityGrants::default();
        grants.grant("agent-1");
        let orchestrator = make_orchestrator(vec![Severity::Low], Box::new(grants), MockLedger::new());

        let decision = orchestrator
            .evaluate(make_request(true), EvaluationContext::new())
            .await
            .unwrap();

        assert_eq!(decision.status, ValidationStatus::RevisionRequired);
    }

    #[tokio::test]
    async fn test_authority_failure_counts_as_no_authority() {
        let orchestrator = make_orchestrator(vec![], Box::new(UnavailableAuthority), MockLedger::new());

        let decision = orchestrator
            .evaluate(make_request(true), EvaluationContext::new())
            .await
            .unwrap();

        assert_eq!(decision.status, ValidationStatus::Escalated);
    }

    /// A review appends a superseding event and leaves the original intact.
    #[tokio::test]
    async fn test_review_supersedes_original() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(
            vec![Severity::Critical],
            Box::new(AuthorityGrants::default()),
            ledger.clone(),
        );

        orchestrator
            .evaluate(make_request(false), EvaluationContext::new())
            .await
            .unwrap();
        let original = ledger.events()[0].clone();

        let reviewed = orchestrator
            .record_review(ReviewOutcome {
                supersedes_event_id: original.id.clone(),
                reviewer_id: "lead-architect".to_string(),
                status: ValidationStatus::Rejected,
                rationale: "breaks the layering".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(reviewed.status, ValidationStatus::Rejected);
        assert_eq!(reviewed.request_id, "req-1");

        let events = ledger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], original, "the original event must be untouched");
        assert_eq!(events[1].supersedes_event_id.as_deref(), Some(original.id.as_str()));
        assert_eq!(events[1].actor_id, "lead-architect");

        let stored: Decision = serde_json::from_value(events[1].payload.clone()).unwrap();
        assert_eq!(stored.status, ValidationStatus::Rejected);
    }

    fn review(event_id: &str, reviewer: &str, status: ValidationStatus) -> ReviewOutcome {
        ReviewOutcome {
            supersedes_event_id: event_id.to_string(),
            reviewer_id: reviewer.to_string(),
            status,
            rationale: "reviewed by hand".to_string(),
        }
    }

    /// Automatic outcomes are final; only escalations go to a human.
    #[tokio::test]
    async fn test_review_of_non_escalated_decision_fails() {
        for (severities, expected) in [
            (vec![], ValidationStatus::Approved),
            (vec![Severity::Medium], ValidationStatus::RevisionRequired),
        ] {
            let ledger = MockLedger::new();
            let orchestrator = make_orchestrator(severities, Box::new(AuthorityGrants::default()), ledger.clone());
            let decision = orchestrator
                .evaluate(make_request(false), EvaluationContext::new())
                .await
                .unwrap();
            assert_eq!(decision.status, expected);

            let result = orchestrator
                .record_review(review("evt-0", "lead-architect", ValidationStatus::Rejected))
                .await;

            match result {
                Err(LibrarianError::InvalidRequest { reason }) => {
                    assert!(reason.contains("only escalated decisions"), "reason: {reason}")
                }
                other => panic!("expected InvalidRequest for {expected}, got {:?}", other),
            }
            assert_eq!(ledger.events().len(), 1, "a refused review appends nothing");
        }
    }

    #[tokio::test]
    async fn test_escalated_decision_is_resolved_once() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(
            vec![Severity::Critical],
            Box::new(AuthorityGrants::default()),
            ledger.clone(),
        );
        orchestrator
            .evaluate(make_request(false), EvaluationContext::new())
            .await
            .unwrap();

        orchestrator
            .record_review(review("evt-0", "lead-architect", ValidationStatus::Rejected))
            .await
            .unwrap();
        let second = orchestrator
            .record_review(review("evt-0", "other-architect", ValidationStatus::Approved))
            .await;

        match second {
            Err(LibrarianError::InvalidRequest { reason }) => {
                assert!(reason.contains("already resolved by event 'evt-1'"), "reason: {reason}");
                assert!(reason.contains("lead-architect"), "reason: {reason}");
            }
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
        assert_eq!(ledger.events().len(), 2);
    }

    #[tokio::test]
    async fn test_review_cannot_resolve_to_escalated() {
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), MockLedger::new());

        let result = orchestrator
            .record_review(ReviewOutcome {
                supersedes_event_id: "evt-0".to_string(),
                reviewer_id: "lead-architect".to_string(),
                status: ValidationStatus::Escalated,
                rationale: "unsure".to_string(),
            })
            .await;

        assert!(matches!(result, Err(LibrarianError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_review_of_unknown_event_fails() {
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), MockLedger::new());

        let result = orchestrator
            .record_review(ReviewOutcome {
                supersedes_event_id: "evt-missing".to_string(),
                reviewer_id: "lead-architect".to_string(),
                status: ValidationStatus::Approved,
                rationale: "fine".to_string(),
            })
            .await;

        match result {
            Err(LibrarianError::InvalidRequest { reason }) => assert!(reason.contains("evt-missing")),
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_drift_scan_records_findings() {
        let ledger = MockLedger::new();
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), ledger.clone())
            .with_drift_scanner(Box::new(OneFindingScanner));

        let report = orchestrator.run_drift_scan().await.unwrap();

        assert_eq!(report.findings.len(), 1);
        let events = ledger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, AuditCategory::Drift);
        assert_eq!(events[0].actor_id, "drift-detector");
        assert_eq!(events[0].target_id.as_deref(), Some("DES-1"));
    }

    #[tokio::test]
    async fn test_drift_scan_without_scanner_is_config_error() {
        let orchestrator = make_orchestrator(vec![], Box::new(AuthorityGrants::default()), MockLedger::new());
        let result = orchestrator.run_drift_scan().await;
        assert!(matches!(result, Err(LibrarianError::ConfigError { .. })));
    }
}
