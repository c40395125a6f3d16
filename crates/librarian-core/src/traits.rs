//! Core trait definitions for the Librarian evaluation pipeline.
//!
//! These traits define the trust boundaries of the engine:
//!
//! - `Rule`              — pure compliance check over an in-memory snapshot
//! - `DecisionPolicy`    — reduces findings into a status and rationale
//! - `EscalationAdvisor` — may upgrade a status to escalated, never downgrade
//! - `OverrideAuthority` — external authorization collaborator
//! - `EventStore`        — durable append/read store behind the audit ledger
//! - `AuditLedger`       — the hash-chained, append-only decision record
//! - `GraphStore`        — structural queries for the drift detector
//! - `DriftScanner`      — the drift detector as seen by the orchestrator
//!
//! The synchronous traits never perform I/O. Everything that touches a store
//! or another service is async and lives outside the timed rule phase.

use async_trait::async_trait;
use serde_json::{Map, Value};

use librarian_contracts::{
    audit::{AuditEntry, AuditEvent, AuditFilter, AuditStatistics, ChainReport},
    authority::AuthorityGrants,
    context::EvaluationContext,
    decision::{EscalationDecision, PolicyOutcome},
    drift::DriftScanReport,
    error::LibrarianResult,
    request::ChangeRequest,
    violation::{RuleError, Violation},
};

/// One row returned by a graph store query, keyed by the query's RETURN
/// aliases.
pub type Record = Map<String, Value>;

/// A single compliance rule.
///
/// Rules are stateless and independent of one another. The runner executes
/// them concurrently on blocking worker threads, so `evaluate` must not
/// perform I/O or wait on anything outside its arguments.
pub trait Rule: Send + Sync {
    /// Stable identifier, e.g. "ARCH-001". The prefix before the first '-' is
    /// the rule's category.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Check `request` against the snapshot and return every finding.
    ///
    /// An `Err` means the rule could not decide. The runner records it as a
    /// `RuleError` and never treats it as a pass.
    fn evaluate(
        &self,
        request: &ChangeRequest,
        ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>>;
}

/// The decision policy: a pure, deterministic reduction of findings.
pub trait DecisionPolicy: Send + Sync {
    /// Map the aggregated findings to a status, rationale, confidence and
    /// impact level.
    ///
    /// `violations` arrive in presentation order.
    fn decide(&self, violations: &[Violation], rule_errors: &[RuleError]) -> PolicyOutcome;
}

/// Everything the escalation advisor looks at.
#[derive(Debug, Clone, Copy)]
pub struct EscalationInput<'a> {
    pub outcome: &'a PolicyOutcome,
    pub violations: &'a [Violation],
    pub override_requested: bool,
    /// Result of the authority lookup. A failed lookup is `false`.
    pub actor_has_override: bool,
}

/// Independent check layered after the decision policy.
pub trait EscalationAdvisor: Send + Sync {
    /// Decide whether the evaluation must go to human review.
    fn advise(&self, input: &EscalationInput<'_>) -> EscalationDecision;
}

/// The authorization collaborator consulted for override requests.
#[async_trait]
pub trait OverrideAuthority: Send + Sync {
    async fn has_override_authority(&self, actor_id: &str) -> LibrarianResult<bool>;
}

#[async_trait]
impl OverrideAuthority for AuthorityGrants {
    async fn has_override_authority(&self, actor_id: &str) -> LibrarianResult<bool> {
        Ok(self.has(actor_id))
    }
}

/// The durable store behind the audit ledger.
///
/// Implementations never update or delete events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist `event` at the tail of the chain and return its ID.
    ///
    /// Optimistic: fails with `LedgerAppendConflict` when `event.previous_hash`
    /// is not the current tail's `event_hash` (or the seed for an empty
    /// store).
    async fn append_event(&self, event: &AuditEvent) -> LibrarianResult<String>;

    /// Events matching `filter`, in chain order, paginated.
    async fn read_events(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>>;

    /// A single event by ID.
    async fn read_event(&self, event_id: &str) -> LibrarianResult<Option<AuditEvent>>;

    /// The current tail, or `None` for an empty store.
    async fn last_event(&self) -> LibrarianResult<Option<AuditEvent>>;

    /// Events with `from <= sequence < to`, in chain order.
    async fn read_range(&self, from: u64, to: u64) -> LibrarianResult<Vec<AuditEvent>>;
}

/// The audit ledger: the immutable decision record.
///
/// A failed append is fatal to the evaluation that caused it. No decision is
/// ever returned without a confirmed ledger record.
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// Append one entry to the chain and return the stored event.
    async fn append(&self, entry: AuditEntry) -> LibrarianResult<AuditEvent>;

    /// Read events matching `filter`.
    async fn query(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>>;

    /// A single event by ID.
    async fn get(&self, event_id: &str) -> LibrarianResult<Option<AuditEvent>>;

    /// Recompute hashes and linkage over `from <= sequence < to` and report
    /// the first mismatch.
    async fn verify_chain(&self, from: u64, to: u64) -> LibrarianResult<ChainReport>;

    /// Aggregate counts over the whole ledger.
    async fn statistics(&self) -> LibrarianResult<AuditStatistics>;
}

/// The external graph store as seen by the drift detector.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a structural query. The pattern language belongs to the store.
    async fn query(&self, pattern: &str) -> LibrarianResult<Vec<Record>>;
}

/// The drift detector as seen by the orchestrator.
#[async_trait]
pub trait DriftScanner: Send + Sync {
    /// Run every structural check. A failing check is reported in
    /// `DriftScanReport::errors` and never aborts the others.
    async fn scan(&self) -> DriftScanReport;
}
