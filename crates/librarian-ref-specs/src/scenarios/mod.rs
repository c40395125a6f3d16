//! Reference scenarios for the Librarian governance engine.
//!
//! Each scenario is a self-contained module that wires up real Librarian
//! components (default rule set, threshold policy, escalation advisor,
//! hash-chained ledger, drift detector) over the mock catalog and
//! demonstrates one outcome of the pipeline.

pub mod approved_change;
pub mod concurrent_append;
pub mod critical_escalation;
pub mod drift_scan;
pub mod high_threshold;

use std::sync::Arc;

use librarian_audit::{HashChainLedger, InMemoryEventStore};
use librarian_contracts::{config::EngineConfig, error::LibrarianResult};
use librarian_core::Orchestrator;
use librarian_policy::{ConfiguredEscalationAdvisor, ThresholdPolicy};
use librarian_rules::default_rules;

use crate::mock_data::override_grants;

/// An orchestrator plus an inspectable handle on its ledger.
pub struct ReferenceEngine {
    pub orchestrator: Orchestrator,
    pub ledger: Arc<HashChainLedger>,
}

/// Wire the production components over a fresh in-memory event store.
pub async fn reference_engine(config: &EngineConfig) -> LibrarianResult<ReferenceEngine> {
    let store = Arc::new(InMemoryEventStore::new());
    let ledger = Arc::new(HashChainLedger::open(store, &config.ledger).await?);

    let orchestrator = Orchestrator::new(
        default_rules().into_rules(),
        Box::new(ThresholdPolicy::new(config.policy.clone())),
        Box::new(ConfiguredEscalationAdvisor::new(config.policy.clone())),
        Box::new(override_grants()),
        ledger.clone(),
        config,
    );

    Ok(ReferenceEngine { orchestrator, ledger })
}
