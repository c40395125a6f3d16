//! Scenario E: two writers race for the same chain tail.
//!
//! Two ledger instances (think two engine replicas) share one event store and
//! both start from the same tail. Both append at once. The store accepts
//! exactly one of them first; the other is refused, reloads the tail, and
//! lands second, linked to the winner.
//!
//! Pipeline walk-through for the demo run:
//!   1. Replica A and replica B open over the same empty store
//!   2. Both append concurrently against the seed
//!   3. One write wins; the loser retries on the new tail
//!   4. The chain has two events and no shared previous_hash

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use librarian_audit::{HashChainLedger, InMemoryEventStore};
use librarian_contracts::{
    audit::{AuditCategory, AuditEntry, AuditEvent},
    error::LibrarianResult,
};
use librarian_core::traits::AuditLedger;

use crate::mock_data::engine_config;

#[derive(Debug)]
pub struct ConcurrentAppendOutcome {
    /// Both stored events, in chain order.
    pub events: Vec<AuditEvent>,
    pub distinct_previous_hashes: usize,
    pub chain_intact: bool,
}

fn replica_entry(replica: &str) -> AuditEntry {
    AuditEntry::new(
        AuditCategory::Decision,
        format!("replica-{}", replica),
        json!({ "status": "approved", "rationale": "all compliance checks passed", "replica": replica }),
    )
    .with_target(Some("DES-CHECKOUT".to_string()))
}

pub async fn execute() -> LibrarianResult<ConcurrentAppendOutcome> {
    let config = engine_config()?;
    let store = Arc::new(InMemoryEventStore::new());
    let replica_a = HashChainLedger::open(store.clone(), &config.ledger).await?;
    let replica_b = HashChainLedger::open(store.clone(), &config.ledger).await?;

    let (a, b) = tokio::join!(
        replica_a.append(replica_entry("a")),
        replica_b.append(replica_entry("b")),
    );
    let mut events = vec![a?, b?];
    events.sort_by_key(|e| e.sequence);

    let distinct_previous_hashes = events
        .iter()
        .map(|e| e.previous_hash.as_str())
        .collect::<HashSet<_>>()
        .len();
    let chain_intact = replica_a.verify_chain(0, u64::MAX).await?.is_intact();

    Ok(ConcurrentAppendOutcome {
        events,
        distinct_previous_hashes,
        chain_intact,
    })
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario E and print the resulting chain.
pub async fn run_scenario() -> LibrarianResult<()> {
    println!("=== Scenario E: Concurrent Appends Against One Tail ===");
    println!();

    let outcome = execute().await?;

    for event in &outcome.events {
        println!(
            "  #{} {:<10} prev={}… hash={}…",
            event.sequence,
            event.actor_id,
            short(&event.previous_hash),
            short(&event.event_hash)
        );
    }
    println!();
    println!(
        "  Distinct previous_hash:  {} of {}",
        outcome.distinct_previous_hashes,
        outcome.events.len()
    );
    println!(
        "  Audit chain integrity:   {}",
        if outcome.chain_intact { "VERIFIED" } else { "FAILED" }
    );
    println!();
    println!("  Scenario E complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loser_links_to_winner() {
        let outcome = execute().await.unwrap();
        let (first, second) = (&outcome.events[0], &outcome.events[1]);

        assert_eq!(first.sequence, 0);
        assert_eq!(first.previous_hash, AuditEvent::SEED_HASH);
        assert_eq!(second.sequence, 1);
        assert_eq!(
            second.previous_hash, first.event_hash,
            "the second write must observe the updated tail"
        );
        assert_ne!(first.actor_id, second.actor_id, "one event per replica");
    }

    #[tokio::test]
    async fn test_no_duplicate_previous_hash() {
        let outcome = execute().await.unwrap();
        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.distinct_previous_hashes, 2);
        assert!(outcome.chain_intact);
    }
}
