//! # librarian-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit ledger for the
//! Librarian governance engine.
//!
//! ## Overview
//!
//! Every decision, review and drift finding is appended as an `AuditEvent`
//! that links to the previous event via its SHA-256 hash. Tampering with any
//! stored event, even a single byte of its payload, breaks the chain and is
//! reported by `verify_chain` with the first mismatching position.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use librarian_audit::{HashChainLedger, InMemoryEventStore};
//! use librarian_core::traits::AuditLedger;
//!
//! let store = Arc::new(InMemoryEventStore::new());
//! let ledger = HashChainLedger::open(store, &LedgerConfig::default()).await?;
//! ledger.append(entry).await?;
//!
//! assert!(ledger.verify_chain(0, u64::MAX).await?.is_intact());
//! ```

pub mod chain;
pub mod ledger;
pub mod memory;

pub use chain::{canonical_json, hash_event, verify_events};
pub use ledger::HashChainLedger;
pub use memory::InMemoryEventStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use librarian_contracts::{
        audit::{AuditCategory, AuditEntry, AuditEvent, AuditFilter},
        config::LedgerConfig,
        error::{LibrarianError, LibrarianResult},
    };
    use librarian_core::traits::{AuditLedger, EventStore};

    use super::{canonical_json, HashChainLedger, InMemoryEventStore};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn decision_entry(target: &str, status: &str) -> AuditEntry {
        AuditEntry::new(
            AuditCategory::Decision,
            "alice",
            json!({ "status": status, "rationale": format!("{} for {}", status, target) }),
        )
        .with_target(Some(target.to_string()))
    }

    async fn ledger_over(store: Arc<InMemoryEventStore>) -> HashChainLedger {
        HashChainLedger::open(store, &LedgerConfig::default())
            .await
            .unwrap()
    }

    /// A store whose tail always moves under the writer.
    struct AlwaysConflictingStore;

    #[async_trait]
    impl EventStore for AlwaysConflictingStore {
        async fn append_event(&self, _event: &AuditEvent) -> LibrarianResult<String> {
            Err(LibrarianError::LedgerAppendConflict { attempts: 1 })
        }
        async fn read_events(&self, _filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>> {
            Ok(vec![])
        }
        async fn read_event(&self, _event_id: &str) -> LibrarianResult<Option<AuditEvent>> {
            Ok(None)
        }
        async fn last_event(&self) -> LibrarianResult<Option<AuditEvent>> {
            Ok(None)
        }
        async fn read_range(&self, _from: u64, _to: u64) -> LibrarianResult<Vec<AuditEvent>> {
            Ok(vec![])
        }
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    /// Appending three events and verifying produces an intact chain.
    #[tokio::test]
    async fn test_hash_chain_integrity() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        ledger.append(decision_entry("DES-1", "approved")).await.unwrap();
        ledger.append(decision_entry("DES-2", "escalated")).await.unwrap();
        ledger.append(decision_entry("DES-3", "approved")).await.unwrap();

        let report = ledger.verify_chain(0, 3).await.unwrap();
        assert!(report.is_intact(), "chain must be intact after sequential appends");
        assert_eq!(report.checked, 3);

        let again = ledger.verify_chain(0, 3).await.unwrap();
        assert_eq!(report, again, "verification must be repeatable");
    }

    /// Mutating a stored payload breaks the chain at exactly that position.
    #[tokio::test]
    async fn test_tamper_detection() {
        let store = Arc::new(InMemoryEventStore::new());
        let ledger = ledger_over(store.clone()).await;
        for status in ["approved", "escalated", "approved"] {
            ledger.append(decision_entry("DES-1", status)).await.unwrap();
        }

        {
            let mut events = store.events.write().unwrap();
            events[1].payload = json!({ "status": "approved", "rationale": "forged" });
        }

        let report = ledger.verify_chain(0, 3).await.unwrap();
        let mismatch = report.mismatch.expect("tampered chain must report a mismatch");
        assert_eq!(mismatch.position, 1, "first mismatch must be the tampered event");
        assert!(mismatch.reason.contains("event_hash"));
    }

    /// The first event always links to the seed.
    #[tokio::test]
    async fn test_genesis_hash() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        let first = ledger.append(decision_entry("DES-1", "approved")).await.unwrap();

        assert_eq!(first.sequence, 0);
        assert_eq!(
            first.previous_hash,
            AuditEvent::SEED_HASH,
            "genesis event must link to 64 zero characters"
        );
        assert_eq!(first.event_hash.len(), 64);
    }

    /// Each event's previous_hash is the preceding event's event_hash.
    #[tokio::test]
    async fn test_linkage_and_sequence() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        let mut events = Vec::new();
        for i in 0..5 {
            events.push(ledger.append(decision_entry(&format!("DES-{}", i), "approved")).await.unwrap());
        }

        for pair in events.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].event_hash);
            assert_eq!(pair[1].sequence, pair[0].sequence + 1);
        }
        assert_eq!(ledger.tail_hash().await, events[4].event_hash);
    }

    /// A middle range verifies against the event before it.
    #[tokio::test]
    async fn test_verify_partial_range() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        for i in 0..4 {
            ledger.append(decision_entry(&format!("DES-{}", i), "approved")).await.unwrap();
        }

        let report = ledger.verify_chain(1, 3).await.unwrap();
        assert!(report.is_intact());
        assert_eq!(report.checked, 2);

        let empty = ledger.verify_chain(3, 3).await.unwrap();
        assert!(empty.is_intact(), "an empty range is trivially intact");
        assert_eq!(empty.checked, 0);
    }

    /// Query by target returns exactly that target's events, in chain order.
    #[tokio::test]
    async fn test_query_by_target_round_trip() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        let a1 = ledger.append(decision_entry("DES-A", "revision_required")).await.unwrap();
        ledger.append(decision_entry("DES-B", "approved")).await.unwrap();
        let a2 = ledger.append(decision_entry("DES-A", "approved")).await.unwrap();

        let found = ledger.query(&AuditFilter::for_target("DES-A")).await.unwrap();
        assert_eq!(found, vec![a1.clone(), a2]);

        let fetched = ledger.get(&a1.id).await.unwrap();
        assert_eq!(fetched, Some(a1));
        assert_eq!(ledger.get("missing").await.unwrap(), None);

        let page = ledger
            .query(&AuditFilter::default().page(1, 1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].target_id.as_deref(), Some("DES-B"));
    }

    /// Concurrent appends never share a previous_hash, and the chain stays
    /// intact.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_serialized() {
        let ledger = Arc::new(ledger_over(Arc::new(InMemoryEventStore::new())).await);

        let mut handles = Vec::new();
        for i in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.append(decision_entry(&format!("DES-{}", i), "approved")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let events = ledger.query(&AuditFilter::default()).await.unwrap();
        assert_eq!(events.len(), 20);
        let previous: HashSet<_> = events.iter().map(|e| e.previous_hash.clone()).collect();
        assert_eq!(previous.len(), 20, "no two events may share a previous_hash");
        assert!(ledger.verify_chain(0, 20).await.unwrap().is_intact());
    }

    /// Two ledgers over one store: the stale writer retries on the new tail.
    #[tokio::test]
    async fn test_conflict_retry_against_shared_store() {
        let store = Arc::new(InMemoryEventStore::new());
        let first = ledger_over(store.clone()).await;
        let second = ledger_over(store.clone()).await;

        let a = first.append(decision_entry("DES-1", "approved")).await.unwrap();
        let b = second.append(decision_entry("DES-2", "approved")).await.unwrap();

        assert_eq!(b.previous_hash, a.event_hash, "retry must link to the winner");
        assert_eq!(b.sequence, 1);
        assert_eq!(store.len(), 2);
        assert!(first.verify_chain(0, 2).await.unwrap().is_intact());
    }

    /// Exhausted retries surface the conflict with the attempt count.
    #[tokio::test]
    async fn test_conflict_retries_exhausted() {
        let config = LedgerConfig {
            max_append_retries: 3,
            ..LedgerConfig::default()
        };
        let ledger = HashChainLedger::open(Arc::new(AlwaysConflictingStore), &config)
            .await
            .unwrap();

        let err = ledger.append(decision_entry("DES-1", "approved")).await.unwrap_err();
        assert!(
            matches!(err, LibrarianError::LedgerAppendConflict { attempts: 4 }),
            "one attempt plus three retries, got {:?}",
            err
        );
    }

    /// Reopening over a populated store continues the same chain.
    #[tokio::test]
    async fn test_reopen_continues_chain() {
        let store = Arc::new(InMemoryEventStore::new());
        let last = {
            let ledger = ledger_over(store.clone()).await;
            ledger.append(decision_entry("DES-1", "approved")).await.unwrap();
            ledger.append(decision_entry("DES-2", "approved")).await.unwrap()
        };

        let reopened = ledger_over(store).await;
        let next = reopened.append(decision_entry("DES-3", "approved")).await.unwrap();
        assert_eq!(next.sequence, 2);
        assert_eq!(next.previous_hash, last.event_hash);
    }

    #[tokio::test]
    async fn test_statistics() {
        let ledger = ledger_over(Arc::new(InMemoryEventStore::new())).await;
        ledger.append(decision_entry("DES-1", "approved")).await.unwrap();
        ledger.append(decision_entry("DES-2", "escalated")).await.unwrap();
        ledger.append(decision_entry("DES-3", "approved")).await.unwrap();
        ledger
            .append(AuditEntry::new(
                AuditCategory::Drift,
                "drift-detector",
                json!({ "kind": "uncovered_requirement" }),
            ))
            .await
            .unwrap();

        let stats = ledger.statistics().await.unwrap();
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.by_category.get(&AuditCategory::Decision), Some(&3));
        assert_eq!(stats.by_category.get(&AuditCategory::Drift), Some(&1));
        assert_eq!(stats.by_status.get("approved"), Some(&2));
        assert_eq!(stats.by_status.get("escalated"), Some(&1));
        assert!(stats.earliest <= stats.latest);
    }

    /// Re-seeding verifies the stored chain and records a system event.
    #[tokio::test]
    async fn test_reseed() {
        let store = Arc::new(InMemoryEventStore::new());
        let ledger = ledger_over(store.clone()).await;
        ledger.append(decision_entry("DES-1", "approved")).await.unwrap();

        let event = ledger.reseed("operator").await.unwrap();
        assert_eq!(event.category, AuditCategory::System);
        assert_eq!(event.sequence, 1);

        {
            let mut events = store.events.write().unwrap();
            events[0].actor_id = "mallory".to_string();
        }
        let err = ledger.reseed("operator").await.unwrap_err();
        assert!(
            matches!(err, LibrarianError::ChainIntegrity { position: 0, .. }),
            "re-seed must refuse a broken chain, got {:?}",
            err
        );
    }

    /// Key order never changes the hash input.
    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({ "b": 1, "a": { "d": [2, { "z": null, "y": true }], "c": "x" } });
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":{"c":"x","d":[2,{"y":true,"z":null}]},"b":1}"#
        );
    }
}
