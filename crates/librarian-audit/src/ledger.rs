//! `HashChainLedger`: the hash-chained `AuditLedger` over any `EventStore`.
//!
//! Within one process, appends are serialized on the cached chain tail. Across
//! processes sharing a store, the store's optimistic check refuses a stale
//! `previous_hash`, and the ledger reloads the tail and retries up to
//! `max_append_retries` times before surfacing `LedgerAppendConflict`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use librarian_contracts::{
    audit::{AuditCategory, AuditEntry, AuditEvent, AuditFilter, AuditStatistics, ChainReport},
    config::LedgerConfig,
    error::{LibrarianError, LibrarianResult},
};
use librarian_core::traits::{AuditLedger, EventStore};

use crate::chain::{hash_event, verify_events};

/// The cached end of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChainTail {
    hash: String,
    next_sequence: u64,
}

impl ChainTail {
    fn genesis() -> Self {
        Self {
            hash: AuditEvent::SEED_HASH.to_string(),
            next_sequence: 0,
        }
    }
}

/// Append-only, hash-chained audit ledger.
pub struct HashChainLedger {
    store: Arc<dyn EventStore>,
    tail: Mutex<ChainTail>,
    max_append_retries: u32,
}

impl HashChainLedger {
    /// Open a ledger over `store`, continuing from its current tail.
    pub async fn open(store: Arc<dyn EventStore>, config: &LedgerConfig) -> LibrarianResult<Self> {
        let tail = Self::load_tail(store.as_ref()).await?;
        info!(
            next_sequence = tail.next_sequence,
            tail_hash = %tail.hash,
            "audit ledger opened"
        );
        Ok(Self {
            store,
            tail: Mutex::new(tail),
            max_append_retries: config.max_append_retries,
        })
    }

    /// The `event_hash` the next append will link to.
    pub async fn tail_hash(&self) -> String {
        self.tail.lock().await.hash.clone()
    }

    /// Operator-controlled re-seeding after disaster recovery.
    ///
    /// Verifies the whole stored chain from the seed. On success the cached
    /// tail is reloaded from the store and a system event recording the
    /// re-seed is appended. A broken chain is refused with `ChainIntegrity`.
    pub async fn reseed(&self, operator_id: &str) -> LibrarianResult<AuditEvent> {
        let mut tail = self.tail.lock().await;

        let events = self.store.read_range(0, u64::MAX).await?;
        if let Some(m) = verify_events(&events, AuditEvent::SEED_HASH, 0) {
            error!(position = m.position, event_id = %m.event_id, reason = %m.reason, "re-seed refused");
            return Err(LibrarianError::ChainIntegrity {
                position: m.position,
                event_id: m.event_id,
                reason: m.reason,
            });
        }

        *tail = Self::load_tail(self.store.as_ref()).await?;
        warn!(operator = %operator_id, next_sequence = tail.next_sequence, "audit ledger re-seeded");

        let entry = AuditEntry::new(
            AuditCategory::System,
            operator_id,
            json!({
                "note": "ledger re-seeded after verified recovery",
                "verified_events": events.len(),
            }),
        );
        self.append_at_tail(&mut tail, entry).await
    }

    async fn load_tail(store: &dyn EventStore) -> LibrarianResult<ChainTail> {
        Ok(match store.last_event().await? {
            Some(last) => ChainTail {
                hash: last.event_hash,
                next_sequence: last.sequence + 1,
            },
            None => ChainTail::genesis(),
        })
    }

    async fn append_at_tail(
        &self,
        tail: &mut ChainTail,
        entry: AuditEntry,
    ) -> LibrarianResult<AuditEvent> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;

            let timestamp = Utc::now();
            let event_hash = hash_event(&tail.hash, &entry.payload, &timestamp, &entry.actor_id)?;
            let event = AuditEvent {
                id: Uuid::new_v4().to_string(),
                sequence: tail.next_sequence,
                timestamp,
                category: entry.category,
                actor_id: entry.actor_id.clone(),
                target_id: entry.target_id.clone(),
                payload: entry.payload.clone(),
                supersedes_event_id: entry.supersedes_event_id.clone(),
                previous_hash: tail.hash.clone(),
                event_hash,
            };

            match self.store.append_event(&event).await {
                Ok(_) => {
                    tail.hash = event.event_hash.clone();
                    tail.next_sequence += 1;
                    debug!(
                        event_id = %event.id,
                        sequence = event.sequence,
                        category = %event.category,
                        "audit event appended"
                    );
                    return Ok(event);
                }
                Err(LibrarianError::LedgerAppendConflict { .. })
                    if attempts <= self.max_append_retries =>
                {
                    warn!(attempt = attempts, "audit append conflict, reloading chain tail");
                    *tail = Self::load_tail(self.store.as_ref()).await?;
                }
                Err(LibrarianError::LedgerAppendConflict { .. }) => {
                    error!(attempts, "audit append conflict, retries exhausted");
                    return Err(LibrarianError::LedgerAppendConflict { attempts });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl AuditLedger for HashChainLedger {
    async fn append(&self, entry: AuditEntry) -> LibrarianResult<AuditEvent> {
        let mut tail = self.tail.lock().await;
        self.append_at_tail(&mut tail, entry).await
    }

    async fn query(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>> {
        self.store.read_events(filter).await
    }

    async fn get(&self, event_id: &str) -> LibrarianResult<Option<AuditEvent>> {
        self.store.read_event(event_id).await
    }

    async fn verify_chain(&self, from: u64, to: u64) -> LibrarianResult<ChainReport> {
        if from >= to {
            return Ok(ChainReport {
                from,
                to,
                checked: 0,
                mismatch: None,
            });
        }

        let expected_previous = if from == 0 {
            AuditEvent::SEED_HASH.to_string()
        } else {
            match self.store.read_range(from - 1, from).await?.pop() {
                Some(prev) => prev.event_hash,
                None => {
                    return Err(LibrarianError::AuditReadFailed {
                        reason: format!("no event at sequence {} to anchor verification", from - 1),
                    })
                }
            }
        };

        let events = self.store.read_range(from, to).await?;
        let mismatch = verify_events(&events, &expected_previous, from);
        match &mismatch {
            Some(m) => error!(
                position = m.position,
                event_id = %m.event_id,
                reason = %m.reason,
                "audit chain integrity violated"
            ),
            None => debug!(from, to, checked = events.len(), "audit chain range intact"),
        }

        Ok(ChainReport {
            from,
            to,
            checked: events.len(),
            mismatch,
        })
    }

    async fn statistics(&self) -> LibrarianResult<AuditStatistics> {
        let events = self.store.read_range(0, u64::MAX).await?;

        let mut by_category = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        for event in &events {
            *by_category.entry(event.category).or_insert(0) += 1;
            if event.category == AuditCategory::Decision {
                if let Some(status) = event.payload.get("status").and_then(|s| s.as_str()) {
                    *by_status.entry(status.to_string()).or_insert(0) += 1;
                }
            }
        }

        Ok(AuditStatistics {
            total_events: events.len(),
            by_category,
            by_status,
            earliest: events.iter().map(|e| e.timestamp).min(),
            latest: events.iter().map(|e| e.timestamp).max(),
        })
    }
}
