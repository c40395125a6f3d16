//! In-memory implementation of `EventStore`.
//!
//! `InMemoryEventStore` is the reference implementation of the `EventStore`
//! trait. It keeps all events in a `Vec` behind an `RwLock`: readers run
//! concurrently and only ever observe a consistent prefix of the chain.
//!
//! The optimistic append contract is enforced here exactly as a durable
//! store would: an event whose `previous_hash` is not the current tail is
//! refused with `LedgerAppendConflict`.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use librarian_contracts::{
    audit::{AuditEvent, AuditFilter},
    error::{LibrarianError, LibrarianResult},
};
use librarian_core::traits::EventStore;

/// An in-memory, append-only event store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub(crate) events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_lock(
        &self,
    ) -> LibrarianResult<std::sync::RwLockReadGuard<'_, Vec<AuditEvent>>> {
        self.events.read().map_err(|e| LibrarianError::AuditReadFailed {
            reason: format!("event store lock poisoned: {}", e),
        })
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append_event(&self, event: &AuditEvent) -> LibrarianResult<String> {
        let mut events = self.events.write().map_err(|e| LibrarianError::AuditWriteFailed {
            reason: format!("event store lock poisoned: {}", e),
        })?;

        let tail_hash = events
            .last()
            .map(|e| e.event_hash.as_str())
            .unwrap_or(AuditEvent::SEED_HASH);
        if event.previous_hash != tail_hash || event.sequence != events.len() as u64 {
            debug!(
                event_id = %event.id,
                sequence = event.sequence,
                stored = events.len(),
                "append refused, chain tail moved"
            );
            return Err(LibrarianError::LedgerAppendConflict { attempts: 1 });
        }

        events.push(event.clone());
        Ok(event.id.clone())
    }

    async fn read_events(&self, filter: &AuditFilter) -> LibrarianResult<Vec<AuditEvent>> {
        let events = self.read_lock()?;
        Ok(events
            .iter()
            .filter(|e| filter.matches(e))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn read_event(&self, event_id: &str) -> LibrarianResult<Option<AuditEvent>> {
        let events = self.read_lock()?;
        Ok(events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn last_event(&self) -> LibrarianResult<Option<AuditEvent>> {
        let events = self.read_lock()?;
        Ok(events.last().cloned())
    }

    async fn read_range(&self, from: u64, to: u64) -> LibrarianResult<Vec<AuditEvent>> {
        let events = self.read_lock()?;
        Ok(events
            .iter()
            .filter(|e| e.sequence >= from && e.sequence < to)
            .cloned()
            .collect())
    }
}
