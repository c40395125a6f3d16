//! Audit ledger record, filter, and verification types.
//!
//! An `AuditEvent` is created exactly once, by the ledger, at append time. It
//! is never updated or deleted. Correcting a past decision means appending a
//! new event whose `supersedes_event_id` points at the old one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which part of the engine produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Request,
    Decision,
    Drift,
    System,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditCategory::Request => "request",
            AuditCategory::Decision => "decision",
            AuditCategory::Drift => "drift",
            AuditCategory::System => "system",
        };
        f.write_str(s)
    }
}

/// What a caller hands to `AuditLedger::append`.
///
/// The ledger assigns id, sequence, timestamp and both hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub category: AuditCategory,
    pub actor_id: String,
    pub target_id: Option<String>,
    /// Serialized `Decision`, `DriftFinding`, or system note.
    pub payload: Value,
    pub supersedes_event_id: Option<String>,
}

impl AuditEntry {
    pub fn new(category: AuditCategory, actor_id: impl Into<String>, payload: Value) -> Self {
        Self {
            category,
            actor_id: actor_id.into(),
            target_id: None,
            payload,
            supersedes_event_id: None,
        }
    }

    pub fn with_target(mut self, target_id: Option<String>) -> Self {
        self.target_id = target_id;
        self
    }

    pub fn superseding(mut self, event_id: impl Into<String>) -> Self {
        self.supersedes_event_id = Some(event_id.into());
        self
    }
}

/// A single entry in the hash chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    /// 0-based position in the chain.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    pub actor_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    pub payload: Value,
    #[serde(default)]
    pub supersedes_event_id: Option<String>,
    /// `event_hash` of the previous event, or `SEED_HASH` for the first one.
    pub previous_hash: String,
    /// SHA-256 (hex) over previous_hash, canonical payload, timestamp, actor.
    pub event_hash: String,
}

impl AuditEvent {
    /// The `previous_hash` of the first event in every chain.
    ///
    /// 64 hex zeros, which is never the SHA-256 of real data.
    pub const SEED_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Read-side filter. Every set field must match; results come back in chain
/// order and are paginated by `offset` / `limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub category: Option<AuditCategory>,
    /// Events that supersede this event ID.
    #[serde(default)]
    pub supersedes_event_id: Option<String>,
    /// Inclusive lower bound.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "AuditFilter::default_limit")]
    pub limit: usize,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            target_id: None,
            actor_id: None,
            category: None,
            supersedes_event_id: None,
            from: None,
            to: None,
            offset: 0,
            limit: Self::default_limit(),
        }
    }
}

impl AuditFilter {
    fn default_limit() -> usize {
        100
    }

    pub fn for_target(target_id: impl Into<String>) -> Self {
        Self {
            target_id: Some(target_id.into()),
            ..Self::default()
        }
    }

    pub fn for_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Self::default()
        }
    }

    pub fn for_category(category: AuditCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn superseding(event_id: impl Into<String>) -> Self {
        Self {
            supersedes_event_id: Some(event_id.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// True if `event` satisfies every predicate (pagination aside).
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(target) = &self.target_id {
            if event.target_id.as_ref() != Some(target) {
                return false;
            }
        }
        if let Some(actor) = &self.actor_id {
            if &event.actor_id != actor {
                return false;
            }
        }
        if let Some(category) = self.category {
            if event.category != category {
                return false;
            }
        }
        if let Some(superseded) = &self.supersedes_event_id {
            if event.supersedes_event_id.as_ref() != Some(superseded) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// The first place a chain verification went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMismatch {
    pub position: u64,
    pub event_id: String,
    pub reason: String,
}

/// Result of `VerifyChain(from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub from: u64,
    pub to: u64,
    pub checked: usize,
    /// `None` means the range is intact.
    pub mismatch: Option<ChainMismatch>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.mismatch.is_none()
    }
}

/// Aggregate counts over the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_events: usize,
    pub by_category: BTreeMap<AuditCategory, usize>,
    /// Keyed by the `status` field of decision payloads.
    pub by_status: BTreeMap<String, usize>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}
