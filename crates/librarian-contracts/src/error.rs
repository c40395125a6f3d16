//! Error types for the Librarian governance engine.
//!
//! Every fallible operation returns `LibrarianResult<T>`. Per-rule and
//! per-drift-check failures are NOT errors at this level: the runner and the
//! drift detector recover them into `RuleError` / `DriftQueryError` metadata.
//! What remains here is what must reach the caller.

use thiserror::Error;

/// The unified error type for the Librarian engine.
#[derive(Debug, Error)]
pub enum LibrarianError {
    /// The change request is malformed (empty rationale, missing target, ...).
    #[error("invalid change request: {reason}")]
    InvalidRequest { reason: String },

    /// A rule could not complete its evaluation.
    ///
    /// Rules return this; the runner converts it into a `RuleError` and never
    /// lets it abort an evaluation.
    #[error("rule '{rule_id}' failed: {reason}")]
    RuleFailed { rule_id: String, reason: String },

    /// The graph store rejected or failed a structural query.
    #[error("graph query failed: {reason}")]
    GraphQueryFailed { reason: String },

    /// The event store detected a concurrent append against the same chain tail
    /// and the ledger exhausted its retries.
    #[error("audit ledger append conflict after {attempts} attempt(s)")]
    LedgerAppendConflict { attempts: u32 },

    /// Chain verification found a record whose hash or linkage is wrong.
    ///
    /// Fatal. Requires operator intervention; the ledger never repairs itself.
    #[error("audit chain integrity violated at position {position} (event {event_id}): {reason}")]
    ChainIntegrity {
        position: u64,
        event_id: String,
        reason: String,
    },

    /// The audit ledger could not persist an event.
    ///
    /// An evaluation that cannot be recorded fails as a whole.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// The audit ledger could not be read.
    #[error("audit read failed: {reason}")]
    AuditReadFailed { reason: String },

    /// The authorization collaborator could not answer.
    #[error("authorization service unavailable: {reason}")]
    AuthorityUnavailable { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A payload could not be serialized for hashing or storage.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl From<serde_json::Error> for LibrarianError {
    fn from(e: serde_json::Error) -> Self {
        LibrarianError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the Librarian crates.
pub type LibrarianResult<T> = Result<T, LibrarianError>;
