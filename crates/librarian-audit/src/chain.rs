//! Hash-chain primitives: canonical encoding, hashing, and verification.
//!
//! Hash input layout (bytes, in order):
//!   1. previous_hash as UTF-8 bytes (64 ASCII hex chars)
//!   2. canonical JSON of payload (object keys sorted recursively, no
//!      whitespace)
//!   3. timestamp as RFC 3339 with nanoseconds, UTC (`Z` suffix)
//!   4. actor_id as UTF-8 bytes

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use librarian_contracts::{
    audit::{AuditEvent, ChainMismatch},
    error::LibrarianResult,
};

/// Serialize `value` with object keys sorted at every depth and no
/// whitespace.
///
/// The same logical payload always produces the same bytes, whatever order
/// its keys were inserted in.
pub fn canonical_json(value: &Value) -> LibrarianResult<String> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> LibrarianResult<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// The timestamp encoding that goes into the hash.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Compute `H(previous_hash ‖ canonical(payload) ‖ timestamp ‖ actor_id)`.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_event(
    previous_hash: &str,
    payload: &Value,
    timestamp: &DateTime<Utc>,
    actor_id: &str,
) -> LibrarianResult<String> {
    let payload_json = canonical_json(payload)?;

    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(payload_json.as_bytes());
    hasher.update(canonical_timestamp(timestamp).as_bytes());
    hasher.update(actor_id.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Recompute `event`'s hash from its own fields.
pub fn recompute(event: &AuditEvent) -> LibrarianResult<String> {
    hash_event(
        &event.previous_hash,
        &event.payload,
        &event.timestamp,
        &event.actor_id,
    )
}

/// Verify a contiguous run of events and return the first mismatch.
///
/// `events` must start at sequence `first_sequence`, and `expected_previous`
/// is the `event_hash` of the event before it (or the seed). Three things
/// are checked for each event, in order:
///
/// 1. **Position**: sequences are contiguous.
/// 2. **Linkage**: `previous_hash` equals the preceding `event_hash`.
/// 3. **Hash**: `event_hash` matches the recomputed value.
///
/// `None` means the run is intact. An empty run is intact.
pub fn verify_events(
    events: &[AuditEvent],
    expected_previous: &str,
    first_sequence: u64,
) -> Option<ChainMismatch> {
    let mut expected_previous = expected_previous.to_string();

    for (offset, event) in events.iter().enumerate() {
        let position = first_sequence + offset as u64;
        let mismatch = |reason: String| ChainMismatch {
            position,
            event_id: event.id.clone(),
            reason,
        };

        if event.sequence != position {
            return Some(mismatch(format!(
                "expected sequence {}, found {}",
                position, event.sequence
            )));
        }
        if event.previous_hash != expected_previous {
            return Some(mismatch(
                "previous_hash does not match the preceding event_hash".to_string(),
            ));
        }
        match recompute(event) {
            Ok(hash) if hash == event.event_hash => {}
            Ok(_) => {
                return Some(mismatch(
                    "event_hash does not match the recomputed hash".to_string(),
                ))
            }
            Err(e) => return Some(mismatch(format!("payload could not be hashed: {}", e))),
        }

        expected_previous = event.event_hash.clone();
    }

    None
}
