//! The fixed battery of structural drift checks.
//!
//! Each check is a graph pattern plus a predicate over the rows it returns.
//! The patterns only select candidates and name their columns; whether a row
//! is drift is decided here, so every graph store gets the same semantics.

use chrono::{DateTime, Utc};
use serde_json::Value;

use librarian_contracts::{
    drift::{DriftFinding, DriftKind},
    violation::Severity,
};
use librarian_core::traits::Record;

const OUT_OF_RANGE_WINDOW: &str = "undocumented window is out of range for the current time";

/// What a check needs besides its rows.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext {
    pub now: DateTime<Utc>,
    /// Start of the recent-creation window. `None` when the configured
    /// window does not fit before `now`.
    pub undocumented_since: Option<DateTime<Utc>>,
}

/// The graph pattern for `kind`. Column aliases are part of the contract
/// with the graph store.
pub fn pattern(kind: DriftKind) -> &'static str {
    match kind {
        DriftKind::DesignAheadOfBasis => {
            "MATCH (d)-[:IMPLEMENTS]->(b) \
             OPTIONAL MATCH (dec:Decision {status: 'approved'})-[:APPROVES]->(:ChangeRequest)-[:TARGETS]->(d) \
             RETURN d.id AS dependent_id, b.id AS basis_id, \
                    d.modified_at AS dependent_modified, b.modified_at AS basis_modified, \
                    max(dec.timestamp) AS last_approval"
        }
        DriftKind::UncoveredRequirement => {
            "MATCH (req:Requirement) \
             OPTIONAL MATCH (req)<-[s:SATISFIES]-(:Design|Code) \
             OPTIONAL MATCH (a:Architecture)-[:DEFINES]->(req) \
             RETURN req.id AS requirement_id, req.status AS status, req.priority AS priority, \
                    a.id AS source_id, count(s) AS satisfied_by"
        }
        DriftKind::UndocumentedArtifact => {
            "MATCH (c:Code) \
             OPTIONAL MATCH (c)-[i:IMPLEMENTS]->(:Design|Requirement) \
             RETURN c.id AS artifact_id, c.created_at AS created_at, count(i) AS implements_links"
        }
        DriftKind::VersionMismatch => {
            "MATCH (d)-[r:IMPLEMENTS]->(b) \
             RETURN d.id AS dependent_id, b.id AS basis_id, \
                    r.basis_version AS declared_version, b.version AS current_version, \
                    r.pinned AS pinned"
        }
    }
}

/// Apply `kind`'s predicate to every row.
///
/// An `Err` means the rows could not be interpreted; the whole check is then
/// reported as failed rather than partially passed.
pub fn evaluate(
    kind: DriftKind,
    records: &[Record],
    ctx: &CheckContext,
) -> Result<Vec<DriftFinding>, String> {
    if kind == DriftKind::UndocumentedArtifact && ctx.undocumented_since.is_none() {
        return Err(OUT_OF_RANGE_WINDOW.to_string());
    }
    let mut findings = Vec::new();
    for record in records {
        let finding = match kind {
            DriftKind::DesignAheadOfBasis => design_ahead_of_basis(record, ctx)?,
            DriftKind::UncoveredRequirement => uncovered_requirement(record, ctx)?,
            DriftKind::UndocumentedArtifact => undocumented_artifact(record, ctx)?,
            DriftKind::VersionMismatch => version_mismatch(record, ctx)?,
        };
        findings.extend(finding);
    }
    Ok(findings)
}

// ── Checks ────────────────────────────────────────────────────────────────────

/// Dependent modified after its basis, with no approval since the basis
/// changed.
fn design_ahead_of_basis(
    record: &Record,
    ctx: &CheckContext,
) -> Result<Option<DriftFinding>, String> {
    let dependent = required_str(record, "dependent_id")?;
    let basis = required_str(record, "basis_id")?;
    let (Some(dependent_modified), Some(basis_modified)) = (
        time_field(record, "dependent_modified")?,
        time_field(record, "basis_modified")?,
    ) else {
        return Ok(None);
    };

    if dependent_modified <= basis_modified {
        return Ok(None);
    }
    if let Some(approved) = time_field(record, "last_approval")? {
        if approved >= basis_modified {
            return Ok(None);
        }
    }

    Ok(Some(DriftFinding {
        kind: DriftKind::DesignAheadOfBasis,
        severity: Severity::High,
        subject_id: dependent.to_string(),
        related_id: Some(basis.to_string()),
        description: format!(
            "'{}' was modified at {} after its basis '{}' changed at {}, with no approval since",
            dependent,
            dependent_modified.to_rfc3339(),
            basis,
            basis_modified.to_rfc3339()
        ),
        detected_at: ctx.now,
    }))
}

/// Active requirement that nothing satisfies.
fn uncovered_requirement(
    record: &Record,
    ctx: &CheckContext,
) -> Result<Option<DriftFinding>, String> {
    let requirement = required_str(record, "requirement_id")?;
    if optional_str(record, "status") != Some("active") || count_field(record, "satisfied_by")? > 0 {
        return Ok(None);
    }

    let priority = optional_str(record, "priority").unwrap_or("medium");
    let severity = match priority.to_ascii_lowercase().as_str() {
        "critical" | "high" => Severity::High,
        _ => Severity::Medium,
    };

    Ok(Some(DriftFinding {
        kind: DriftKind::UncoveredRequirement,
        severity,
        subject_id: requirement.to_string(),
        related_id: optional_str(record, "source_id").map(str::to_string),
        description: format!(
            "Active {}-priority requirement '{}' is not satisfied by any design or code",
            priority, requirement
        ),
        detected_at: ctx.now,
    }))
}

/// Recently created code that implements nothing.
fn undocumented_artifact(
    record: &Record,
    ctx: &CheckContext,
) -> Result<Option<DriftFinding>, String> {
    let artifact = required_str(record, "artifact_id")?;
    if count_field(record, "implements_links")? > 0 {
        return Ok(None);
    }
    let Some(created_at) = time_field(record, "created_at")? else {
        return Ok(None);
    };
    let since = ctx
        .undocumented_since
        .ok_or_else(|| OUT_OF_RANGE_WINDOW.to_string())?;
    if created_at < since {
        return Ok(None);
    }

    Ok(Some(DriftFinding {
        kind: DriftKind::UndocumentedArtifact,
        severity: Severity::Low,
        subject_id: artifact.to_string(),
        related_id: None,
        description: format!(
            "Code artifact '{}' created at {} implements no design or requirement",
            artifact,
            created_at.to_rfc3339()
        ),
        detected_at: ctx.now,
    }))
}

/// Declared basis version differs from the basis's current version.
fn version_mismatch(record: &Record, ctx: &CheckContext) -> Result<Option<DriftFinding>, String> {
    let dependent = required_str(record, "dependent_id")?;
    let basis = required_str(record, "basis_id")?;
    let (Some(declared), Some(current)) = (
        optional_str(record, "declared_version"),
        optional_str(record, "current_version"),
    ) else {
        return Ok(None);
    };

    let pinned = record.get("pinned").and_then(Value::as_bool).unwrap_or(false);
    if declared == current || pinned || is_version_range(declared) {
        return Ok(None);
    }

    Ok(Some(DriftFinding {
        kind: DriftKind::VersionMismatch,
        severity: Severity::Medium,
        subject_id: dependent.to_string(),
        related_id: Some(basis.to_string()),
        description: format!(
            "'{}' declares basis '{}' at version {}, but it is now {}",
            dependent, basis, declared, current
        ),
        detected_at: ctx.now,
    }))
}

/// Range expressions (`^1.2`, `~1.2.0`, `>=1.0`, `1.x`, `*`) are explicit
/// and never drift.
pub fn is_version_range(declared: &str) -> bool {
    let declared = declared.trim();
    declared.starts_with(['^', '~', '>', '<', '='])
        || declared == "*"
        || declared
            .split('.')
            .any(|part| part.eq_ignore_ascii_case("x") || part == "*")
}

// ── Field access ──────────────────────────────────────────────────────────────

fn required_str<'a>(record: &'a Record, key: &str) -> Result<&'a str, String> {
    optional_str(record, key).ok_or_else(|| format!("row is missing string column '{}'", key))
}

fn optional_str<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn count_field(record: &Record, key: &str) -> Result<u64, String> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| format!("column '{}' is not a non-negative count: {}", key, v)),
    }
}

fn time_field(record: &Record, key: &str) -> Result<Option<DateTime<Utc>>, String> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| format!("column '{}' is not an RFC 3339 timestamp: {}", key, e)),
        Some(v) => Err(format!("column '{}' is not a timestamp: {}", key, v)),
    }
}
