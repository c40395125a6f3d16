//! Simulated specification catalog and graph store for the reference
//! scenarios.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. The catalog stands in for the context snapshot an API layer
//! would assemble, and `StaticGraphStore` for a real graph database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use librarian_contracts::{
    authority::AuthorityGrants,
    config::EngineConfig,
    context::{EvaluationContext, SpecRecord},
    drift::DriftKind,
    error::LibrarianResult,
    request::TargetType,
};
use librarian_core::traits::{GraphStore, Record};
use librarian_drift::checks;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Embedded reference configuration.
pub const ENGINE_TOML: &str = include_str!("../config/librarian.toml");

/// Parse and validate the embedded configuration.
pub fn engine_config() -> LibrarianResult<EngineConfig> {
    librarian_policy::config::from_toml_str(ENGINE_TOML)
}

// ── Specification catalog (mock) ──────────────────────────────────────────────

/// The catalog every scenario evaluates against.
///
/// | ID             | Type         | Status   | Version | Implements   |
/// |----------------|--------------|----------|---------|--------------|
/// | ARCH-PLATFORM  | architecture | approved | 2.1.0   |              |
/// | ARCH-LEGACY    | architecture | draft    | 0.4.0   |              |
/// | REQ-CHECKOUT   | requirement  | active   | 1.0.0   |              |
/// | REQ-REFUNDS    | requirement  | active   | 1.1.0   |              |
/// | REQ-FAX        | requirement  | retired  | 1.0.0   |              |
/// | DES-CHECKOUT   | design       | approved | 2.1.0   | ARCH-PLATFORM |
/// | CODE-CHECKOUT  | code         | draft    |         | DES-CHECKOUT |
pub fn spec_catalog() -> EvaluationContext {
    EvaluationContext::new()
        .with_spec(
            SpecRecord::new("ARCH-PLATFORM", TargetType::Architecture, "approved")
                .with_version("2.1.0")
                .with_property("creator", "dana")
                .with_property("created_at", "2026-01-05T09:00:00Z"),
        )
        .with_spec(
            SpecRecord::new("ARCH-LEGACY", TargetType::Architecture, "draft").with_version("0.4.0"),
        )
        .with_spec(
            SpecRecord::new("REQ-CHECKOUT", TargetType::Requirement, "active").with_version("1.0.0"),
        )
        .with_spec(
            SpecRecord::new("REQ-REFUNDS", TargetType::Requirement, "active").with_version("1.1.0"),
        )
        .with_spec(SpecRecord::new("REQ-FAX", TargetType::Requirement, "retired").with_version("1.0.0"))
        .with_spec(
            SpecRecord::new("DES-CHECKOUT", TargetType::Design, "approved")
                .with_version("2.1.0")
                .implementing("ARCH-PLATFORM"),
        )
        .with_spec(
            SpecRecord::new("CODE-CHECKOUT", TargetType::Code, "draft").implementing("DES-CHECKOUT"),
        )
}

/// Actors allowed to request an override.
pub fn override_grants() -> AuthorityGrants {
    let mut grants = AuthorityGrants::default();
    grants.grant("lead-architect");
    grants
}

// ── Graph store (mock) ────────────────────────────────────────────────────────

/// A graph store that answers each pattern with canned rows.
///
/// Patterns it has no rows for return an empty result.
#[derive(Debug, Clone, Default)]
pub struct StaticGraphStore {
    rows: HashMap<String, Vec<Record>>,
}

impl StaticGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `kind`'s pattern with `rows`.
    pub fn with_rows(mut self, kind: DriftKind, rows: Vec<Value>) -> Self {
        let records = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.rows.insert(checks::pattern(kind).to_string(), records);
        self
    }
}

#[async_trait]
impl GraphStore for StaticGraphStore {
    async fn query(&self, pattern: &str) -> LibrarianResult<Vec<Record>> {
        Ok(self.rows.get(pattern).cloned().unwrap_or_default())
    }
}

/// The graph behind the drift scenario: DES-CHECKOUT was edited at
/// `dependent_modified`, after ARCH-PLATFORM changed at `basis_modified`,
/// and nobody approved anything since.
pub fn drifted_graph(
    basis_modified: DateTime<Utc>,
    dependent_modified: DateTime<Utc>,
) -> StaticGraphStore {
    StaticGraphStore::new()
        .with_rows(
            DriftKind::DesignAheadOfBasis,
            vec![json!({
                "dependent_id": "DES-CHECKOUT",
                "basis_id": "ARCH-PLATFORM",
                "dependent_modified": dependent_modified.to_rfc3339(),
                "basis_modified": basis_modified.to_rfc3339(),
                "last_approval": null
            })],
        )
        .with_rows(
            DriftKind::UncoveredRequirement,
            vec![
                json!({ "requirement_id": "REQ-CHECKOUT", "status": "active", "priority": "high", "satisfied_by": 2 }),
                json!({ "requirement_id": "REQ-FAX", "status": "retired", "priority": "low", "satisfied_by": 0 }),
            ],
        )
        .with_rows(
            DriftKind::VersionMismatch,
            vec![json!({
                "dependent_id": "DES-CHECKOUT",
                "basis_id": "ARCH-PLATFORM",
                "declared_version": "^2.0",
                "current_version": "2.1.0"
            })],
        )
}
