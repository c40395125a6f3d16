//! The read-only knowledge snapshot rules evaluate against.
//!
//! Any store access happens while the caller assembles an `EvaluationContext`.
//! Rules only ever see this in-memory snapshot, so the parallel rule phase
//! performs no I/O.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::TargetType;

/// What the engine knows about one existing specification or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecRecord {
    pub id: String,
    #[serde(default)]
    pub doc_type: Option<TargetType>,
    /// Lifecycle status, e.g. "draft", "approved", "published", "active".
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    /// The basis entity this one is defined against.
    #[serde(default)]
    pub implements: Option<String>,
    /// Remaining stored properties (`created_at`, `creator`, ...).
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl SpecRecord {
    pub fn new(id: impl Into<String>, doc_type: TargetType, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doc_type: Some(doc_type),
            status: status.into(),
            version: None,
            implements: None,
            properties: Map::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn implementing(mut self, basis_id: impl Into<String>) -> Self {
        self.implements = Some(basis_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a stored property, treating the typed fields as properties too.
    pub fn property(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "status" => Some(Value::String(self.status.clone())),
            "version" => self.version.clone().map(Value::String),
            "implements" => self.implements.clone().map(Value::String),
            _ => self.properties.get(key).cloned(),
        }
    }
}

/// Snapshot of external knowledge for one evaluation. Never mutated by the
/// engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationContext {
    specs: BTreeMap<String, SpecRecord>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a known spec. Used while assembling the snapshot.
    pub fn with_spec(mut self, spec: SpecRecord) -> Self {
        self.specs.insert(spec.id.clone(), spec);
        self
    }

    pub fn spec(&self, id: &str) -> Option<&SpecRecord> {
        self.specs.get(id)
    }

    pub fn specs(&self) -> impl Iterator<Item = &SpecRecord> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// IDs of the specs that declare `basis_id` as their basis, sorted.
    pub fn children_of(&self, basis_id: &str) -> Vec<&str> {
        self.specs
            .values()
            .filter(|s| s.implements.as_deref() == Some(basis_id))
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Follow the `implements` chain upward, starting at (and including)
    /// `from`.
    ///
    /// Stops at an ID not present in the snapshot, at the top of the
    /// hierarchy, or before an ID would repeat.
    pub fn implements_chain(&self, from: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut chain = Vec::new();
        let mut current = Some(from.to_string());

        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                break;
            }
            current = self.spec(&id).and_then(|s| s.implements.clone());
            chain.push(id);
        }
        chain
    }
}
