//! # librarian-rules
//!
//! The compliance rules run by the Librarian governance engine.
//!
//! | ID          | Checks                                                      |
//! |-------------|-------------------------------------------------------------|
//! | `DOC-001`   | required frontmatter, field types, version format, location |
//! | `VER-001`   | version presence, strict format, compatibility with basis   |
//! | `ARCH-001`  | designs implement approved architectures; no cycles         |
//! | `REQ-001`   | designs and code satisfy known, active requirements         |
//! | `CONST-001` | audit immutability, immutable properties, hierarchy primacy |
//!
//! Every rule is a pure function over the request and an in-memory
//! `EvaluationContext`. The set is fixed at startup through [`RuleSet`].

pub mod rules;

use std::sync::Arc;

use tracing::warn;

use librarian_core::traits::Rule;

pub use rules::{
    ArchitectureAlignmentRule, ConstitutionComplianceRule, DocumentStandardsRule,
    RequirementCoverageRule, VersionCompatibilityRule,
};

/// An ordered, duplicate-free set of rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rule`. A rule whose ID is already registered is ignored.
    pub fn with(mut self, rule: Arc<dyn Rule>) -> Self {
        if self.rules.iter().any(|r| r.id() == rule.id()) {
            warn!(rule_id = %rule.id(), "rule already registered, ignoring duplicate");
            return self;
        }
        self.rules.push(rule);
        self
    }

    /// Drop the rules whose IDs are listed.
    pub fn without(mut self, ids: &[&str]) -> Self {
        self.rules.retain(|r| !ids.contains(&r.id()));
        self
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn into_rules(self) -> Vec<Arc<dyn Rule>> {
        self.rules
    }
}

/// The standard rule set, in ID order.
pub fn default_rules() -> RuleSet {
    RuleSet::new()
        .with(Arc::new(ArchitectureAlignmentRule::new()))
        .with(Arc::new(ConstitutionComplianceRule::new()))
        .with(Arc::new(DocumentStandardsRule::new()))
        .with(Arc::new(RequirementCoverageRule::new()))
        .with(Arc::new(VersionCompatibilityRule::new()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
