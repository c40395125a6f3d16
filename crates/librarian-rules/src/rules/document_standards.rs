//! DOC-001: document structure and frontmatter.
//!
//! Three checks, all collected:
//!
//! 1. **Required fields**: every field the target type requires is present
//!    (high).
//! 2. **Field types**: the frontmatter is validated against a JSON Schema
//!    using the `jsonschema` crate (medium per failure).
//! 3. **Version and location**: a present version is semantic, and a known
//!    path sits under `docs/<type>/` with a `.md` extension (medium each).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use librarian_contracts::{
    context::EvaluationContext,
    error::{LibrarianError, LibrarianResult},
    request::{ChangeRequest, TargetType},
    violation::{Severity, Violation},
};
use librarian_core::traits::Rule;

use super::carries_content;

const RULE_ID: &str = "DOC-001";

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[\w.]+)?(\+[\w.]+)?$").expect("static regex")
});

static DOC_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^docs/(architecture|design|tasks|requirements)/.+\.md$").expect("static regex")
});

/// Compiled once; a schema that fails to compile fails the rule instead of
/// panicking.
static FRONTMATTER_VALIDATOR: LazyLock<Result<jsonschema::Validator, String>> = LazyLock::new(|| {
    jsonschema::validator_for(&DocumentStandardsRule::frontmatter_schema())
        .map_err(|e| format!("frontmatter schema did not compile: {e}"))
});

#[derive(Debug, Default)]
pub struct DocumentStandardsRule;

impl DocumentStandardsRule {
    pub fn new() -> Self {
        Self
    }

    /// Frontmatter fields each document type must carry.
    pub fn required_fields(target_type: TargetType) -> &'static [&'static str] {
        match target_type {
            TargetType::Architecture => &["doc", "subsystem", "id", "version", "status", "owners"],
            TargetType::Design => &["doc", "component", "id", "version", "status", "owners"],
            TargetType::Tasks => &["doc", "sprint", "status", "assignee"],
            TargetType::Requirement => &["doc", "id", "version", "status"],
            _ => &[],
        }
    }

    /// The `docs/` subdirectory a document type lives in.
    fn expected_dir(target_type: TargetType) -> Option<&'static str> {
        match target_type {
            TargetType::Architecture => Some("architecture"),
            TargetType::Design => Some("design"),
            TargetType::Tasks => Some("tasks"),
            TargetType::Requirement => Some("requirements"),
            _ => None,
        }
    }

    fn frontmatter_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "doc":        { "type": "string" },
                "id":         { "type": "string", "minLength": 1 },
                "version":    { "type": "string" },
                "status":     { "type": "string" },
                "subsystem":  { "type": "string" },
                "component":  { "type": "string" },
                "sprint":     { "type": ["string", "integer"] },
                "assignee":   { "type": "string" },
                "owners":     { "type": "array", "items": { "type": "string" } },
                "implements": { "type": "string" },
                "satisfies": {
                    "anyOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ]
                }
            }
        })
    }
}

impl Rule for DocumentStandardsRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn name(&self) -> &str {
        "Document Standards"
    }

    fn evaluate(
        &self,
        request: &ChangeRequest,
        _ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>> {
        let mut violations = Vec::new();
        if !carries_content(request) {
            return Ok(violations);
        }

        let target_type = request.target_type;
        let frontmatter = &request.payload.frontmatter;

        // ── Required fields ──────────────────────────────────────────────────
        let missing: Vec<&str> = Self::required_fields(target_type)
            .iter()
            .copied()
            .filter(|f| !frontmatter.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::High,
                    format!("Missing required frontmatter fields for {}", target_type),
                )
                .with_detail("missing_fields", missing.clone())
                .with_suggestion(format!(
                    "Add the following fields to frontmatter: {}",
                    missing.join(", ")
                )),
            );
        }

        // ── Field types ──────────────────────────────────────────────────────
        let validator = FRONTMATTER_VALIDATOR
            .as_ref()
            .map_err(|reason| LibrarianError::RuleFailed {
                rule_id: RULE_ID.to_string(),
                reason: reason.clone(),
            })?;
        let instance = Value::Object(frontmatter.clone());
        for error in validator.iter_errors(&instance) {
            debug!(rule_id = RULE_ID, path = %error.instance_path, "frontmatter type mismatch");
            violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::Medium,
                    format!("Frontmatter field {} has the wrong type", error.instance_path),
                )
                .with_detail("path", error.instance_path.to_string())
                .with_detail("error", error.to_string())
                .with_suggestion("Use the documented type for this frontmatter field"),
            );
        }

        // ── Version format ───────────────────────────────────────────────────
        if let Some(version) = request.payload.field_str("version") {
            if !version.is_empty() && !SEMVER.is_match(version) {
                violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Medium,
                        "Version must use semantic versioning (x.y.z)",
                    )
                    .with_detail("version", version)
                    .with_suggestion("Use semantic versioning format like 1.0.0"),
                );
            }
        }

        // ── Location ─────────────────────────────────────────────────────────
        if let (Some(dir), Some(path)) = (Self::expected_dir(target_type), request.payload.path.as_deref()) {
            let normalized = path.replace('\\', "/");
            let in_place = DOC_PATH
                .captures(&normalized)
                .is_some_and(|c| &c[1] == dir);
            if !path.is_empty() && !in_place {
                let expected = format!("docs/{}/*.md", dir);
                violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Medium,
                        format!("Document type '{}' should be in {}", target_type, expected),
                    )
                    .with_detail("path", path)
                    .with_detail("expected_pattern", expected.clone())
                    .with_suggestion(format!("Move document to match pattern: {}", expected)),
                );
            }
        }

        Ok(violations)
    }
}
