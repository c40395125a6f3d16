//! VER-001: version presence, format, and compatibility with the basis.

use std::sync::LazyLock;

use regex::Regex;

use librarian_contracts::{
    context::EvaluationContext,
    error::LibrarianResult,
    request::{ChangeRequest, TargetType},
    violation::{Severity, Violation},
};
use librarian_core::traits::Rule;

use super::{carries_content, declared_basis};

const RULE_ID: &str = "VER-001";

static STRICT_SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("static regex"));

#[derive(Debug, Default)]
pub struct VersionCompatibilityRule;

impl VersionCompatibilityRule {
    pub fn new() -> Self {
        Self
    }

    /// Specifications are versioned; code and task lists are not.
    fn is_versioned(target_type: TargetType) -> bool {
        matches!(
            target_type,
            TargetType::Architecture | TargetType::Design | TargetType::Requirement
        )
    }

    /// Same major, and the child's minor is at least the basis's minor.
    ///
    /// Anything that does not parse as `x.y.z` is incompatible.
    pub fn compatible(child: &str, basis: &str) -> bool {
        match (parse(child), parse(basis)) {
            (Some((c_major, c_minor, _)), Some((b_major, b_minor, _))) => {
                c_major == b_major && c_minor >= b_minor
            }
            _ => false,
        }
    }
}

fn parse(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

impl Rule for VersionCompatibilityRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn name(&self) -> &str {
        "Version Compatibility"
    }

    fn evaluate(
        &self,
        request: &ChangeRequest,
        ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>> {
        if !carries_content(request) || !Self::is_versioned(request.target_type) {
            return Ok(Vec::new());
        }

        let version = match request.payload.field_str("version").filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                return Ok(vec![Violation::new(
                    RULE_ID,
                    Severity::High,
                    "Version is required for all specifications",
                )
                .with_suggestion("Add a 'version' field to frontmatter")]);
            }
        };

        if !STRICT_SEMVER.is_match(version) {
            return Ok(vec![Violation::new(
                RULE_ID,
                Severity::Critical,
                "Invalid semantic version format",
            )
            .with_detail("version", version)
            .with_suggestion("Use semantic versioning format: major.minor.patch")]);
        }

        let mut violations = Vec::new();
        if let Some(basis_id) = declared_basis(request) {
            let basis_version = ctx.spec(basis_id).and_then(|s| s.version.as_deref());
            if let Some(basis_version) = basis_version {
                if !Self::compatible(version, basis_version) {
                    violations.push(
                        Violation::new(
                            RULE_ID,
                            Severity::High,
                            "Version incompatible with parent specification",
                        )
                        .with_detail("version", version)
                        .with_detail("parent_version", basis_version)
                        .with_detail("implements", basis_id)
                        .with_suggestion(format!(
                            "Use a {}.x version at or above {}",
                            basis_version.split('.').next().unwrap_or(basis_version),
                            basis_version
                        )),
                    );
                }
            }
        }
        Ok(violations)
    }
}
