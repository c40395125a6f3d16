//! CONST-001: the project constitution.
//!
//! The audit trail is immutable, certain properties never change after
//! creation, approved and published specifications are superseded rather
//! than edited, and the hierarchy runs architecture → design → code.
//!
//! Every violation here is critical, and the category is inviolable by
//! default, so any finding escalates.

use librarian_contracts::{
    context::EvaluationContext,
    error::LibrarianResult,
    request::{ChangeAction, ChangeRequest, TargetType},
    violation::{Severity, Violation},
};
use librarian_core::traits::Rule;

use super::declared_basis;

const RULE_ID: &str = "CONST-001";

const IMMUTABLE_PROPERTIES: [&str; 3] = ["id", "created_at", "creator"];
const PROTECTED_STATUSES: [&str; 2] = ["approved", "published"];

#[derive(Debug, Default)]
pub struct ConstitutionComplianceRule;

impl ConstitutionComplianceRule {
    pub fn new() -> Self {
        Self
    }

    fn check_delete(request: &ChangeRequest, violations: &mut Vec<Violation>) {
        if request.target_type.is_governance_record() {
            violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::Critical,
                    format!("Cannot delete {} - audit trail is immutable", request.target_type),
                )
                .with_suggestion("Audit records cannot be deleted, only superseded"),
            );
        }
    }

    fn check_modify(
        request: &ChangeRequest,
        ctx: &EvaluationContext,
        violations: &mut Vec<Violation>,
    ) {
        let Some(existing) = request.target_id.as_deref().and_then(|id| ctx.spec(id)) else {
            return;
        };

        for prop in IMMUTABLE_PROPERTIES {
            let (Some(proposed), Some(stored)) =
                (request.payload.frontmatter.get(prop), existing.property(prop))
            else {
                continue;
            };
            if *proposed != stored {
                violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Critical,
                        format!("Cannot modify immutable property '{}'", prop),
                    )
                    .with_detail("property", prop)
                    .with_suggestion("Immutable properties cannot be changed after creation"),
                );
            }
        }

        if PROTECTED_STATUSES.contains(&existing.status.as_str()) {
            violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::Critical,
                    format!("Cannot modify {} specification", existing.status),
                )
                .with_detail("status", existing.status.clone())
                .with_suggestion("Create a new version that supersedes this one instead"),
            );
        }
    }

    fn check_hierarchy(
        request: &ChangeRequest,
        ctx: &EvaluationContext,
        violations: &mut Vec<Violation>,
    ) {
        let Some(basis_id) = declared_basis(request) else {
            return;
        };
        let Some(basis_type) = ctx.spec(basis_id).and_then(|s| s.doc_type) else {
            return;
        };

        let message = match (request.target_type, basis_type) {
            (TargetType::Architecture, TargetType::Design | TargetType::Code) => {
                "Architecture cannot implement lower-level specifications"
            }
            (TargetType::Design, TargetType::Code) => "Design cannot implement code",
            _ => return,
        };
        violations.push(
            Violation::new(RULE_ID, Severity::Critical, message)
                .with_detail("implements", basis_id)
                .with_detail("parent_type", basis_type.as_str())
                .with_suggestion("Implement a higher-level specification: architecture → design → code"),
        );
    }
}

impl Rule for ConstitutionComplianceRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn name(&self) -> &str {
        "Constitution Compliance"
    }

    fn evaluate(
        &self,
        request: &ChangeRequest,
        ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>> {
        let mut violations = Vec::new();
        match request.action {
            ChangeAction::Delete => Self::check_delete(request, &mut violations),
            ChangeAction::Modify => {
                Self::check_modify(request, ctx, &mut violations);
                Self::check_hierarchy(request, ctx, &mut violations);
            }
            ChangeAction::Create => Self::check_hierarchy(request, ctx, &mut violations),
        }
        Ok(violations)
    }
}
