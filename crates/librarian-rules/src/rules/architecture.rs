//! ARCH-001: changes align with the approved architecture.

use librarian_contracts::{
    context::EvaluationContext,
    error::LibrarianResult,
    request::{ChangeRequest, TargetType},
    violation::{Severity, Violation},
};
use librarian_core::traits::Rule;

use super::{carries_content, declared_basis};

const RULE_ID: &str = "ARCH-001";

#[derive(Debug, Default)]
pub struct ArchitectureAlignmentRule;

impl ArchitectureAlignmentRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ArchitectureAlignmentRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn name(&self) -> &str {
        "Architecture Alignment"
    }

    fn evaluate(
        &self,
        request: &ChangeRequest,
        ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>> {
        let mut violations = Vec::new();
        if !carries_content(request) {
            return Ok(violations);
        }
        let basis = declared_basis(request);

        match (request.target_type, basis) {
            (TargetType::Design, None) => violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::Critical,
                    "Design must reference an approved architecture",
                )
                .with_suggestion("Add 'implements' field to frontmatter referencing architecture ID"),
            ),
            (TargetType::Design, Some(basis_id)) => match ctx.spec(basis_id) {
                None => violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Critical,
                        format!("Referenced architecture '{}' not found", basis_id),
                    )
                    .with_detail("implements", basis_id)
                    .with_suggestion("Ensure the architecture ID is correct and exists"),
                ),
                Some(spec) if spec.status != "approved" => violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Critical,
                        format!("Referenced architecture '{}' is not approved", basis_id),
                    )
                    .with_detail("implements", basis_id)
                    .with_detail("status", spec.status.clone())
                    .with_suggestion(
                        "Reference an approved architecture or get the current architecture approved",
                    ),
                ),
                Some(_) => {}
            },
            (TargetType::Code, None) => violations.push(
                Violation::new(RULE_ID, Severity::High, "Code must reference an approved design")
                    .with_suggestion("Add 'implements' field referencing design ID"),
            ),
            _ => {}
        }

        // ── Cycles ───────────────────────────────────────────────────────────
        //
        // Walk the basis chain to any depth; reaching the entity itself is a
        // cycle.
        let node_id = request
            .target_id
            .as_deref()
            .or_else(|| request.payload.field_str("id"));
        if let (Some(node_id), Some(basis_id)) = (node_id, basis) {
            let chain = ctx.implements_chain(basis_id);
            if chain.iter().any(|id| id == node_id) {
                violations.push(
                    Violation::new(RULE_ID, Severity::Critical, "Circular dependency detected")
                        .with_detail("id", node_id)
                        .with_detail("implements", basis_id)
                        .with_detail("chain", chain)
                        .with_suggestion("Remove circular dependency in specification hierarchy"),
                );
            }
        }

        Ok(violations)
    }
}
