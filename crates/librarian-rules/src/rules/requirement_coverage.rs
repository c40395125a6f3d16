//! REQ-001: designs and code name the requirements they satisfy.

use librarian_contracts::{
    context::EvaluationContext,
    error::LibrarianResult,
    request::{ChangeRequest, TargetType},
    violation::{Severity, Violation},
};
use librarian_core::traits::Rule;

use super::carries_content;

const RULE_ID: &str = "REQ-001";

#[derive(Debug, Default)]
pub struct RequirementCoverageRule;

impl RequirementCoverageRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for RequirementCoverageRule {
    fn id(&self) -> &str {
        RULE_ID
    }

    fn name(&self) -> &str {
        "Requirement Coverage"
    }

    fn evaluate(
        &self,
        request: &ChangeRequest,
        ctx: &EvaluationContext,
    ) -> LibrarianResult<Vec<Violation>> {
        let mut violations = Vec::new();
        if !carries_content(request)
            || !matches!(request.target_type, TargetType::Design | TargetType::Code)
        {
            return Ok(violations);
        }

        let satisfies = request.payload.field_list("satisfies");
        if satisfies.is_empty() {
            let kind = if request.target_type == TargetType::Design { "Design" } else { "Code" };
            violations.push(
                Violation::new(
                    RULE_ID,
                    Severity::Medium,
                    format!("{} should reference requirements it satisfies", kind),
                )
                .with_suggestion("Add 'satisfies' field to frontmatter with requirement IDs"),
            );
            return Ok(violations);
        }

        for req_id in &satisfies {
            match ctx.spec(req_id) {
                None => violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::High,
                        format!("Referenced requirement '{}' not found", req_id),
                    )
                    .with_detail("requirement_id", req_id.as_str())
                    .with_suggestion("Ensure requirement ID is correct"),
                ),
                Some(spec) if spec.status != "active" => violations.push(
                    Violation::new(
                        RULE_ID,
                        Severity::Medium,
                        format!("Referenced requirement '{}' is not active", req_id),
                    )
                    .with_detail("requirement_id", req_id.as_str())
                    .with_detail("status", spec.status.clone())
                    .with_suggestion("Reference only active requirements"),
                ),
                Some(_) => {}
            }
        }
        Ok(violations)
    }
}
