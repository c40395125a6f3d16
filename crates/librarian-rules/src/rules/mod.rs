//! The concrete compliance rules.

pub mod architecture;
pub mod constitution;
pub mod document_standards;
pub mod requirement_coverage;
pub mod version_compat;

pub use architecture::ArchitectureAlignmentRule;
pub use constitution::ConstitutionComplianceRule;
pub use document_standards::DocumentStandardsRule;
pub use requirement_coverage::RequirementCoverageRule;
pub use version_compat::VersionCompatibilityRule;

use librarian_contracts::request::{ChangeAction, ChangeRequest};

/// The basis the request's payload declares, if any.
pub(crate) fn declared_basis(request: &ChangeRequest) -> Option<&str> {
    request
        .payload
        .field_str("implements")
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Deletes carry no content for the content rules to inspect.
pub(crate) fn carries_content(request: &ChangeRequest) -> bool {
    request.action != ChangeAction::Delete
}
