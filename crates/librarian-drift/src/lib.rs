//! # librarian-drift
//!
//! Structural drift detection for the Librarian governance engine.
//!
//! `DriftDetector` runs a fixed battery of checks against an injected
//! `GraphStore`, concurrently and each under its own timeout:
//!
//! | Check                   | Severity                          |
//! |-------------------------|-----------------------------------|
//! | `design_ahead_of_basis` | high                              |
//! | `uncovered_requirement` | high for critical/high priority, else medium |
//! | `undocumented_artifact` | low                               |
//! | `version_mismatch`      | medium                            |
//!
//! A check that fails or times out becomes a `DriftQueryError` in the report
//! and never stops the others.

pub mod checks;
pub mod detector;

pub use detector::DriftDetector;

// ── Tests ─────────────────────────────────────────────────────────────────────
