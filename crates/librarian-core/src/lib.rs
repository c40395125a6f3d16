//! # librarian-core
//!
//! The evaluation runtime for the Librarian governance engine.
//!
//! This crate provides:
//! - The seams (`Rule`, `DecisionPolicy`, `EscalationAdvisor`, `AuditLedger`,
//!   `EventStore`, `GraphStore`, `OverrideAuthority`, `DriftScanner`)
//! - The `RuleRunner` that executes rules concurrently with failure isolation
//! - The `Orchestrator` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use librarian_core::{Orchestrator, traits::{Rule, DecisionPolicy, AuditLedger}};
//! ```

pub mod orchestrator;
pub mod runner;
pub mod traits;

pub use orchestrator::Orchestrator;
pub use runner::{RuleRunner, RunOutcome};
