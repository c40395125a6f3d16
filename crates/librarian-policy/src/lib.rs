//! # librarian-policy
//!
//! The deterministic decision policy and escalation advisor for the Librarian
//! governance engine.
//!
//! ## Overview
//!
//! This crate provides [`ThresholdPolicy`], which implements the
//! [`DecisionPolicy`](librarian_core::traits::DecisionPolicy) trait, and
//! [`ConfiguredEscalationAdvisor`], which implements
//! [`EscalationAdvisor`](librarian_core::traits::EscalationAdvisor). Both read
//! their thresholds from the `[policy]` section of the engine TOML.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use librarian_policy::{config, ThresholdPolicy, ConfiguredEscalationAdvisor};
//!
//! let engine_config = config::from_file(Path::new("librarian.toml"))?;
//! let policy = ThresholdPolicy::new(engine_config.policy.clone());
//! let advisor = ConfiguredEscalationAdvisor::new(engine_config.policy.clone());
//! ```

pub mod config;
pub mod engine;
pub mod escalation;

pub use engine::ThresholdPolicy;
pub use escalation::ConfiguredEscalationAdvisor;

// ── Tests ─────────────────────────────────────────────────────────────────────
