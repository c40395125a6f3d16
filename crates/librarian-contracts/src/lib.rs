//! # librarian-contracts
//!
//! Shared types, schemas, and contracts for the Librarian governance engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, configuration and error types.

pub mod audit;
pub mod authority;
pub mod config;
pub mod context;
pub mod decision;
pub mod drift;
pub mod error;
pub mod request;
pub mod violation;
