//! Override authority grants.
//!
//! The production answer to "may this actor override an automatic outcome?"
//! comes from an external authorization service. `AuthorityGrants` is the
//! static, in-memory form used for fixtures and single-node deployments.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The set of actors holding override authority.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorityGrants {
    actors: HashSet<String>,
}

impl AuthorityGrants {
    /// Grant override authority to `actor_id`.
    pub fn grant(&mut self, actor_id: impl Into<String>) {
        self.actors.insert(actor_id.into());
    }

    /// Return true if `actor_id` holds override authority.
    pub fn has(&self, actor_id: &str) -> bool {
        self.actors.contains(actor_id)
    }

    /// All actors holding override authority.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.actors.iter().map(String::as_str)
    }
}
