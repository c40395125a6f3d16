//! Change request types.
//!
//! A `ChangeRequest` is a proposed create/modify/delete against a managed
//! specification or artifact. It is immutable once built and is handed to the
//! orchestrator by value.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LibrarianError, LibrarianResult};

/// What the request wants to do to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Modify,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeAction::Create => "create",
            ChangeAction::Modify => "modify",
            ChangeAction::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// The kind of entity a request targets.
///
/// The last three variants are governance records themselves; the
/// constitution rule forbids deleting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Architecture,
    Design,
    Requirement,
    Code,
    Tasks,
    Decision,
    AuditEvent,
    ChangeRequest,
}

impl TargetType {
    /// Lowercase name, as used in frontmatter and document paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Architecture => "architecture",
            TargetType::Design => "design",
            TargetType::Requirement => "requirement",
            TargetType::Code => "code",
            TargetType::Tasks => "tasks",
            TargetType::Decision => "decision",
            TargetType::AuditEvent => "audit_event",
            TargetType::ChangeRequest => "change_request",
        }
    }

    /// True for the record types that make up the audit trail.
    pub fn is_governance_record(&self) -> bool {
        matches!(
            self,
            TargetType::Decision | TargetType::AuditEvent | TargetType::ChangeRequest
        )
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The proposed content: frontmatter key/value pairs plus the raw body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload {
    /// Frontmatter-like metadata (`id`, `version`, `implements`, ...).
    #[serde(default)]
    pub frontmatter: Map<String, Value>,
    /// Raw document text.
    #[serde(default)]
    pub body: String,
    /// Repository-relative path of the document, when known.
    #[serde(default)]
    pub path: Option<String>,
}

impl ChangePayload {
    /// Frontmatter value as a string slice, if present and a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.frontmatter.get(key).and_then(Value::as_str)
    }

    /// Frontmatter value as a list of strings.
    ///
    /// A bare string is treated as a one-element list; non-string entries are
    /// skipped.
    pub fn field_list(&self, key: &str) -> Vec<String> {
        match self.frontmatter.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

/// A proposed change to the managed body of specifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Unique request identifier.
    pub id: String,
    /// Who is asking (human or agent).
    pub actor_id: String,
    /// Optional session the request belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
    pub action: ChangeAction,
    pub target_type: TargetType,
    /// Required unless `action` is `Create`.
    #[serde(default)]
    pub target_id: Option<String>,
    pub payload: ChangePayload,
    /// Why the change is needed. Must be non-empty.
    pub rationale: String,
    /// Entity IDs cited as justification, in the order given.
    #[serde(default)]
    pub references: Vec<String>,
    /// The actor asks to bypass automatic outcomes.
    #[serde(default)]
    pub override_requested: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ChangeRequest {
    /// Start building a request with the mandatory fields.
    pub fn builder(
        id: impl Into<String>,
        actor_id: impl Into<String>,
        action: ChangeAction,
        target_type: TargetType,
    ) -> ChangeRequestBuilder {
        ChangeRequestBuilder {
            request: ChangeRequest {
                id: id.into(),
                actor_id: actor_id.into(),
                session_id: None,
                action,
                target_type,
                target_id: None,
                payload: ChangePayload::default(),
                rationale: String::new(),
                references: Vec::new(),
                override_requested: false,
                submitted_at: Utc::now(),
            },
        }
    }

    /// Check the structural invariants every request must satisfy.
    ///
    /// Requests that arrive through deserialization skip the builder, so the
    /// orchestrator calls this again before evaluating.
    pub fn validate(&self) -> LibrarianResult<()> {
        if self.id.trim().is_empty() {
            return Err(LibrarianError::InvalidRequest {
                reason: "request id must not be empty".to_string(),
            });
        }
        if self.actor_id.trim().is_empty() {
            return Err(LibrarianError::InvalidRequest {
                reason: format!("request '{}' has no actor", self.id),
            });
        }
        if self.rationale.trim().is_empty() {
            return Err(LibrarianError::InvalidRequest {
                reason: format!("request '{}' has an empty rationale", self.id),
            });
        }
        let has_target = self
            .target_id
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if self.action != ChangeAction::Create && !has_target {
            return Err(LibrarianError::InvalidRequest {
                reason: format!(
                    "request '{}' must name a target for action '{}'",
                    self.id, self.action
                ),
            });
        }
        Ok(())
    }
}

/// Builder for `ChangeRequest`. `build()` runs `ChangeRequest::validate`.
#[derive(Debug, Clone)]
pub struct ChangeRequestBuilder {
    request: ChangeRequest,
}

impl ChangeRequestBuilder {
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.request.session_id = Some(session_id.into());
        self
    }

    pub fn target(mut self, target_id: impl Into<String>) -> Self {
        self.request.target_id = Some(target_id.into());
        self
    }

    pub fn payload(mut self, payload: ChangePayload) -> Self {
        self.request.payload = payload;
        self
    }

    /// Set a single frontmatter field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request
            .payload
            .frontmatter
            .insert(key.into(), value.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.payload.path = Some(path.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.payload.body = body.into();
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.request.rationale = rationale.into();
        self
    }

    pub fn reference(mut self, entity_id: impl Into<String>) -> Self {
        self.request.references.push(entity_id.into());
        self
    }

    pub fn override_requested(mut self, requested: bool) -> Self {
        self.request.override_requested = requested;
        self
    }

    pub fn submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.request.submitted_at = at;
        self
    }

    pub fn build(self) -> LibrarianResult<ChangeRequest> {
        self.request.validate()?;
        Ok(self.request)
    }
}
