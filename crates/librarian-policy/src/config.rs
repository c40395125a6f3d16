//! Engine configuration loading.
//!
//! `EngineConfig` is parsed from TOML and validated once at startup. After
//! that it is read-only and shared by reference across every evaluation.

use std::path::Path;

use tracing::debug;

use librarian_contracts::{
    config::EngineConfig,
    error::{LibrarianError, LibrarianResult},
};

/// Upper bound on `drift.undocumented_window_days` (about a century).
pub const MAX_UNDOCUMENTED_WINDOW_DAYS: i64 = 36_500;

/// Parse `s` as TOML and validate the result.
///
/// Missing sections and fields take their defaults, so an empty document is
/// valid. Returns `LibrarianError::ConfigError` if the TOML is malformed or a
/// value is out of range.
pub fn from_toml_str(s: &str) -> LibrarianResult<EngineConfig> {
    let config: EngineConfig = toml::from_str(s).map_err(|e| LibrarianError::ConfigError {
        reason: format!("failed to parse engine TOML: {}", e),
    })?;
    validate(&config)?;
    debug!(
        high_threshold = config.policy.high_severity_escalation_threshold,
        min_confidence = config.policy.min_confidence,
        per_rule_timeout_ms = config.runner.per_rule_timeout_ms,
        "engine configuration loaded"
    );
    Ok(config)
}

/// Read the file at `path` and parse it with `from_toml_str`.
pub fn from_file(path: &Path) -> LibrarianResult<EngineConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| LibrarianError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    from_toml_str(&contents)
}

/// Check every value that has a valid range.
pub fn validate(config: &EngineConfig) -> LibrarianResult<()> {
    let policy = &config.policy;
    if policy.high_severity_escalation_threshold == 0 {
        return Err(invalid("policy.high_severity_escalation_threshold must be at least 1"));
    }
    if policy.max_rationale_len == 0 {
        return Err(invalid("policy.max_rationale_len must be positive"));
    }
    if !(0.0..=1.0).contains(&policy.min_confidence) {
        return Err(invalid(format!(
            "policy.min_confidence must be within [0, 1], got {}",
            policy.min_confidence
        )));
    }
    for (name, value) in [
        ("critical", policy.penalties.critical),
        ("high", policy.penalties.high),
        ("medium", policy.penalties.medium),
        ("low", policy.penalties.low),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!(
                "policy.penalties.{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if policy.inviolable_categories.iter().any(|c| c.trim().is_empty()) {
        return Err(invalid("policy.inviolable_categories must not contain empty names"));
    }

    let runner = &config.runner;
    if runner.per_rule_timeout_ms == 0 {
        return Err(invalid("runner.per_rule_timeout_ms must be positive"));
    }
    if runner.request_deadline_ms == Some(0) {
        return Err(invalid("runner.request_deadline_ms must be positive when set"));
    }
    if runner.max_workers == Some(0) {
        return Err(invalid("runner.max_workers must be positive when set"));
    }

    let drift = &config.drift;
    if drift.query_timeout_ms == 0 {
        return Err(invalid("drift.query_timeout_ms must be positive"));
    }
    if !(0..=MAX_UNDOCUMENTED_WINDOW_DAYS).contains(&drift.undocumented_window_days) {
        return Err(invalid(format!(
            "drift.undocumented_window_days must be within [0, {}], got {}",
            MAX_UNDOCUMENTED_WINDOW_DAYS, drift.undocumented_window_days
        )));
    }
    if drift.max_concurrent_checks == Some(0) {
        return Err(invalid("drift.max_concurrent_checks must be positive when set"));
    }

    if config.ledger.drift_actor_id.trim().is_empty() {
        return Err(invalid("ledger.drift_actor_id must not be empty"));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> LibrarianError {
    LibrarianError::ConfigError {
        reason: reason.into(),
    }
}
