//! The rule runner: concurrent, failure-isolated rule execution.
//!
//! Every rule runs on a blocking worker thread, bounded by a semaphore sized
//! to the configured worker cap. Each rule gets its own timeout; the whole run
//! is bounded by an optional request deadline. Whatever happens to one rule
//! (error, panic, timeout, cancellation) is recorded as a `RuleError` and the
//! others are still collected.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use librarian_contracts::{
    config::RunnerConfig,
    context::EvaluationContext,
    request::ChangeRequest,
    violation::{sort_violations, RuleError, RuleErrorCause, Violation},
};

use crate::traits::Rule;

/// What one `run_all` produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    /// Union of the findings of every rule that completed, in presentation
    /// order.
    pub violations: Vec<Violation>,
    /// One entry per rule that did not complete, sorted by rule ID.
    pub rule_errors: Vec<RuleError>,
    pub rules_executed: usize,
}

/// Executes a rule set concurrently.
#[derive(Debug, Clone)]
pub struct RuleRunner {
    per_rule_timeout: Duration,
    max_workers: usize,
}

impl RuleRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        let max_workers = config
            .max_workers
            .filter(|n| *n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1);
        Self {
            per_rule_timeout: config.per_rule_timeout(),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every rule against `request` and `ctx`.
    ///
    /// Never fails. When `deadline` passes, rules still in flight are
    /// abandoned and recorded as `Cancelled`; results already collected are
    /// kept.
    pub async fn run_all(
        &self,
        rules: &[Arc<dyn Rule>],
        request: Arc<ChangeRequest>,
        ctx: Arc<EvaluationContext>,
        deadline: Option<Instant>,
    ) -> RunOutcome {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut pending: Vec<String> = Vec::with_capacity(rules.len());

        for rule in rules {
            let rule = Arc::clone(rule);
            let request = Arc::clone(&request);
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.per_rule_timeout;

            pending.push(rule.id().to_string());
            tasks.spawn(async move {
                let rule_id = rule.id().to_string();
                let result = execute_rule(rule, request, ctx, semaphore, timeout).await;
                (rule_id, result)
            });
        }

        let mut outcome = RunOutcome {
            rules_executed: rules.len(),
            ..RunOutcome::default()
        };

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            request_id = %request.id,
                            in_flight = pending.len(),
                            "request deadline reached, abandoning remaining rules"
                        );
                        tasks.abort_all();
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            let Some(joined) = next else { break };
            let (rule_id, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    // The rule stays in `pending` and is reported as cancelled.
                    warn!(request_id = %request.id, error = %e, "rule task did not complete");
                    continue;
                }
            };

            if let Some(pos) = pending.iter().position(|id| *id == rule_id) {
                pending.swap_remove(pos);
            }

            match result {
                Ok(mut violations) => {
                    debug!(
                        request_id = %request.id,
                        rule_id = %rule_id,
                        violations = violations.len(),
                        "rule completed"
                    );
                    outcome.violations.append(&mut violations);
                }
                Err(cause) => {
                    warn!(
                        request_id = %request.id,
                        rule_id = %rule_id,
                        cause = %cause,
                        "rule did not complete"
                    );
                    outcome.rule_errors.push(RuleError::new(rule_id, cause));
                }
            }
        }

        for rule_id in pending {
            outcome
                .rule_errors
                .push(RuleError::new(rule_id, RuleErrorCause::Cancelled));
        }

        sort_violations(&mut outcome.violations);
        outcome.rule_errors.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        outcome
    }
}

async fn execute_rule(
    rule: Arc<dyn Rule>,
    request: Arc<ChangeRequest>,
    ctx: Arc<EvaluationContext>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
) -> Result<Vec<Violation>, RuleErrorCause> {
    let permit = semaphore
        .acquire_owned()
        .await
        .map_err(|_| RuleErrorCause::Cancelled)?;

    // A timed-out blocking task cannot be interrupted; it is abandoned and its
    // result discarded. The permit lives on the worker thread, so an abandoned
    // rule still occupies its slot until it returns.
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        rule.evaluate(&request, &ctx)
    });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(violations))) => Ok(violations),
        Ok(Ok(Err(e))) => Err(RuleErrorCause::Failed {
            reason: e.to_string(),
        }),
        Ok(Err(join_err)) if join_err.is_panic() => Err(RuleErrorCause::Panicked {
            message: panic_message(join_err.into_panic()),
        }),
        Ok(Err(_)) => Err(RuleErrorCause::Cancelled),
        Err(_) => Err(RuleErrorCause::TimedOut {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked with a non-string payload".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
