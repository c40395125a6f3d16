//! `DriftDetector`: runs every structural check against the graph store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use librarian_contracts::{
    config::DriftConfig,
    drift::{DriftFinding, DriftKind, DriftQueryError, DriftScanReport},
};
use librarian_core::traits::{DriftScanner, GraphStore};

use crate::checks::{self, CheckContext};

/// Concurrent checks when `max_concurrent_checks` is unset.
const DEFAULT_CONCURRENT_CHECKS: usize = 4;

/// Stateless drift detector over an injected graph store.
pub struct DriftDetector {
    graph: Arc<dyn GraphStore>,
    config: DriftConfig,
}

impl DriftDetector {
    pub fn new(graph: Arc<dyn GraphStore>, config: DriftConfig) -> Self {
        Self { graph, config }
    }

    fn concurrency(&self) -> usize {
        self.config
            .max_concurrent_checks
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENT_CHECKS)
    }

    async fn run_check(
        &self,
        kind: DriftKind,
        ctx: CheckContext,
    ) -> Result<Vec<DriftFinding>, DriftQueryError> {
        let timeout = self.config.query_timeout();
        let fail = |reason: String| {
            warn!(check = %kind, reason = %reason, "drift check failed");
            DriftQueryError { kind, reason }
        };

        let records = match tokio::time::timeout(timeout, self.graph.query(checks::pattern(kind))).await {
            Err(_) => {
                return Err(fail(format!(
                    "query timed out after {}ms",
                    timeout.as_millis()
                )))
            }
            Ok(Err(e)) => return Err(fail(e.to_string())),
            Ok(Ok(records)) => records,
        };

        let findings = checks::evaluate(kind, &records, &ctx).map_err(fail)?;
        debug!(check = %kind, rows = records.len(), findings = findings.len(), "drift check complete");
        Ok(findings)
    }
}

#[async_trait]
impl DriftScanner for DriftDetector {
    async fn scan(&self) -> DriftScanReport {
        let now = Utc::now();
        let ctx = CheckContext {
            now,
            undocumented_since: TimeDelta::try_days(self.config.undocumented_window_days)
                .and_then(|window| now.checked_sub_signed(window)),
        };

        let results: Vec<_> = stream::iter(DriftKind::ALL)
            .map(|kind| self.run_check(kind, ctx))
            .buffer_unordered(self.concurrency())
            .collect()
            .await;

        let mut report = DriftScanReport::default();
        for result in results {
            match result {
                Ok(findings) => report.findings.extend(findings),
                Err(e) => report.errors.push(e),
            }
        }

        report.findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.kind.cmp(&b.kind))
                .then_with(|| a.subject_id.cmp(&b.subject_id))
        });
        report.errors.sort_by_key(|e| e.kind);

        info!(
            findings = report.findings.len(),
            failed_checks = report.errors.len(),
            "drift scan complete"
        );
        report
    }
}
