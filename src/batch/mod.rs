// src/batch/mod.rs
//! Sequential orchestration of many transactions.

use colored::Colorize;
use serde::Serialize;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::events::{EventKind, EventLogger};
use crate::transaction::{TransactionEngine, TransactionResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Abort the remaining codes after the first rollback.
    pub stop_on_failure: bool,
    /// Fixed wait between two consecutive codes.
    pub pause_between: Duration,
    pub dry_run: bool,
}

impl BatchPolicy {
    #[must_use]
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            stop_on_failure: config.batch.stop_on_failure,
            pause_between: config.batch_pause(),
            dry_run,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub dry_run: bool,
    /// Transactions actually run.
    pub processors: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sums over committed transactions only.
    pub total_files_processed: usize,
    pub total_errors_fixed: usize,
    pub total_backups: usize,
    /// Codes screened out because no processor is registered.
    pub unsupported: Vec<String>,
    /// Codes never started because `stop_on_failure` fired.
    pub skipped: Vec<String>,
}

/// Immutable record of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<TransactionResult>,
}

impl BatchReport {
    fn from_results(
        results: Vec<TransactionResult>,
        dry_run: bool,
        unsupported: Vec<String>,
        skipped: Vec<String>,
    ) -> Self {
        let committed = || results.iter().filter(|r| r.committed());
        let summary = BatchSummary {
            dry_run,
            processors: results.len(),
            succeeded: committed().count(),
            failed: results.iter().filter(|r| !r.committed()).count(),
            total_files_processed: committed().map(|r| r.files_processed).sum(),
            total_errors_fixed: committed().map(|r| r.errors_fixed).sum(),
            total_backups: results.iter().map(|r| r.backups_captured).sum(),
            unsupported,
            skipped,
        };
        Self { summary, results }
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.summary.failed == 0
    }
}

pub struct BatchOrchestrator {
    policy: BatchPolicy,
    logger: EventLogger,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            logger: EventLogger::disabled(),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Runs one transaction per code, strictly in the supplied order.
    ///
    /// Unsupported codes are screened out up front and reported, so nothing
    /// is thrown mid-batch.
    ///
    /// # Errors
    /// Returns error only if the engine rejects a screened code, which
    /// means the registry changed underneath the batch.
    pub fn run(&self, engine: &mut TransactionEngine, codes: &[String]) -> Result<BatchReport> {
        let (runnable, unsupported): (Vec<&String>, Vec<&String>) =
            codes.iter().partition(|c| engine.registry().supports(c));
        for code in &unsupported {
            eprintln!(
                "{} {code} has no registered processor; fix it manually",
                "[WARN]".yellow()
            );
        }

        self.logger.log(EventKind::BatchStarted {
            codes: runnable.iter().map(|c| (*c).clone()).collect(),
            dry_run: self.policy.dry_run,
        });

        let mut results = Vec::with_capacity(runnable.len());
        let mut skipped = Vec::new();
        for (idx, code) in runnable.iter().enumerate() {
            if idx > 0 && !self.policy.pause_between.is_zero() {
                thread::sleep(self.policy.pause_between);
            }

            let result = engine.execute(code, self.policy.dry_run)?;
            let failed = !result.committed();
            results.push(result);

            if failed && self.policy.stop_on_failure {
                skipped = runnable[idx + 1..].iter().map(|c| (*c).clone()).collect();
                break;
            }
        }

        let report = BatchReport::from_results(
            results,
            self.policy.dry_run,
            unsupported.into_iter().cloned().collect(),
            skipped,
        );
        self.logger.log(EventKind::BatchFinished {
            succeeded: report.summary.succeeded,
            failed: report.summary.failed,
            total_errors_fixed: report.summary.total_errors_fixed,
        });
        Ok(report)
    }
}
