// src/transaction/mod.rs
//! Atomic execution of one fix processor.
//!
//! Every run walks `CREATED -> BACKING_UP -> PROCESSING -> VALIDATING` and
//! ends in exactly one of `COMMITTED` or `ROLLED_BACK`. Dry runs skip
//! validation and never write.

pub mod backup;
pub mod sanity;
mod state;
pub mod validate;

use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::collector::DiagnosticSource;
use crate::error::{CollectorFailure, FixError, Result};
use crate::events::{EventKind, EventLogger};
use crate::processors::{LineChange, ProcessContext, ProcessOutcome, ProcessorRegistry};

pub use backup::{BackupResult, FileSnapshot, FileStats, RestoreFailure, RollbackReport};
pub use sanity::{SanityCheck, SanityChecks};
pub use state::{Transaction, TxStatus};
pub use validate::{ValidationIssue, ValidationReport, Validator};

/// The pipeline stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Collector,
    Processor,
    Validation,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collector => "collector",
            Self::Processor => "processor",
            Self::Validation => "validation",
        };
        f.write_str(s)
    }
}

/// Structured description of why a transaction rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionFailure {
    pub component: Component,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBackup {
    pub path: String,
    pub reason: String,
}

/// Final record of one transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub id: String,
    pub code: String,
    pub status: TxStatus,
    pub dry_run: bool,
    /// Zero unless committed.
    pub files_processed: usize,
    /// Zero unless committed.
    pub errors_fixed: usize,
    pub changes: Vec<LineChange>,
    pub backups_captured: usize,
    pub backups_skipped: Vec<SkippedBackup>,
    /// Occurrences of the code left after a live fix; `None` if unknown.
    pub remaining_errors: Option<usize>,
    pub validation_errors: Vec<String>,
    pub failure: Option<TransactionFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collector_failure: Option<CollectorFailure>,
    pub rollback: Option<RollbackReport>,
    pub duration_ms: u64,
}

impl TransactionResult {
    #[must_use]
    pub fn committed(&self) -> bool {
        self.status == TxStatus::Committed
    }

    #[must_use]
    pub fn rollback_incomplete(&self) -> bool {
        self.rollback.as_ref().is_some_and(|r| !r.is_complete())
    }

    /// The failure as a typed error. A partial rollback outranks its cause.
    #[must_use]
    pub fn error(&self) -> Option<FixError> {
        if let Some(rollback) = self.rollback.as_ref().filter(|r| !r.is_complete()) {
            return Some(FixError::RollbackPartial {
                failed: rollback.failed.len(),
                attempted: rollback.attempted(),
            });
        }
        if let Some(failure) = &self.collector_failure {
            return Some(FixError::Collector(failure.clone()));
        }
        let failure = self.failure.as_ref()?;
        Some(match failure.component {
            Component::Validation if !self.validation_errors.is_empty() => {
                FixError::Validation(self.validation_errors.clone())
            }
            _ => FixError::Processor {
                code: self.code.clone(),
                reason: failure.condition.clone(),
            },
        })
    }
}

/// Runs transactions and owns the set of in-flight ones.
pub struct TransactionEngine {
    root: PathBuf,
    source: Box<dyn DiagnosticSource>,
    registry: ProcessorRegistry,
    checks: SanityChecks,
    logger: EventLogger,
    strict_remaining: bool,
    active: HashMap<String, Transaction>,
    sequence: u64,
}

impl TransactionEngine {
    #[must_use]
    pub fn new(root: &Path, source: Box<dyn DiagnosticSource>, registry: ProcessorRegistry) -> Self {
        Self {
            root: root.to_path_buf(),
            source,
            registry,
            checks: SanityChecks::default(),
            logger: EventLogger::disabled(),
            strict_remaining: false,
            active: HashMap::new(),
            sequence: 0,
        }
    }

    #[must_use]
    pub fn with_checks(mut self, checks: SanityChecks) -> Self {
        self.checks = checks;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: EventLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Fail validation when occurrences of the target code remain.
    #[must_use]
    pub fn strict_remaining(mut self, strict: bool) -> Self {
        self.strict_remaining = strict;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of transactions that have started but not reached a terminal state.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Runs the processor for `code` as one transaction.
    ///
    /// Failures inside the transaction are contained in the returned result;
    /// only an unsupported code is an error, and it is raised before anything starts.
    ///
    /// # Errors
    /// Returns `FixError::UnsupportedCode` if no processor is registered.
    pub fn execute(&mut self, code: &str, dry_run: bool) -> Result<TransactionResult> {
        if !self.registry.supports(code) {
            return Err(FixError::UnsupportedCode(code.to_string()));
        }

        let start = Instant::now();
        self.sequence += 1;
        let id = format!("tx-{}-{}", chrono::Utc::now().timestamp_millis(), self.sequence);
        self.active
            .insert(id.clone(), Transaction::new(id.clone(), code, dry_run));
        self.logger.log(EventKind::TransactionStarted {
            id: id.clone(),
            code: code.to_string(),
            dry_run,
        });

        let run = match self.run_phases(&id, code, dry_run) {
            Ok(result) => Ok(result),
            // An illegal transition: restore whatever was captured.
            Err(e) => self.roll_back(&id, Component::Processor, e.to_string(), Draft::default()),
        };

        let mut tx = self
            .active
            .remove(&id)
            .ok_or_else(|| FixError::Config(format!("transaction {id} vanished")))?;
        let mut result = run?;
        result.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tx.discard_backups();

        self.log_result(&result);
        Ok(result)
    }

    fn tx(&mut self, id: &str) -> Result<&mut Transaction> {
        self.active
            .get_mut(id)
            .ok_or_else(|| FixError::Config(format!("unknown transaction {id}")))
    }

    fn run_phases(&mut self, id: &str, code: &str, dry_run: bool) -> Result<TransactionResult> {
        // BACKING_UP
        self.tx(id)?.advance(TxStatus::BackingUp)?;
        let diagnostics = self.source.collect();
        if let Some(failure) = &diagnostics.failure {
            self.logger.log(EventKind::CollectorFailed {
                reason: failure.to_string(),
            });
            let condition = format!("cannot determine files to back up: {failure}");
            let draft = Draft {
                collector_failure: Some(failure.clone()),
                ..Draft::default()
            };
            return self.roll_back(id, Component::Collector, condition, draft);
        }

        let mut draft = Draft::default();
        for file in diagnostics.files_for(code) {
            let result = backup::capture(&self.root, &file);
            if let BackupResult::Skipped { reason } = &result {
                eprintln!(
                    "{} {file} could not be backed up and will not be processed: {reason}",
                    "[WARN]".yellow()
                );
                self.logger.log(EventKind::BackupSkipped {
                    id: id.to_string(),
                    path: file.clone(),
                    reason: reason.clone(),
                });
                draft.skipped.push(SkippedBackup {
                    path: file.clone(),
                    reason: reason.clone(),
                });
            } else {
                draft.captured += 1;
            }
            self.tx(id)?.record_backup(file, result)?;
        }

        // PROCESSING: only files with a captured snapshot are handed over.
        self.tx(id)?.advance(TxStatus::Processing)?;
        let targets: Vec<_> = {
            let backups = self.tx(id)?.backups();
            diagnostics
                .occurrences_for(code)
                .into_iter()
                .filter(|o| backups.get(&o.file_path).and_then(BackupResult::snapshot).is_some())
                .collect()
        };
        let outcome = match self.registry.create(code) {
            Ok(processor) => {
                let ctx = ProcessContext::new(&self.root, &targets);
                processor.process(&ctx, dry_run)
            }
            Err(e) => Err(e.into()),
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let condition = format!("{e:#}");
                return self.roll_back(id, Component::Processor, condition, draft);
            }
        };
        draft.outcome = outcome;

        if dry_run {
            self.tx(id)?.advance(TxStatus::Committed)?;
            return Ok(draft.finish(id, code, TxStatus::Committed, dry_run));
        }

        // VALIDATING
        self.tx(id)?.advance(TxStatus::Validating)?;
        let report = {
            let tx = self
                .active
                .get(id)
                .ok_or_else(|| FixError::Config(format!("unknown transaction {id}")))?;
            Validator {
                root: &self.root,
                source: self.source.as_ref(),
                checks: &self.checks,
                strict_remaining: self.strict_remaining,
            }
            .run(code, tx.backups())
        };
        if let Some(failure) = &report.recount_failure {
            eprintln!(
                "{} remaining count unknown, collector failed: {failure}",
                "[WARN]".yellow()
            );
        }
        draft.remaining = report.remaining;
        draft.validation_errors = report.issues.iter().map(ToString::to_string).collect();

        if !report.passed() {
            let condition = draft.validation_errors.join("; ");
            return self.roll_back(id, Component::Validation, condition, draft);
        }

        self.tx(id)?.advance(TxStatus::Committed)?;
        Ok(draft.finish(id, code, TxStatus::Committed, dry_run))
    }

    fn roll_back(
        &mut self,
        id: &str,
        component: Component,
        condition: String,
        mut draft: Draft,
    ) -> Result<TransactionResult> {
        let tx = self
            .active
            .get_mut(id)
            .ok_or_else(|| FixError::Config(format!("unknown transaction {id}")))?;
        let (code, dry_run) = (tx.code.clone(), tx.dry_run);

        let report = if dry_run {
            RollbackReport {
                dry_run: true,
                ..RollbackReport::default()
            }
        } else {
            backup::restore_all(&self.root, tx.backups())
        };
        // Only CREATED cannot reach ROLLED_BACK, and nothing is written before backup.
        if tx.status().can_advance_to(TxStatus::RolledBack) {
            tx.advance(TxStatus::RolledBack)?;
        }

        for failure in &report.failed {
            eprintln!(
                "{} could not restore {}: {}",
                "[CRITICAL]".red().bold(),
                failure.path,
                failure.reason
            );
            self.logger.log(EventKind::RestoreFailed {
                id: id.to_string(),
                path: failure.path.clone(),
                reason: failure.reason.clone(),
            });
        }

        draft.failure = Some(TransactionFailure {
            component,
            condition,
        });
        draft.rollback = Some(report);
        Ok(draft.finish(id, &code, TxStatus::RolledBack, dry_run))
    }

    fn log_result(&self, result: &TransactionResult) {
        match (&result.failure, &result.rollback) {
            (Some(failure), rollback) => {
                let (restored, restore_failed) = rollback
                    .as_ref()
                    .map_or((0, 0), |r| (r.restored.len(), r.failed.len()));
                self.logger.log(EventKind::TransactionRolledBack {
                    id: result.id.clone(),
                    code: result.code.clone(),
                    component: failure.component.to_string(),
                    condition: failure.condition.clone(),
                    restored,
                    restore_failed,
                });
            }
            (None, _) => self.logger.log(EventKind::TransactionCommitted {
                id: result.id.clone(),
                code: result.code.clone(),
                files_processed: result.files_processed,
                errors_fixed: result.errors_fixed,
            }),
        }
    }
}

/// Facts gathered while the phases run.
#[derive(Default)]
struct Draft {
    captured: usize,
    skipped: Vec<SkippedBackup>,
    outcome: ProcessOutcome,
    remaining: Option<usize>,
    validation_errors: Vec<String>,
    failure: Option<TransactionFailure>,
    collector_failure: Option<CollectorFailure>,
    rollback: Option<RollbackReport>,
}

impl Draft {
    fn finish(self, id: &str, code: &str, status: TxStatus, dry_run: bool) -> TransactionResult {
        let committed = status == TxStatus::Committed;
        TransactionResult {
            id: id.to_string(),
            code: code.to_string(),
            status,
            dry_run,
            files_processed: if committed { self.outcome.files_processed } else { 0 },
            errors_fixed: if committed { self.outcome.errors_fixed } else { 0 },
            changes: self.outcome.changes,
            backups_captured: self.captured,
            backups_skipped: self.skipped,
            remaining_errors: self.remaining,
            validation_errors: self.validation_errors,
            failure: self.failure,
            collector_failure: self.collector_failure,
            rollback: self.rollback,
            duration_ms: 0,
        }
    }
}
