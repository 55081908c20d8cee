// src/cli/handlers.rs
use crate::batch::{BatchOrchestrator, BatchPolicy};
use crate::cli::args::BatchArgs;
use crate::collector::{CommandCollector, DiagnosticSource};
use crate::config::Config;
use crate::error::FixError;
use crate::events::{EventKind, EventLogger};
use crate::exit::AtomfixExit;
use crate::gate::{self, GateMode, GateVerdict};
use crate::metrics::{self, ExportFormat, MetricsSnapshot, MetricsStore};
use crate::processors::ProcessorRegistry;
use crate::reporting;
use crate::transaction::TransactionEngine;
use crate::types::DiagnosticSet;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a command needs: where the project is and how it is configured.
pub struct Session {
    pub root: PathBuf,
    pub config: Config,
    pub json: bool,
    pub logger: EventLogger,
}

impl Session {
    /// Resolves the project root and loads its configuration.
    ///
    /// # Errors
    /// Returns error if the root cannot be determined or the config is invalid.
    pub fn open(root: Option<PathBuf>, config: Option<PathBuf>, json: bool) -> Result<Self> {
        let root = match root {
            Some(r) => r,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let config = match config {
            Some(path) if !path.exists() => {
                return Err(anyhow!("Config file not found: {}", path.display()))
            }
            Some(path) => Config::load_in(&root, &path)?,
            None => Config::load(&root)?,
        };
        Ok(Self {
            logger: EventLogger::new(&root),
            root,
            config,
            json,
        })
    }

    fn collector(&self) -> CommandCollector {
        CommandCollector::from_config(&self.config, &self.root)
    }

    fn engine(&self) -> TransactionEngine {
        TransactionEngine::new(
            &self.root,
            Box::new(self.collector()),
            ProcessorRegistry::builtin(),
        )
        .with_logger(self.logger.clone())
        .strict_remaining(self.config.validation.fail_on_remaining)
    }

    fn store(&self) -> MetricsStore {
        MetricsStore::new(&self.config.metrics_dir(&self.root))
    }

    /// Prints `value` as JSON in `--json` mode, otherwise runs `console`.
    fn emit<T: Serialize>(&self, value: &T, console: impl FnOnce()) -> Result<()> {
        if self.json {
            reporting::print_json(value)
        } else {
            console();
            Ok(())
        }
    }
}

fn collect(session: &Session) -> DiagnosticSet {
    let set = session.collector().collect();
    if let Some(failure) = &set.failure {
        session.logger.log(EventKind::CollectorFailed {
            reason: failure.to_string(),
        });
    }
    set
}

fn snapshot_of(session: &Session, set: &DiagnosticSet) -> MetricsSnapshot {
    MetricsSnapshot::from_diagnostics(set, Utc::now(), session.config.metrics.top_n)
}

fn record(session: &Session, snapshot: &MetricsSnapshot) -> Result<PathBuf> {
    let path = session.store().save(snapshot)?;
    session.logger.log(EventKind::SnapshotRecorded {
        date: snapshot.date(),
        total_errors: snapshot.total_errors,
    });
    Ok(path)
}

fn evaluate(session: &Session, snapshot: &MetricsSnapshot) -> GateVerdict {
    let verdict = gate::evaluate(snapshot, &session.config.gate_thresholds());
    session.logger.log(EventKind::GateEvaluated {
        passed: verdict.passed,
        current_errors: verdict.current_errors,
        critical_errors: verdict.critical_errors,
    });
    verdict
}

/// Checks that run before any live write. `Some(exit)` means refuse.
fn guard_live(session: &Session) -> Result<Option<AtomfixExit>> {
    let quality = &session.config.quality;
    if !quality.auto_fix_enabled {
        eprintln!(
            "{} live fixes are disabled (quality.autoFixEnabled = false)",
            "[X]".red().bold()
        );
        return Ok(Some(AtomfixExit::InvalidInput));
    }
    if !quality.branch_protection.require_gate {
        return Ok(None);
    }

    let set = collect(session);
    if !set.is_reliable() {
        reporting::print_diagnostics(&set);
        return Ok(Some(AtomfixExit::CollectorFailure));
    }
    let verdict = evaluate(session, &snapshot_of(session, &set));
    if verdict.passed {
        return Ok(None);
    }
    eprintln!("{} pre-change quality gate failed", "[X]".red().bold());
    if !session.json {
        reporting::print_gate(&verdict, GateMode::Enforce);
    }
    Ok(Some(AtomfixExit::GateFailed))
}

/// Handles the collect command.
///
/// # Errors
/// Returns error if output cannot be serialized.
pub fn handle_collect(session: &Session) -> Result<AtomfixExit> {
    let set = collect(session);
    session.emit(&set, || reporting::print_diagnostics(&set))?;
    Ok(if set.is_reliable() {
        AtomfixExit::Success
    } else {
        AtomfixExit::CollectorFailure
    })
}

/// Handles the plan command.
///
/// # Errors
/// Returns error if output cannot be serialized.
pub fn handle_plan(session: &Session) -> Result<AtomfixExit> {
    let set = collect(session);
    if !set.is_reliable() {
        reporting::print_diagnostics(&set);
        return Ok(AtomfixExit::CollectorFailure);
    }
    let recs = ProcessorRegistry::builtin().recommend(&set.by_code());
    session.emit(&recs, || reporting::print_plan(&recs))?;
    Ok(AtomfixExit::Success)
}

#[derive(Serialize)]
struct ProcessorInfo {
    code: String,
    description: String,
}

/// Handles the processors command.
///
/// # Errors
/// Returns error if output cannot be serialized.
pub fn handle_processors(session: &Session) -> Result<AtomfixExit> {
    let registry = ProcessorRegistry::builtin();
    let infos: Vec<ProcessorInfo> = registry
        .codes()
        .into_iter()
        .filter_map(|code| registry.create(code).ok())
        .map(|p| ProcessorInfo {
            code: p.code().to_string(),
            description: p.description().to_string(),
        })
        .collect();
    session.emit(&infos, || reporting::print_processors(&registry))?;
    Ok(AtomfixExit::Success)
}

/// Handles the execute command.
///
/// # Errors
/// Returns error if the transaction cannot be started or output fails.
pub fn handle_execute(session: &Session, code: &str, confirm: bool) -> Result<AtomfixExit> {
    let mut engine = session.engine();
    if !engine.registry().supports(code) {
        eprintln!("{} {}", "[X]".red().bold(), FixError::UnsupportedCode(code.to_string()));
        return Ok(AtomfixExit::InvalidInput);
    }
    if confirm {
        if let Some(exit) = guard_live(session)? {
            return Ok(exit);
        }
    }

    let result = engine.execute(code, !confirm)?;
    session.emit(&result, || reporting::print_transaction(&result))?;
    Ok(AtomfixExit::from_transaction(&result))
}

/// Handles the batch command.
///
/// # Errors
/// Returns error if a transaction cannot be started or output fails.
pub fn handle_batch(session: &Session, args: &BatchArgs) -> Result<AtomfixExit> {
    let mut engine = session.engine();
    if !args.codes.iter().any(|c| engine.registry().supports(c)) {
        eprintln!(
            "{} no registered processor for any of: {}",
            "[X]".red().bold(),
            args.codes.join(", ")
        );
        return Ok(AtomfixExit::InvalidInput);
    }
    if args.confirm {
        if let Some(exit) = guard_live(session)? {
            return Ok(exit);
        }
    }

    let mut policy = BatchPolicy::from_config(&session.config, !args.confirm);
    policy.stop_on_failure |= args.stop_on_failure;
    if let Some(ms) = args.pause {
        policy.pause_between = std::time::Duration::from_millis(ms);
    }

    let orchestrator = BatchOrchestrator::new(policy).with_logger(session.logger.clone());
    let report = orchestrator.run(&mut engine, &args.codes)?;
    session.emit(&report, || reporting::print_batch(&report))?;
    Ok(AtomfixExit::from_batch(&report))
}

/// Handles the gate command.
///
/// # Errors
/// Returns error if a stored snapshot cannot be read or output fails.
pub fn handle_gate(session: &Session, enforce: bool, snapshot: Option<&Path>) -> Result<AtomfixExit> {
    let snapshot = if let Some(path) = snapshot {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str::<MetricsSnapshot>(&content)
            .with_context(|| format!("Invalid snapshot document {}", path.display()))?
    } else {
        let set = collect(session);
        if !set.is_reliable() {
            reporting::print_diagnostics(&set);
            return Ok(AtomfixExit::CollectorFailure);
        }
        snapshot_of(session, &set)
    };

    let mode = if enforce {
        GateMode::Enforce
    } else {
        GateMode::Advisory
    };
    let verdict = evaluate(session, &snapshot);
    session.emit(&verdict, || reporting::print_gate(&verdict, mode))?;
    Ok(AtomfixExit::from_gate(&verdict, mode))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineReport<'a> {
    snapshot_path: &'a Path,
    snapshot: &'a MetricsSnapshot,
    verdict: &'a GateVerdict,
}

/// Handles the pipeline command: collect, record, then enforce the gate.
///
/// # Errors
/// Returns error if the snapshot cannot be stored or output fails.
pub fn handle_pipeline(session: &Session) -> Result<AtomfixExit> {
    let set = collect(session);
    if !set.is_reliable() {
        reporting::print_diagnostics(&set);
        return Ok(AtomfixExit::CollectorFailure);
    }
    let snapshot = snapshot_of(session, &set);
    let path = record(session, &snapshot)?;
    let verdict = evaluate(session, &snapshot);

    let report = PipelineReport {
        snapshot_path: &path,
        snapshot: &snapshot,
        verdict: &verdict,
    };
    session.emit(&report, || {
        reporting::print_diagnostics(&set);
        reporting::print_snapshot_saved(&snapshot, &path);
        reporting::print_gate(&verdict, GateMode::Enforce);
    })?;
    Ok(AtomfixExit::from_gate(&verdict, GateMode::Enforce))
}

/// Handles `metrics record`.
///
/// # Errors
/// Returns error if the snapshot cannot be stored or output fails.
pub fn handle_record(session: &Session) -> Result<AtomfixExit> {
    let set = collect(session);
    if !set.is_reliable() {
        reporting::print_diagnostics(&set);
        return Ok(AtomfixExit::CollectorFailure);
    }
    let snapshot = snapshot_of(session, &set);
    let path = record(session, &snapshot)?;
    session.emit(&snapshot, || reporting::print_snapshot_saved(&snapshot, &path))?;
    Ok(AtomfixExit::Success)
}

/// Handles `metrics trend`.
///
/// # Errors
/// Returns error if stored snapshots cannot be read.
pub fn handle_trend(session: &Session, days: u32) -> Result<AtomfixExit> {
    let report = metrics::trend_from_store(&session.store(), days)?;
    session.emit(&report, || reporting::print_trend(&report))?;
    Ok(AtomfixExit::Success)
}

/// Handles `metrics diff`.
///
/// # Errors
/// Returns error if a stored snapshot is unreadable.
pub fn handle_diff(session: &Session, from: &str, to: &str) -> Result<AtomfixExit> {
    match metrics::diff_dates(&session.store(), from, to) {
        Ok(diff) => {
            session.emit(&diff, || reporting::print_diff(&diff))?;
            Ok(AtomfixExit::Success)
        }
        Err(e @ (FixError::SnapshotNotFound(_) | FixError::Config(_))) => {
            eprintln!("{} {e}", "[X]".red().bold());
            Ok(AtomfixExit::InvalidInput)
        }
        Err(e) => Err(e.into()),
    }
}

/// Handles `metrics export`.
///
/// # Errors
/// Returns error if stored snapshots cannot be read.
pub fn handle_export(session: &Session, format: ExportFormat) -> Result<AtomfixExit> {
    let output = session.store().export(format)?;
    print!("{output}");
    if format == ExportFormat::Json {
        println!();
    }
    Ok(AtomfixExit::Success)
}
