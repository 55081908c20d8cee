// tests/integration_batch.rs
use atomfix_core::batch::{BatchOrchestrator, BatchPolicy};
use atomfix_core::collector::StaticSource;
use atomfix_core::processors::{FixProcessor, ProcessContext, ProcessOutcome, ProcessorRegistry};
use atomfix_core::transaction::TransactionEngine;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::tempdir;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const SAMPLE: &str = "\
const plant = {
  name: 'basil'
  kind: 'herb'
};
const const watering = 3;
";

const DIAGNOSTICS: &str = "\
src/plant.ts(2,16): error D1005: ',' expected.
src/plant.ts(5,7): error D1434: Unexpected keyword or identifier.
";

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| (*c).to_string()).collect()
}

fn sample_project() -> Result<tempfile::TempDir> {
    let d = tempdir()?;
    fs::create_dir_all(d.path().join("src"))?;
    fs::write(d.path().join("src/plant.ts"), SAMPLE)?;
    Ok(d)
}

#[test]
fn dry_run_batch_touches_nothing() -> Result<()> {
    let d = sample_project()?;
    let mut engine = TransactionEngine::new(
        d.path(),
        Box::new(StaticSource::from_output(DIAGNOSTICS)),
        ProcessorRegistry::builtin(),
    );
    let policy = BatchPolicy {
        dry_run: true,
        ..BatchPolicy::default()
    };

    let report = BatchOrchestrator::new(policy).run(&mut engine, &codes(&["D1005", "D1434"]))?;

    assert!(report.summary.dry_run);
    assert_eq!(report.summary.processors, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.total_errors_fixed, 2);
    assert!(report.results.iter().all(|r| r.dry_run));
    assert_eq!(fs::read_to_string(d.path().join("src/plant.ts"))?, SAMPLE);
    Ok(())
}

#[test]
fn live_batch_applies_fixes_in_order() -> Result<()> {
    let d = sample_project()?;
    let mut engine = TransactionEngine::new(
        d.path(),
        Box::new(StaticSource::from_output(DIAGNOSTICS)),
        ProcessorRegistry::builtin(),
    );

    let report = BatchOrchestrator::new(BatchPolicy::default())
        .run(&mut engine, &codes(&["D1005", "D1434"]))?;

    assert!(report.all_succeeded());
    let order: Vec<&str> = report.results.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(order, vec!["D1005", "D1434"]);
    let fixed = fs::read_to_string(d.path().join("src/plant.ts"))?;
    assert!(fixed.contains("name: 'basil',"));
    assert!(fixed.contains("\nconst watering = 3;"));
    Ok(())
}

/// Succeeds or fails depending on the code it was registered for.
struct Outcome {
    code: &'static str,
    fail: bool,
}

impl FixProcessor for Outcome {
    fn code(&self) -> &'static str {
        self.code
    }

    fn description(&self) -> &'static str {
        "fixed outcome"
    }

    fn process(&self, _ctx: &ProcessContext<'_>, _dry_run: bool) -> anyhow::Result<ProcessOutcome> {
        if self.fail {
            anyhow::bail!("{} refused", self.code);
        }
        Ok(ProcessOutcome {
            files_processed: 2,
            errors_fixed: 5,
            changes: Vec::new(),
        })
    }
}

fn mixed_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register("D1", || Box::new(Outcome { code: "D1", fail: false }));
    registry.register("D2", || Box::new(Outcome { code: "D2", fail: true }));
    registry.register("D3", || Box::new(Outcome { code: "D3", fail: false }));
    registry
}

#[test]
fn totals_count_committed_transactions_only() -> Result<()> {
    let d = tempdir()?;
    let mut engine = TransactionEngine::new(d.path(), Box::new(StaticSource::default()), mixed_registry());

    let report = BatchOrchestrator::new(BatchPolicy::default())
        .run(&mut engine, &codes(&["D1", "D2", "D3"]))?;

    assert_eq!(report.summary.processors, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.total_errors_fixed, 10);
    assert_eq!(report.summary.total_files_processed, 4);
    let failed = &report.results[1];
    assert!(!failed.committed());
    assert_eq!(failed.errors_fixed, 0);
    Ok(())
}

#[test]
fn stop_on_failure_skips_the_rest() -> Result<()> {
    let d = tempdir()?;
    let mut engine = TransactionEngine::new(d.path(), Box::new(StaticSource::default()), mixed_registry());
    let policy = BatchPolicy {
        stop_on_failure: true,
        ..BatchPolicy::default()
    };

    let report = BatchOrchestrator::new(policy).run(&mut engine, &codes(&["D1", "D2", "D3"]))?;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary.skipped, vec!["D3".to_string()]);
    Ok(())
}

#[test]
fn unsupported_codes_are_screened_out() -> Result<()> {
    let d = tempdir()?;
    let mut engine = TransactionEngine::new(d.path(), Box::new(StaticSource::default()), mixed_registry());

    let report = BatchOrchestrator::new(BatchPolicy::default())
        .run(&mut engine, &codes(&["D1", "D2339", "D3"]))?;

    assert_eq!(report.summary.processors, 2);
    assert_eq!(report.summary.unsupported, vec!["D2339".to_string()]);
    Ok(())
}

#[test]
fn pauses_only_between_codes() -> Result<()> {
    let d = tempdir()?;
    let mut engine = TransactionEngine::new(d.path(), Box::new(StaticSource::default()), mixed_registry());
    let policy = BatchPolicy {
        pause_between: Duration::from_millis(200),
        ..BatchPolicy::default()
    };

    let start = Instant::now();
    BatchOrchestrator::new(policy).run(&mut engine, &codes(&["D1", "D3"]))?;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(400), "paused after the last code: {elapsed:?}");
    Ok(())
}
