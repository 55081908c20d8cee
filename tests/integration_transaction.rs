// tests/integration_transaction.rs
use atomfix_core::collector::StaticSource;
use atomfix_core::error::{CollectorFailure, FixError};
use atomfix_core::processors::{FixProcessor, ProcessContext, ProcessOutcome, ProcessorRegistry};
use atomfix_core::transaction::{Component, TransactionEngine, TxStatus};
use atomfix_core::types::{DiagnosticOccurrence, DiagnosticSet};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::tempdir;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const CODE: &str = "D9001";

fn occ(file: &str, line: usize) -> DiagnosticOccurrence {
    DiagnosticOccurrence {
        file_path: file.to_string(),
        line,
        column: 1,
        code: CODE.to_string(),
        message: "scripted".to_string(),
    }
}

fn source(occs: Vec<DiagnosticOccurrence>) -> Box<StaticSource> {
    Box::new(StaticSource::new(DiagnosticSet::new(occs)))
}

/// What a scripted processor does to every file it is handed.
#[derive(Clone, Copy)]
enum Script {
    AppendLine,
    AppendBraces,
    InjectBraces,
    FailAfterFirstWrite,
    ReplaceWithDirectory,
}

struct Scripted {
    script: Script,
    seen: Rc<RefCell<Vec<String>>>,
}

impl FixProcessor for Scripted {
    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "scripted test processor"
    }

    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> anyhow::Result<ProcessOutcome> {
        let mut files: Vec<&str> = ctx.occurrences.iter().map(|o| o.file_path.as_str()).collect();
        files.dedup();
        self.seen
            .borrow_mut()
            .extend(files.iter().map(|f| (*f).to_string()));

        let mut outcome = ProcessOutcome::default();
        for (i, file) in files.iter().enumerate() {
            let path = ctx.root.join(file);
            if !dry_run {
                match self.script {
                    Script::AppendLine => {
                        let text = fs::read_to_string(&path)?;
                        fs::write(&path, format!("{text}// fixed\n"))?;
                    }
                    Script::AppendBraces => {
                        let text = fs::read_to_string(&path)?;
                        fs::write(&path, format!("{text}const broken = {{}}}}}}}}}};\n"))?;
                    }
                    Script::InjectBraces => fs::write(&path, "const x = {}}}};\n")?,
                    Script::FailAfterFirstWrite => {
                        if i > 0 {
                            anyhow::bail!("processor crashed on {file}");
                        }
                        fs::write(&path, "half-done\n")?;
                    }
                    Script::ReplaceWithDirectory => {
                        fs::remove_file(&path)?;
                        fs::create_dir(&path)?;
                        fs::write(path.join("inner"), "x")?;
                    }
                }
            }
            outcome.files_processed += 1;
            outcome.errors_fixed += 1;
        }
        Ok(outcome)
    }
}

fn registry(script: Script) -> (ProcessorRegistry, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&seen);
    let mut registry = ProcessorRegistry::new();
    registry.register(CODE, move || {
        Box::new(Scripted {
            script,
            seen: Rc::clone(&handle),
        })
    });
    (registry, seen)
}

#[test]
fn clean_live_run_commits() -> Result<()> {
    let d = tempdir()?;
    fs::write(d.path().join("a.ts"), "let a = 1;\n")?;
    let (registry, _) = registry(Script::AppendLine);
    let mut engine = TransactionEngine::new(d.path(), source(vec![occ("a.ts", 1)]), registry);

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::Committed);
    assert_eq!(result.errors_fixed, 1);
    assert_eq!(result.backups_captured, 1);
    assert!(result.failure.is_none());
    assert_eq!(fs::read_to_string(d.path().join("a.ts"))?, "let a = 1;\n// fixed\n");
    assert_eq!(engine.active_count(), 0);
    Ok(())
}

#[test]
fn injected_corruption_rolls_back_to_exact_bytes() -> Result<()> {
    let d = tempdir()?;
    let original = "const x = {\r\n  a: 1\r\n};\r\n";
    fs::write(d.path().join("a.ts"), original)?;
    let (registry, _) = registry(Script::InjectBraces);
    let mut engine = TransactionEngine::new(d.path(), source(vec![occ("a.ts", 2)]), registry);

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::RolledBack);
    let failure = result.failure.as_ref().ok_or("missing failure")?;
    assert_eq!(failure.component, Component::Validation);
    assert!(failure.condition.contains("a.ts"));
    let rollback = result.rollback.as_ref().ok_or("missing rollback")?;
    assert!(rollback.is_complete());
    assert_eq!(rollback.restored, vec!["a.ts".to_string()]);
    assert_eq!(fs::read(d.path().join("a.ts"))?, original.as_bytes());
    assert_eq!(result.errors_fixed, 0);
    assert_eq!(result.files_processed, 0);
    assert!(matches!(result.error(), Some(FixError::Validation(ref v)) if v.len() == 1));
    Ok(())
}

#[test]
fn new_corruption_is_caught_even_when_file_already_had_the_signature() -> Result<()> {
    let d = tempdir()?;
    let original = "const v = f(g(h(i(1))));\n";
    fs::write(d.path().join("a.ts"), original)?;
    let (registry, _) = registry(Script::AppendBraces);
    let mut engine = TransactionEngine::new(d.path(), source(vec![occ("a.ts", 1)]), registry);

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::RolledBack);
    assert_eq!(
        result.failure.as_ref().map(|f| f.component),
        Some(Component::Validation)
    );
    assert_eq!(fs::read_to_string(d.path().join("a.ts"))?, original);
    Ok(())
}

#[test]
fn processor_failure_restores_every_captured_file() -> Result<()> {
    let d = tempdir()?;
    fs::write(d.path().join("a.ts"), "a\n")?;
    fs::write(d.path().join("b.ts"), "b\n")?;
    let (registry, _) = registry(Script::FailAfterFirstWrite);
    let mut engine = TransactionEngine::new(
        d.path(),
        source(vec![occ("a.ts", 1), occ("b.ts", 1)]),
        registry,
    );

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::RolledBack);
    assert_eq!(
        result.failure.as_ref().map(|f| f.component),
        Some(Component::Processor)
    );
    assert_eq!(fs::read_to_string(d.path().join("a.ts"))?, "a\n");
    assert_eq!(fs::read_to_string(d.path().join("b.ts"))?, "b\n");
    Ok(())
}

#[test]
fn collector_failure_rolls_back_before_processing() -> Result<()> {
    let d = tempdir()?;
    let (registry, seen) = registry(Script::AppendLine);
    let failing = Box::new(StaticSource::new(DiagnosticSet::failed(
        CollectorFailure::Timeout {
            command: "tsc".into(),
            seconds: 120,
        },
    )));
    let mut engine = TransactionEngine::new(d.path(), failing, registry);

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::RolledBack);
    assert_eq!(
        result.failure.as_ref().map(|f| f.component),
        Some(Component::Collector)
    );
    assert!(seen.borrow().is_empty(), "processor must not run");
    assert!(matches!(
        result.error(),
        Some(FixError::Collector(CollectorFailure::Timeout { .. }))
    ));
    Ok(())
}

#[test]
fn unreadable_files_are_skipped_and_not_processed() -> Result<()> {
    let d = tempdir()?;
    fs::write(d.path().join("a.ts"), "a\n")?;
    let (registry, seen) = registry(Script::AppendLine);
    let mut engine = TransactionEngine::new(
        d.path(),
        source(vec![occ("a.ts", 1), occ("gone.ts", 3)]),
        registry,
    );

    let result = engine.execute(CODE, false)?;

    assert!(result.committed());
    assert_eq!(result.backups_captured, 1);
    assert_eq!(result.backups_skipped.len(), 1);
    assert_eq!(result.backups_skipped[0].path, "gone.ts");
    assert_eq!(*seen.borrow(), vec!["a.ts".to_string()]);
    Ok(())
}

#[test]
fn dry_run_writes_nothing_and_skips_validation() -> Result<()> {
    let d = tempdir()?;
    fs::write(d.path().join("a.ts"), "a\n")?;
    let (registry, _) = registry(Script::InjectBraces);
    let mut engine = TransactionEngine::new(d.path(), source(vec![occ("a.ts", 1)]), registry);

    let result = engine.execute(CODE, true)?;

    assert!(result.committed());
    assert!(result.dry_run);
    assert_eq!(result.errors_fixed, 1);
    assert_eq!(result.remaining_errors, None);
    assert_eq!(fs::read_to_string(d.path().join("a.ts"))?, "a\n");
    Ok(())
}

#[test]
fn unsupported_code_is_rejected_before_starting() -> Result<()> {
    let d = tempdir()?;
    let mut engine = TransactionEngine::new(d.path(), source(vec![]), ProcessorRegistry::new());
    let err = engine.execute("D0000", true).err();
    assert!(matches!(err, Some(FixError::UnsupportedCode(ref c)) if c == "D0000"));
    assert_eq!(engine.active_count(), 0);
    Ok(())
}

#[test]
fn every_outcome_is_exactly_one_terminal_state() -> Result<()> {
    for script in [
        Script::AppendLine,
        Script::InjectBraces,
        Script::FailAfterFirstWrite,
    ] {
        let d = tempdir()?;
        fs::write(d.path().join("a.ts"), "a\n")?;
        fs::write(d.path().join("b.ts"), "b\n")?;
        let (registry, _) = registry(script);
        let mut engine = TransactionEngine::new(
            d.path(),
            source(vec![occ("a.ts", 1), occ("b.ts", 1)]),
            registry,
        );
        let result = engine.execute(CODE, false)?;
        assert!(result.status.is_terminal());
        assert_eq!(result.committed(), result.rollback.is_none());
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn failed_restore_is_reported_as_incomplete() -> Result<()> {
    let d = tempdir()?;
    fs::write(d.path().join("a.ts"), "a\n")?;
    let (registry, _) = registry(Script::ReplaceWithDirectory);
    let mut engine = TransactionEngine::new(d.path(), source(vec![occ("a.ts", 1)]), registry);

    let result = engine.execute(CODE, false)?;

    assert_eq!(result.status, TxStatus::RolledBack);
    assert!(result.rollback_incomplete());
    let rollback = result.rollback.as_ref().ok_or("missing rollback")?;
    assert_eq!(rollback.failed.len(), 1);
    assert_eq!(rollback.failed[0].path, "a.ts");
    assert!(matches!(
        result.error(),
        Some(FixError::RollbackPartial {
            failed: 1,
            attempted: 1
        })
    ));
    Ok(())
}
