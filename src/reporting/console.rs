// src/reporting/console.rs
//! Human-facing output for collection, planning and fix runs.

use colored::Colorize;

use super::shared::pluralize;
use crate::batch::BatchReport;
use crate::processors::{ProcessorRegistry, Recommendation, Tier};
use crate::transaction::{TransactionResult, TxStatus};
use crate::types::DiagnosticSet;

/// Maximum number of intended changes listed per dry run.
const CHANGE_PREVIEW: usize = 20;

pub fn print_diagnostics(set: &DiagnosticSet) {
    if let Some(failure) = &set.failure {
        eprintln!("{} diagnostics unknown: {failure}", "[WARN]".yellow());
        return;
    }
    if set.total() == 0 {
        println!("{}", "[OK] No diagnostics reported.".green().bold());
        return;
    }

    println!(
        "{} {} across {} {}",
        set.total().to_string().red().bold(),
        pluralize("diagnostic", set.total()),
        set.by_file().len(),
        pluralize("file", set.by_file().len())
    );
    let mut by_code: Vec<(String, usize)> = set.by_code().into_iter().collect();
    by_code.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (code, count) in by_code {
        println!("   {:<10} {count:>6}", code.yellow());
    }
}

pub fn print_plan(recs: &[Recommendation]) {
    if recs.is_empty() {
        println!("{}", "[OK] Nothing to fix.".green().bold());
        return;
    }
    let mut current: Option<Tier> = None;
    for rec in recs {
        if current != Some(rec.tier) {
            current = Some(rec.tier);
            println!("\n{}", tier_heading(rec.tier));
        }
        let what = rec
            .processor
            .as_deref()
            .unwrap_or("no processor registered; fix by hand");
        println!("   {:<10} {:>6}  {}", rec.code.yellow(), rec.count, what.dimmed());
    }

    let automatable: Vec<&str> = recs
        .iter()
        .filter(|r| r.tier != Tier::Manual)
        .map(|r| r.code.as_str())
        .collect();
    if !automatable.is_empty() {
        println!(
            "\nPreview with {}",
            format!("atomfix batch {}", automatable.join(" ")).yellow()
        );
    }
}

fn tier_heading(tier: Tier) -> colored::ColoredString {
    let label = tier.label().to_uppercase();
    match tier {
        Tier::Critical => label.red().bold(),
        Tier::High => label.red(),
        Tier::Medium => label.yellow(),
        Tier::Low => label.normal(),
        Tier::Manual => label.dimmed(),
    }
}

pub fn print_processors(registry: &ProcessorRegistry) {
    for code in registry.codes() {
        let description = registry
            .create(code)
            .map(|p| p.description().to_string())
            .unwrap_or_default();
        println!("   {:<10} {description}", code.yellow());
    }
}

pub fn print_transaction(result: &TransactionResult) {
    let mode = if result.dry_run { " (dry run)" } else { "" };
    match result.status {
        TxStatus::Committed => {
            println!(
                "{} {}{mode}: {} {} fixed in {} {}",
                "[OK]".green().bold(),
                result.code,
                result.errors_fixed,
                pluralize("error", result.errors_fixed),
                result.files_processed,
                pluralize("file", result.files_processed)
            );
            if result.dry_run {
                print_changes(result);
            }
            if let Some(remaining) = result.remaining_errors {
                println!("   {remaining} remaining");
            }
        }
        _ => print_rollback(result, mode),
    }
    for skipped in &result.backups_skipped {
        eprintln!(
            "   {} {} not processed: {}",
            "!".yellow(),
            skipped.path,
            skipped.reason
        );
    }
}

fn print_changes(result: &TransactionResult) {
    for change in result.changes.iter().take(CHANGE_PREVIEW) {
        println!("   {} {}:{}", "~".cyan(), change.file, change.line);
        println!("     {} {}", "-".red(), change.before.trim_end());
        println!("     {} {}", "+".green(), change.after.trim_end());
    }
    if result.changes.len() > CHANGE_PREVIEW {
        println!("   ... {} more", result.changes.len() - CHANGE_PREVIEW);
    }
}

fn print_rollback(result: &TransactionResult, mode: &str) {
    let component = result
        .failure
        .as_ref()
        .map_or_else(|| "unknown".to_string(), |f| f.component.to_string());
    println!(
        "{} {}{mode}: rolled back ({component} failed)",
        "[X]".red().bold(),
        result.code
    );

    let Some(rollback) = &result.rollback else {
        return;
    };
    if rollback.is_complete() {
        if let Some(err) = result.error() {
            println!("   {err}");
        }
    }
    if rollback.dry_run {
        println!("   nothing was written");
    } else if rollback.is_complete() {
        println!(
            "   {} {} {} restored",
            "✓".green(),
            rollback.restored.len(),
            pluralize("file", rollback.restored.len())
        );
    } else {
        let err = result.error().map(|e| e.to_string()).unwrap_or_default();
        eprintln!("   {} {err}; manual attention required", "[CRITICAL]".red().bold());
        for failure in &rollback.failed {
            eprintln!("     {} {}: {}", "-".red(), failure.path, failure.reason);
        }
    }
}

pub fn print_batch(report: &BatchReport) {
    for result in &report.results {
        print_transaction(result);
    }

    let s = &report.summary;
    let mode = if s.dry_run { " (dry run)" } else { "" };
    println!();
    let headline = format!(
        "Batch{mode}: {} succeeded, {} failed of {} {}",
        s.succeeded,
        s.failed,
        s.processors,
        pluralize("processor", s.processors)
    );
    if s.failed == 0 {
        println!("{}", headline.green().bold());
    } else {
        println!("{}", headline.red().bold());
    }
    println!(
        "   {} {} fixed in {} {}, {} {} taken",
        s.total_errors_fixed,
        pluralize("error", s.total_errors_fixed),
        s.total_files_processed,
        pluralize("file", s.total_files_processed),
        s.total_backups,
        pluralize("backup", s.total_backups)
    );
    if !s.unsupported.is_empty() {
        println!("   unsupported: {}", s.unsupported.join(", ").yellow());
    }
    if !s.skipped.is_empty() {
        println!("   not run (stopped on failure): {}", s.skipped.join(", ").yellow());
    }
    if s.dry_run && s.succeeded > 0 {
        println!("\nRun again with {} to apply.", "--confirm".yellow());
    }
}
