// src/reporting/metrics.rs
use colored::Colorize;

use crate::gate::{GateMode, GateVerdict};
use crate::metrics::{MetricsSnapshot, SnapshotDiff, TrendReport};

pub fn print_gate(verdict: &GateVerdict, mode: GateMode) {
    let t = &verdict.thresholds;
    println!(
        "Errors: {} / {}   Critical: {} / {}",
        verdict.current_errors, t.max_total_errors, verdict.critical_errors, t.max_critical_errors
    );
    for warning in &verdict.warnings {
        println!("{} {warning}", "[WARN]".yellow());
    }
    if verdict.passed {
        println!("{}", "[OK] Quality gate passed.".green().bold());
        return;
    }

    let label = match mode {
        GateMode::Enforce => "[X] Quality gate FAILED.".red().bold(),
        GateMode::Advisory => "[WARN] Quality gate failed (advisory).".yellow().bold(),
    };
    println!("{label}");
    for rec in &verdict.recommendations {
        println!("   {} {rec}", "->".blue());
    }
}

pub fn print_snapshot_saved(snapshot: &MetricsSnapshot, path: &std::path::Path) {
    println!(
        "{} recorded {} errors ({} types) to {}",
        "[OK]".green().bold(),
        snapshot.total_errors,
        snapshot.error_types,
        path.display()
    );
}

pub fn print_trend(report: &TrendReport) {
    if report.is_empty() {
        println!("No snapshots in the last {} days.", report.days);
        return;
    }
    for bar in &report.bars {
        println!(
            "{}  {:<40} {}",
            bar.date,
            "█".repeat(bar.width).cyan(),
            bar.total
        );
    }
    println!();
    if let (Some(first), Some(last)) = (&report.first, &report.last) {
        println!("{} {} -> {} {}", first.date, first.total, last.date, last.total);
    }
    let delta = format!("{:+}", report.delta);
    let delta = if report.delta <= 0 { delta.green() } else { delta.red() };
    println!("Change: {delta}   Per day: {:+.1}", report.daily_average);
}

pub fn print_diff(diff: &SnapshotDiff) {
    println!(
        "{} ({}) -> {} ({})",
        diff.from.date, diff.from.total, diff.to.date, diff.to.total
    );
    let reduction = diff.reduction.to_string();
    if diff.reduction >= 0 {
        println!("Reduction: {}", reduction.green().bold());
    } else {
        println!("Reduction: {}", reduction.red().bold());
    }
    for delta in &diff.per_code {
        let shown = format!("{:+}", delta.delta);
        let shown = match delta.delta {
            d if d < 0 => shown.green(),
            0 => shown.normal(),
            _ => shown.red(),
        };
        println!(
            "   {:<10} {:>6} -> {:<6} {shown}",
            delta.code.yellow(),
            delta.from,
            delta.to
        );
    }
}
