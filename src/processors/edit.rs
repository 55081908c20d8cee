// src/processors/edit.rs
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use super::{LineChange, ProcessContext, ProcessOutcome};
use crate::utils::atomic_write;

/// Rewrites one line given the line that follows it. `None` means "leave as is".
pub type LineFix = fn(line: &str, next: Option<&str>) -> Option<String>;

/// Applies `fix` to every line reported in `ctx`, file by file.
///
/// Line endings are preserved. A file is written once, after all of its
/// lines are fixed, and only if something changed.
///
/// # Errors
/// Returns error if a target file cannot be read or written.
pub fn apply_line_fix(ctx: &ProcessContext<'_>, dry_run: bool, fix: LineFix) -> Result<ProcessOutcome> {
    let mut targets: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for occ in ctx.occurrences {
        targets.entry(occ.file_path.as_str()).or_default().insert(occ.line);
    }

    let mut outcome = ProcessOutcome::default();
    for (file, lines) in targets {
        let changes = fix_file(ctx, file, &lines, dry_run, fix)?;
        if !changes.is_empty() {
            outcome.files_processed += 1;
            outcome.errors_fixed += changes.len();
            outcome.changes.extend(changes);
        }
    }
    Ok(outcome)
}

fn fix_file(
    ctx: &ProcessContext<'_>,
    file: &str,
    lines: &BTreeSet<usize>,
    dry_run: bool,
    fix: LineFix,
) -> Result<Vec<LineChange>> {
    let path = ctx.root.join(file);
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut parts: Vec<(String, &str)> = content.split_inclusive('\n').map(split_eol).collect();
    let mut changes = Vec::new();

    for &line_no in lines {
        let Some(idx) = line_no.checked_sub(1).filter(|i| *i < parts.len()) else {
            continue;
        };
        let next = parts.get(idx + 1).map(|(body, _)| body.as_str());
        let Some(fixed) = fix(&parts[idx].0, next) else {
            continue;
        };
        if fixed == parts[idx].0 {
            continue;
        }
        changes.push(LineChange {
            file: file.to_string(),
            line: line_no,
            before: parts[idx].0.clone(),
            after: fixed.clone(),
        });
        parts[idx].0 = fixed;
    }

    if !changes.is_empty() && !dry_run {
        let rebuilt: String = parts.iter().map(|(body, eol)| format!("{body}{eol}")).collect();
        atomic_write(&path, rebuilt.as_bytes())?;
    }
    Ok(changes)
}

fn split_eol(raw: &str) -> (String, &str) {
    let body_len = raw.trim_end_matches(['\n', '\r']).len();
    (raw[..body_len].to_string(), &raw[body_len..])
}
