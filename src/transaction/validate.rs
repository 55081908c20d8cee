//! Post-processing validation of a live transaction.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use super::backup::BackupResult;
use super::sanity::SanityChecks;
use crate::collector::DiagnosticSource;
use crate::error::CollectorFailure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// The file now carries a corruption signature it did not have before.
    Corruption {
        path: String,
        signatures: Vec<&'static str>,
    },
    Missing {
        path: String,
    },
    Unreadable {
        path: String,
        reason: String,
    },
    /// Strict mode only.
    Remaining {
        code: String,
        count: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corruption { path, signatures } => {
                write!(f, "{path}: corruption signature {}", signatures.join(", "))
            }
            Self::Missing { path } => write!(f, "{path}: backed-up file no longer exists"),
            Self::Unreadable { path, reason } => write!(f, "{path}: unreadable after fix ({reason})"),
            Self::Remaining { code, count } => {
                write!(f, "{count} occurrence(s) of {code} remain (strict mode)")
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Remaining occurrences of the target code; `None` when the re-count failed.
    pub remaining: Option<usize>,
    pub recount_failure: Option<CollectorFailure>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Everything validation needs besides the backups.
pub struct Validator<'a> {
    pub root: &'a Path,
    pub source: &'a dyn DiagnosticSource,
    pub checks: &'a SanityChecks,
    pub strict_remaining: bool,
}

impl Validator<'_> {
    /// Runs the three ordered checks: re-count, corruption scan, existence.
    #[must_use]
    pub fn run(&self, code: &str, backups: &BTreeMap<String, BackupResult>) -> ValidationReport {
        let mut report = ValidationReport::default();

        // (a) informational re-count
        let recount = self.source.collect();
        if recount.is_reliable() {
            let remaining = recount.count_for(code);
            report.remaining = Some(remaining);
            if self.strict_remaining && remaining > 0 {
                report.issues.push(ValidationIssue::Remaining {
                    code: code.to_string(),
                    count: remaining,
                });
            }
        } else {
            report.recount_failure = recount.failure;
        }

        // (b) corruption signatures
        let captured: Vec<(&String, &[u8])> = backups
            .iter()
            .filter_map(|(p, b)| b.snapshot().map(|s| (p, s.content.as_slice())))
            .collect();
        for (path, before) in &captured {
            let full = self.root.join(path);
            if !full.exists() {
                continue;
            }
            match fs::read(&full) {
                Ok(now) => {
                    if let Some(issue) = self.corruption(path, before, &now) {
                        report.issues.push(issue);
                    }
                }
                Err(e) => report.issues.push(ValidationIssue::Unreadable {
                    path: (*path).clone(),
                    reason: e.to_string(),
                }),
            }
        }

        // (c) existence
        for (path, _) in &captured {
            if !self.root.join(path).exists() {
                report.issues.push(ValidationIssue::Missing {
                    path: (*path).clone(),
                });
            }
        }

        report
    }

    fn corruption(&self, path: &str, before: &[u8], now: &[u8]) -> Option<ValidationIssue> {
        let now_text = String::from_utf8_lossy(now);
        let before_text = String::from_utf8_lossy(before);
        // Only matches beyond those the snapshot already had count against the fix.
        let introduced = self.checks.introduced(&before_text, &now_text);
        (!introduced.is_empty()).then(|| ValidationIssue::Corruption {
            path: path.to_string(),
            signatures: introduced,
        })
    }
}
