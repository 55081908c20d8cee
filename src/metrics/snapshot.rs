use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::DiagnosticSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCount {
    pub code: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCount {
    pub file: String,
    pub count: usize,
}

/// Point-in-time error metrics. One per day is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_errors: usize,
    /// Number of distinct codes.
    pub error_types: usize,
    pub errors_by_type: BTreeMap<String, usize>,
    #[serde(default)]
    pub errors_by_file: BTreeMap<String, usize>,
    #[serde(default)]
    pub top_errors: Vec<CodeCount>,
    #[serde(default)]
    pub top_files: Vec<FileCount>,
}

impl MetricsSnapshot {
    /// Summarizes a reliable diagnostic set taken at `timestamp`.
    #[must_use]
    pub fn from_diagnostics(set: &DiagnosticSet, timestamp: DateTime<Utc>, top_n: usize) -> Self {
        Self::from_counts(set.by_code(), set.by_file(), timestamp, top_n)
    }

    #[must_use]
    pub fn from_counts(
        errors_by_type: BTreeMap<String, usize>,
        errors_by_file: BTreeMap<String, usize>,
        timestamp: DateTime<Utc>,
        top_n: usize,
    ) -> Self {
        let top_errors = top(&errors_by_type, top_n)
            .into_iter()
            .map(|(code, count)| CodeCount { code, count })
            .collect();
        let top_files = top(&errors_by_file, top_n)
            .into_iter()
            .map(|(file, count)| FileCount { file, count })
            .collect();
        Self {
            timestamp,
            total_errors: errors_by_type.values().sum(),
            error_types: errors_by_type.len(),
            errors_by_type,
            errors_by_file,
            top_errors,
            top_files,
        }
    }

    /// Calendar day (UTC) the snapshot belongs to, `YYYY-MM-DD`.
    #[must_use]
    pub fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    #[must_use]
    pub fn count_for(&self, code: &str) -> usize {
        self.errors_by_type.get(code).copied().unwrap_or(0)
    }
}

/// Highest counts first, ties by key.
fn top(map: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}
