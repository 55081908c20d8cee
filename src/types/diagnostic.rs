//! Diagnostic occurrences reported by the external analysis collaborator.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CollectorFailure;

/// One reported issue. Regenerated on every collector run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticOccurrence {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
    pub code: String,
    pub message: String,
}

/// Result of one collector run.
///
/// An empty set is only meaningful when `failure` is `None`; a failed run
/// carries zero occurrences and must be read as "unknown", not "clean".
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticSet {
    pub occurrences: Vec<DiagnosticOccurrence>,
    pub failure: Option<CollectorFailure>,
}

impl DiagnosticSet {
    #[must_use]
    pub fn new(occurrences: Vec<DiagnosticOccurrence>) -> Self {
        Self {
            occurrences,
            failure: None,
        }
    }

    #[must_use]
    pub fn failed(failure: CollectorFailure) -> Self {
        Self {
            occurrences: Vec::new(),
            failure: Some(failure),
        }
    }

    /// Whether the counts can be trusted.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.failure.is_none()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.occurrences.len()
    }

    #[must_use]
    pub fn by_code(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for occ in &self.occurrences {
            *counts.entry(occ.code.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn by_file(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for occ in &self.occurrences {
            *counts.entry(occ.file_path.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn count_for(&self, code: &str) -> usize {
        self.occurrences.iter().filter(|o| o.code == code).count()
    }

    /// Distinct files holding at least one occurrence of `code`, sorted.
    #[must_use]
    pub fn files_for(&self, code: &str) -> Vec<String> {
        self.occurrences
            .iter()
            .filter(|o| o.code == code)
            .map(|o| o.file_path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn occurrences_for(&self, code: &str) -> Vec<DiagnosticOccurrence> {
        self.occurrences
            .iter()
            .filter(|o| o.code == code)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(file: &str, line: usize, code: &str) -> DiagnosticOccurrence {
        DiagnosticOccurrence {
            file_path: file.into(),
            line,
            column: 1,
            code: code.into(),
            message: String::new(),
        }
    }

    #[test]
    fn groups_by_code_and_file() {
        let set = DiagnosticSet::new(vec![
            occ("a.ts", 1, "D1005"),
            occ("a.ts", 2, "D1005"),
            occ("b.ts", 3, "D2339"),
        ]);
        assert_eq!(set.by_code().get("D1005"), Some(&2));
        assert_eq!(set.by_file().get("a.ts"), Some(&2));
        assert_eq!(set.files_for("D1005"), vec!["a.ts".to_string()]);
        assert_eq!(set.count_for("D2339"), 1);
        assert!(set.is_reliable());
    }

    #[test]
    fn failed_set_is_not_reliable_even_though_empty() {
        let set = DiagnosticSet::failed(CollectorFailure::Timeout {
            command: "tsc".into(),
            seconds: 1,
        });
        assert_eq!(set.total(), 0);
        assert!(!set.is_reliable());
    }
}
