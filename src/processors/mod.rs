//! Fix processors: one stateless unit per diagnostic code.

pub mod builtin;
mod edit;
mod registry;

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::types::DiagnosticOccurrence;

pub use edit::{apply_line_fix, LineFix};
pub use registry::{ProcessorFactory, ProcessorRegistry, Recommendation, Tier};

/// What a processor is allowed to see: the project root and the current
/// occurrences of its own code. It must not touch files outside that set.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    pub root: &'a Path,
    pub occurrences: &'a [DiagnosticOccurrence],
}

impl<'a> ProcessContext<'a> {
    #[must_use]
    pub fn new(root: &'a Path, occurrences: &'a [DiagnosticOccurrence]) -> Self {
        Self { root, occurrences }
    }
}

/// A single intended (dry run) or performed (live) line edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    pub file: String,
    pub line: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub files_processed: usize,
    pub errors_fixed: usize,
    pub changes: Vec<LineChange>,
}

pub trait FixProcessor {
    /// The diagnostic code this processor resolves.
    fn code(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Resolves occurrences in `ctx`.
    ///
    /// With `dry_run` set, reports intended changes without touching disk.
    /// Live runs must write each file all-or-nothing.
    ///
    /// # Errors
    /// Returns error if a target file cannot be read or written.
    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> Result<ProcessOutcome>;
}
