//! Diagnostic collection from the external analysis collaborator.
//!
//! The collaborator is any command whose output contains lines shaped like
//! `<path>(<line>,<col>): error <CODE>: <message>`. Everything else it prints
//! is ignored.

mod parser;
mod runner;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::types::{CommandResult, DiagnosticSet};

pub use parser::{parse_line, parse_output};
pub use runner::run_with_timeout;

/// Anything that can produce a fresh set of diagnostics.
pub trait DiagnosticSource {
    /// Runs one collection. Never errors: failures come back flagged in the set.
    fn collect(&self) -> DiagnosticSet;
}

/// Production source: runs the configured analysis command.
#[derive(Debug, Clone)]
pub struct CommandCollector {
    command: String,
    root: PathBuf,
    timeout: Duration,
}

impl CommandCollector {
    #[must_use]
    pub fn new(command: impl Into<String>, root: &Path, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            root: root.to_path_buf(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self::new(&config.collector.command, root, config.collector_timeout())
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl DiagnosticSource for CommandCollector {
    fn collect(&self) -> DiagnosticSet {
        match run_with_timeout(&self.command, &self.root, self.timeout) {
            Ok(result) => interpret(&result),
            Err(failure) => DiagnosticSet::failed(failure),
        }
    }
}

/// Turns raw command output into a diagnostic set.
///
/// Analysis tools exit non-zero when they find errors, so the exit status
/// alone decides nothing. A non-zero exit that printed something on either
/// stream, none of it a parsable diagnostic, is treated as a crash.
#[must_use]
pub fn interpret(result: &CommandResult) -> DiagnosticSet {
    let occurrences = parse_output(&result.output());
    if result.crashed(occurrences.len()) {
        return DiagnosticSet::failed(result.crash());
    }
    DiagnosticSet::new(occurrences)
}

/// A fixed, in-memory source. Useful for replaying a captured run.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    set: DiagnosticSet,
}

impl StaticSource {
    #[must_use]
    pub fn new(set: DiagnosticSet) -> Self {
        Self { set }
    }

    /// Builds a source from raw collaborator output.
    #[must_use]
    pub fn from_output(output: &str) -> Self {
        Self::new(DiagnosticSet::new(parse_output(output)))
    }
}

impl DiagnosticSource for StaticSource {
    fn collect(&self) -> DiagnosticSet {
        self.set.clone()
    }
}
