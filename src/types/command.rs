//! Captured output of one analysis-tool run.

use serde::Serialize;

use crate::error::CollectorFailure;

#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    command: String,
    /// -1 when the process was killed by a signal.
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl CommandResult {
    #[must_use]
    pub fn new(command: String, exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            command,
            exit_code,
            stdout,
            stderr,
        }
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr. Analysis tools disagree on which stream
    /// carries their diagnostics, so both are parsed.
    #[must_use]
    pub fn output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// First non-blank line of either stream, stdout first.
    #[must_use]
    pub fn headline(&self) -> Option<&str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }

    /// Whether this run must be read as a crash rather than as a clean result.
    ///
    /// A non-zero exit that printed something, none of it a diagnostic, means
    /// the tool never got as far as checking the code.
    #[must_use]
    pub fn crashed(&self, diagnostics_found: usize) -> bool {
        !self.passed() && diagnostics_found == 0 && self.headline().is_some()
    }

    #[must_use]
    pub fn crash(&self) -> CollectorFailure {
        CollectorFailure::Crashed {
            command: self.command.clone(),
            exit_code: self.exit_code,
            output: self.headline().unwrap_or_default().to_string(),
        }
    }
}
