// src/exit.rs
//! Standardized process exit codes for `atomfix`.
//!
//! Provides a stable contract for scripts, hooks and CI pipelines.

use std::process::Termination;

use crate::batch::BatchReport;
use crate::gate::{GateMode, GateVerdict};
use crate::transaction::{Component, TransactionResult, TxStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AtomfixExit {
    /// Operation completed successfully.
    Success = 0,
    /// Generic error (e.g. IO, config).
    Error = 1,
    /// Input rejected (unknown code, live run refused, bad arguments).
    InvalidInput = 2,
    /// The analysis collaborator failed or timed out; results are unknown.
    CollectorFailure = 3,
    /// A transaction was rolled back and every file was restored.
    RolledBack = 4,
    /// A rollback could not restore every file. Manual attention required.
    RollbackIncomplete = 5,
    /// An enforced quality gate failed.
    GateFailed = 6,
}

impl AtomfixExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a single transaction result to its exit status.
    #[must_use]
    pub fn from_transaction(result: &TransactionResult) -> Self {
        match result.status {
            TxStatus::Committed => Self::Success,
            _ if result.rollback_incomplete() => Self::RollbackIncomplete,
            _ if result
                .failure
                .as_ref()
                .is_some_and(|f| f.component == Component::Collector) =>
            {
                Self::CollectorFailure
            }
            _ => Self::RolledBack,
        }
    }

    /// Maps a batch report to its exit status. The worst outcome wins.
    #[must_use]
    pub fn from_batch(report: &BatchReport) -> Self {
        if report.results.iter().any(TransactionResult::rollback_incomplete) {
            Self::RollbackIncomplete
        } else if report.summary.failed > 0 {
            Self::RolledBack
        } else {
            Self::Success
        }
    }

    /// Maps a verdict to an exit status. Advisory gates never fail the process.
    #[must_use]
    pub fn from_gate(verdict: &GateVerdict, mode: GateMode) -> Self {
        if verdict.passed || mode == GateMode::Advisory {
            Self::Success
        } else {
            Self::GateFailed
        }
    }
}

impl Termination for AtomfixExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateThresholds;

    fn verdict(passed: bool) -> GateVerdict {
        GateVerdict {
            passed,
            current_errors: 0,
            critical_errors: 0,
            thresholds: GateThresholds::default(),
            recommendations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AtomfixExit::Success.code(), 0);
        assert_eq!(AtomfixExit::InvalidInput.code(), 2);
        assert_eq!(AtomfixExit::CollectorFailure.code(), 3);
        assert_eq!(AtomfixExit::RollbackIncomplete.code(), 5);
        assert_eq!(AtomfixExit::GateFailed.code(), 6);
    }

    #[test]
    fn only_enforced_failing_gates_fail() {
        assert_eq!(AtomfixExit::from_gate(&verdict(false), GateMode::Enforce), AtomfixExit::GateFailed);
        assert_eq!(AtomfixExit::from_gate(&verdict(false), GateMode::Advisory), AtomfixExit::Success);
        assert_eq!(AtomfixExit::from_gate(&verdict(true), GateMode::Enforce), AtomfixExit::Success);
    }
}
