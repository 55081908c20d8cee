//! Transaction lifecycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::backup::BackupResult;
use crate::error::{FixError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Created,
    BackingUp,
    Processing,
    Validating,
    Committed,
    RolledBack,
}

impl TxStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    /// Whether `self -> next` is an edge of the state machine.
    ///
    /// Dry runs commit straight from `Processing`; a collector failure while
    /// backing up ends the transaction before the processor is invoked.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::BackingUp)
                | (Self::BackingUp, Self::Processing | Self::RolledBack)
                | (Self::Processing, Self::Validating | Self::Committed | Self::RolledBack)
                | (Self::Validating, Self::Committed | Self::RolledBack)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::BackingUp => "BACKING_UP",
            Self::Processing => "PROCESSING",
            Self::Validating => "VALIDATING",
            Self::Committed => "COMMITTED",
            Self::RolledBack => "ROLLED_BACK",
        };
        f.write_str(s)
    }
}

/// One in-flight transaction. Owns its backups until it reaches a terminal state.
#[derive(Debug)]
pub struct Transaction {
    pub id: String,
    pub code: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    status: TxStatus,
    backups: BTreeMap<String, BackupResult>,
}

impl Transaction {
    #[must_use]
    pub fn new(id: String, code: &str, dry_run: bool) -> Self {
        Self {
            id,
            code: code.to_string(),
            dry_run,
            started_at: Utc::now(),
            status: TxStatus::Created,
            backups: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Moves to `next`.
    ///
    /// # Errors
    /// Returns `FixError::IllegalTransition` if the edge does not exist.
    pub fn advance(&mut self, next: TxStatus) -> Result<()> {
        if !self.status.can_advance_to(next) {
            return Err(FixError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Records the backup outcome for `path`. Only legal while backing up.
    ///
    /// # Errors
    /// Returns `FixError::IllegalTransition` outside `BackingUp`.
    pub fn record_backup(&mut self, path: String, result: BackupResult) -> Result<()> {
        if self.status != TxStatus::BackingUp {
            return Err(FixError::IllegalTransition {
                from: self.status,
                to: TxStatus::BackingUp,
            });
        }
        self.backups.insert(path, result);
        Ok(())
    }

    #[must_use]
    pub fn backups(&self) -> &BTreeMap<String, BackupResult> {
        &self.backups
    }

    /// Releases the backup map. Called once the transaction is terminal.
    pub fn discard_backups(&mut self) {
        self.backups.clear();
    }
}
