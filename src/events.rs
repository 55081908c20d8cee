// src/events.rs
//! Machine-readable event logging for audit trails.
//!
//! Events are appended to `.atomfix/events.jsonl` under the project root.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CollectorFailed {
        reason: String,
    },
    TransactionStarted {
        id: String,
        code: String,
        dry_run: bool,
    },
    BackupSkipped {
        id: String,
        path: String,
        reason: String,
    },
    TransactionCommitted {
        id: String,
        code: String,
        files_processed: usize,
        errors_fixed: usize,
    },
    TransactionRolledBack {
        id: String,
        code: String,
        component: String,
        condition: String,
        restored: usize,
        restore_failed: usize,
    },
    RestoreFailed {
        id: String,
        path: String,
        reason: String,
    },
    BatchStarted {
        codes: Vec<String>,
        dry_run: bool,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
        total_errors_fixed: usize,
    },
    GateEvaluated {
        passed: bool,
        current_errors: usize,
        critical_errors: usize,
    },
    SnapshotRecorded {
        date: String,
        total_errors: usize,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AtomfixEvent {
    pub timestamp: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct EventLogger {
    log_path: Option<PathBuf>,
}

impl EventLogger {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        let log_path = root.join(".atomfix").join("events.jsonl");
        Self {
            log_path: Some(log_path),
        }
    }

    /// A logger that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { log_path: None }
    }

    pub fn log(&self, kind: EventKind) {
        // Best-effort: an unwritable audit log never aborts the pipeline.
        let Some(path) = &self.log_path else {
            return;
        };
        if let Ok(json) = Self::serialize_event(kind) {
            let _ = Self::append_to_file(path, &json);
        }
    }

    fn serialize_event(kind: EventKind) -> Result<String> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let event = AtomfixEvent { timestamp, kind };
        Ok(serde_json::to_string(&event)?)
    }

    fn append_to_file(path: &Path, line: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
