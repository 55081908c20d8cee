// src/transaction/backup.rs
//! In-memory file snapshots and their restoration.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::utils::{atomic_write, compute_sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub len: u64,
    pub readonly: bool,
    /// Modification time, Unix epoch seconds, if the platform reports one.
    pub modified: Option<u64>,
    pub sha256: String,
}

/// Exact prior bytes of one file. Write-only until rollback.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub content: Vec<u8>,
    pub captured_at: DateTime<Utc>,
    pub stats: FileStats,
}

/// Outcome of trying to back up one file.
#[derive(Debug, Clone)]
pub enum BackupResult {
    Captured(FileSnapshot),
    /// Not covered by rollback; the reason is surfaced to the user.
    Skipped { reason: String },
}

impl BackupResult {
    #[must_use]
    pub fn snapshot(&self) -> Option<&FileSnapshot> {
        match self {
            Self::Captured(snap) => Some(snap),
            Self::Skipped { .. } => None,
        }
    }
}

/// Reads the full content and metadata of `root/rel`.
#[must_use]
pub fn capture(root: &Path, rel: &str) -> BackupResult {
    let path = root.join(rel);
    let meta = match fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return BackupResult::Skipped {
                reason: "not a regular file".to_string(),
            }
        }
        Err(e) => return BackupResult::Skipped { reason: e.to_string() },
    };
    let content = match fs::read(&path) {
        Ok(c) => c,
        Err(e) => return BackupResult::Skipped { reason: e.to_string() },
    };

    let stats = FileStats {
        len: meta.len(),
        readonly: meta.permissions().readonly(),
        modified: meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs()),
        sha256: compute_sha256(&content),
    };

    BackupResult::Captured(FileSnapshot {
        content,
        captured_at: Utc::now(),
        stats,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreFailure {
    pub path: String,
    pub reason: String,
}

/// What a rollback actually achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackReport {
    pub restored: Vec<String>,
    pub failed: Vec<RestoreFailure>,
    /// Files that were skipped at backup time, so nothing could be restored.
    pub never_captured: Vec<String>,
    /// Dry runs write nothing, so their rollback touches nothing.
    pub dry_run: bool,
}

impl RollbackReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.restored.len() + self.failed.len()
    }
}

/// Writes every captured snapshot back and verifies the bytes by hash.
///
/// Failures are collected, never retried.
#[must_use]
pub fn restore_all(root: &Path, backups: &BTreeMap<String, BackupResult>) -> RollbackReport {
    let mut report = RollbackReport::default();
    for (rel, backup) in backups {
        match backup {
            BackupResult::Captured(snap) => match restore_one(root, rel, snap) {
                Ok(()) => report.restored.push(rel.clone()),
                Err(reason) => report.failed.push(RestoreFailure {
                    path: rel.clone(),
                    reason,
                }),
            },
            BackupResult::Skipped { .. } => report.never_captured.push(rel.clone()),
        }
    }
    report
}

fn restore_one(root: &Path, rel: &str, snap: &FileSnapshot) -> Result<(), String> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    atomic_write(&path, &snap.content).map_err(|e| format!("{e:#}"))?;

    let written = fs::read(&path).map_err(|e| e.to_string())?;
    let actual = compute_sha256(&written);
    if actual != snap.stats.sha256 {
        return Err(format!(
            "content mismatch after restore (expected {}, got {actual})",
            snap.stats.sha256
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn capture_records_bytes_and_stats() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.ts"), b"let a = 1;\r\n")?;
        let BackupResult::Captured(snap) = capture(dir.path(), "a.ts") else {
            anyhow::bail!("expected capture");
        };
        assert_eq!(snap.content, b"let a = 1;\r\n");
        assert_eq!(snap.stats.len, 12);
        assert_eq!(snap.stats.sha256, compute_sha256(b"let a = 1;\r\n"));
        Ok(())
    }

    #[test]
    fn missing_file_is_skipped_with_reason() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let result = capture(dir.path(), "nope.ts");
        assert!(matches!(result, BackupResult::Skipped { ref reason } if !reason.is_empty()));
        Ok(())
    }

    #[test]
    fn directories_are_skipped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("sub"))?;
        assert!(capture(dir.path(), "sub").snapshot().is_none());
        Ok(())
    }

    #[test]
    fn restore_brings_back_exact_bytes_and_recreates_deleted_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("src"))?;
        fs::write(dir.path().join("src/a.ts"), "original a")?;
        fs::write(dir.path().join("b.ts"), "original b")?;

        let mut backups = BTreeMap::new();
        backups.insert("src/a.ts".to_string(), capture(dir.path(), "src/a.ts"));
        backups.insert("b.ts".to_string(), capture(dir.path(), "b.ts"));
        backups.insert(
            "c.ts".to_string(),
            BackupResult::Skipped {
                reason: "permission denied".into(),
            },
        );

        fs::write(dir.path().join("src/a.ts"), "}}}}")?;
        fs::remove_file(dir.path().join("b.ts"))?;

        let report = restore_all(dir.path(), &backups);
        assert!(report.is_complete());
        assert_eq!(report.restored.len(), 2);
        assert_eq!(report.never_captured, vec!["c.ts".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("src/a.ts"))?, "original a");
        assert_eq!(fs::read_to_string(dir.path().join("b.ts"))?, "original b");
        Ok(())
    }

    #[test]
    fn restore_failure_is_reported_not_dropped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.ts"), "original")?;
        let mut backups = BTreeMap::new();
        backups.insert("a.ts".to_string(), capture(dir.path(), "a.ts"));

        // A non-empty directory now sits where the file was.
        fs::remove_file(dir.path().join("a.ts"))?;
        fs::create_dir(dir.path().join("a.ts"))?;
        fs::write(dir.path().join("a.ts/inner"), "x")?;

        let report = restore_all(dir.path(), &backups);
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "a.ts");
        assert_eq!(report.attempted(), 1);
        Ok(())
    }
}
