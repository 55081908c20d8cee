// src/metrics/store.rs
//! Dated snapshot documents on disk.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::snapshot::MetricsSnapshot;
use crate::error::{FixError, Result};
use crate::utils::atomic_write;

pub const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Reads and writes `metrics-YYYY-MM-DD.json` documents plus `latest.json`.
///
/// Never touches source files.
#[derive(Debug, Clone)]
pub struct MetricsStore {
    dir: PathBuf,
}

impl MetricsStore {
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("metrics-{date}.json"))
    }

    /// Persists `snapshot` under its date and overwrites `latest.json`.
    /// A second capture on the same day replaces that day's document.
    ///
    /// # Errors
    /// Returns error if the directory or either document cannot be written.
    pub fn save(&self, snapshot: &MetricsSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| FixError::io(e, &self.dir))?;
        let json = serde_json::to_string_pretty(snapshot)?;

        let dated = self.path_for(&snapshot.date());
        write_doc(&dated, &json)?;
        write_doc(&self.dir.join(LATEST_FILE), &json)?;
        Ok(dated)
    }

    /// Loads the snapshot for `date` (`YYYY-MM-DD`).
    ///
    /// # Errors
    /// Returns `FixError::SnapshotNotFound` if no document exists for that day.
    pub fn load(&self, date: &str) -> Result<MetricsSnapshot> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(FixError::Config(format!(
                "'{date}' is not a date (expected YYYY-MM-DD)"
            )));
        }
        let path = self.path_for(date);
        if !path.exists() {
            return Err(FixError::SnapshotNotFound(date.to_string()));
        }
        read_doc(&path)
    }

    /// Loads `latest.json`, if any capture was ever recorded.
    ///
    /// # Errors
    /// Returns error if the document exists but is unreadable.
    pub fn latest(&self) -> Result<Option<MetricsSnapshot>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_doc(&path).map(Some)
    }

    /// Dates with a stored snapshot, oldest first.
    ///
    /// # Errors
    /// Returns error if the directory exists but cannot be listed.
    pub fn list_dates(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| FixError::io(e, &self.dir))?;
        let mut dates = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| FixError::io(e, &self.dir))?;
            let name = entry.file_name();
            if let Some(date) = date_of(&name.to_string_lossy()) {
                dates.insert(date);
            }
        }
        Ok(dates.into_iter().collect())
    }

    /// Every stored snapshot, oldest first.
    ///
    /// # Errors
    /// Returns error if any dated document is unreadable.
    pub fn load_all(&self) -> Result<Vec<MetricsSnapshot>> {
        self.list_dates()?
            .iter()
            .map(|d| read_doc(&self.path_for(d)))
            .collect()
    }

    /// Renders all snapshots as one table.
    ///
    /// # Errors
    /// Returns error if a snapshot cannot be read or serialized.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let snapshots = self.load_all()?;
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&snapshots)?),
            ExportFormat::Csv => Ok(to_csv(&snapshots)),
        }
    }
}

fn to_csv(snapshots: &[MetricsSnapshot]) -> String {
    let codes: BTreeSet<&str> = snapshots
        .iter()
        .flat_map(|s| s.errors_by_type.keys().map(String::as_str))
        .collect();

    let mut out = String::from("date,total_errors,error_types");
    for code in &codes {
        out.push(',');
        out.push_str(code);
    }
    out.push('\n');

    for snap in snapshots {
        let _ = write!(out, "{},{},{}", snap.date(), snap.total_errors, snap.error_types);
        for code in &codes {
            let _ = write!(out, ",{}", snap.count_for(code));
        }
        out.push('\n');
    }
    out
}

#[allow(clippy::unwrap_used)]
fn date_of(file_name: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^metrics-(\d{4}-\d{2}-\d{2})\.json$").unwrap());
    re.captures(file_name).map(|c| c[1].to_string())
}

fn write_doc(path: &Path, json: &str) -> Result<()> {
    atomic_write(path, json.as_bytes())
        .map_err(|e| FixError::Config(format!("cannot write {}: {e:#}", path.display())))
}

fn read_doc(path: &Path) -> Result<MetricsSnapshot> {
    let content = fs::read_to_string(path).map_err(|e| FixError::io(e, path))?;
    Ok(serde_json::from_str(&content)?)
}
