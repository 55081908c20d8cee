// src/config/mod.rs
pub mod types;

pub use self::types::{
    AtomfixToml, BatchConfig, BranchProtection, CollectorConfig, Config, ErrorThresholds,
    MetricsConfig, QualityConfig, ValidationConfig,
};

use crate::error::{FixError, Result};
use crate::gate::GateThresholds;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "atomfix.toml";
pub const QUALITY_FILE: &str = "quality-gates.json";

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `atomfix.toml` from `root`. A missing file yields defaults.
    /// A `quality-gates.json` beside it replaces the `[quality]` table.
    ///
    /// # Errors
    /// Returns error if either file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_in(root, &root.join(CONFIG_FILE))
    }

    /// Loads the TOML file at `path`, then applies `root`'s `quality-gates.json`.
    ///
    /// # Errors
    /// Returns error if either file exists but cannot be read or parsed.
    pub fn load_in(root: &Path, path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        let quality = root.join(QUALITY_FILE);
        if quality.exists() {
            config.quality = QualityConfig::from_json_file(&quality)?;
            config.validate()?;
        }
        Ok(config)
    }

    /// Loads a config file from an explicit path. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).map_err(|e| FixError::io(e, path))?;
        let mut config = Self::new();
        config.parse_toml(&content)?;
        Ok(config)
    }

    /// Applies a TOML document on top of defaults.
    ///
    /// # Errors
    /// Returns `FixError::Config` on malformed TOML.
    pub fn parse_toml(&mut self, content: &str) -> Result<()> {
        let parsed: AtomfixToml = toml::from_str(content)?;
        self.collector = parsed.collector;
        self.batch = parsed.batch;
        self.validation = parsed.validation;
        self.metrics = parsed.metrics;
        self.quality = parsed.quality;
        self.validate()
    }

    /// Validates configuration values.
    ///
    /// # Errors
    /// Returns `FixError::Config` if a value is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.collector.command.trim().is_empty() {
            return Err(FixError::Config("collector.command is empty".into()));
        }
        if self.collector.timeout_secs == 0 {
            return Err(FixError::Config("collector.timeout_secs must be > 0".into()));
        }
        let t = &self.quality.error_thresholds;
        if t.critical > t.total {
            return Err(FixError::Config(format!(
                "errorThresholds.critical ({}) exceeds errorThresholds.total ({})",
                t.critical, t.total
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector.timeout_secs)
    }

    #[must_use]
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch.pause_ms)
    }

    #[must_use]
    pub fn metrics_dir(&self, root: &Path) -> PathBuf {
        let dir = PathBuf::from(&self.metrics.dir);
        if dir.is_absolute() {
            dir
        } else {
            root.join(dir)
        }
    }

    #[must_use]
    pub fn gate_thresholds(&self) -> GateThresholds {
        GateThresholds::from_quality(&self.quality)
    }
}

impl QualityConfig {
    /// Reads a standalone JSON threshold document.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| FixError::io(e, path))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.collector.timeout_secs, 120);
        assert_eq!(config.quality.error_thresholds.total, 1000);
        assert!(config.quality.auto_fix_enabled);
        assert!(!config.validation.fail_on_remaining);
        Ok(())
    }

    #[test]
    fn parses_quality_table_in_camel_case() -> Result<()> {
        let mut config = Config::new();
        config.parse_toml(
            r#"
[collector]
command = "yarn tsc --noEmit"
timeout_secs = 30

[batch]
stop_on_failure = true
pause_ms = 250

[quality]
autoFixEnabled = false
criticalCodes = ["D1005"]

[quality.errorThresholds]
critical = 5
high = 50
total = 100

[quality.branchProtection]
requireGate = true
"#,
        )?;
        assert_eq!(config.collector.command, "yarn tsc --noEmit");
        assert!(config.batch.stop_on_failure);
        assert_eq!(config.batch_pause(), Duration::from_millis(250));
        assert!(!config.quality.auto_fix_enabled);
        assert!(config.quality.branch_protection.require_gate);
        assert_eq!(config.quality.error_thresholds.critical, 5);
        assert_eq!(config.quality.critical_codes, vec!["D1005".to_string()]);
        Ok(())
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let mut config = Config::new();
        let err = config.parse_toml("[collector\ncommand=").err();
        assert!(matches!(err, Some(FixError::Config(_))));
    }

    #[test]
    fn critical_above_total_is_rejected() {
        let mut config = Config::new();
        let err = config
            .parse_toml("[quality.errorThresholds]\ncritical = 10\ntotal = 5\n")
            .err();
        assert!(matches!(err, Some(FixError::Config(_))));
    }

    #[test]
    fn reads_json_threshold_document() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("quality-gates.json");
        fs::write(
            &path,
            r#"{"errorThresholds":{"critical":0,"high":10,"total":25},"autoFixEnabled":true,"branchProtection":{"requireGate":false,"protectedBranches":["main"]}}"#,
        )?;
        let quality = QualityConfig::from_json_file(&path)?;
        assert_eq!(quality.error_thresholds.total, 25);
        assert_eq!(quality.branch_protection.protected_branches, vec!["main"]);
        assert_eq!(quality.critical_codes.len(), 3);

        let config = Config::load(dir.path())?;
        assert_eq!(config.quality.error_thresholds.total, 25);

        let elsewhere = tempfile::TempDir::new()?;
        let custom = elsewhere.path().join("ci.toml");
        fs::write(&custom, "[collector]\ntimeout_secs = 30\n")?;
        let config = Config::load_in(dir.path(), &custom)?;
        assert_eq!(config.collector.timeout_secs, 30);
        assert_eq!(config.quality.error_thresholds.total, 25);
        Ok(())
    }
}
