use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Command line of the external analysis tool, split shell-style.
    #[serde(default = "default_collector_command")]
    pub command: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            command: default_collector_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_collector_command() -> String { "npx tsc --noEmit".to_string() }
const fn default_timeout_secs() -> u64 { 120 }

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub stop_on_failure: bool,
    #[serde(default)]
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat a non-zero remaining count for the target code as a validation error.
    #[serde(default)]
    pub fail_on_remaining: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_dir")]
    pub dir: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            dir: default_metrics_dir(),
            top_n: default_top_n(),
        }
    }
}

fn default_metrics_dir() -> String { "metrics".to_string() }
const fn default_top_n() -> usize { 10 }

/// `errorThresholds` of the threshold document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorThresholds {
    #[serde(default = "default_max_critical")]
    pub critical: usize,
    #[serde(default = "default_warn_total")]
    pub high: usize,
    #[serde(default = "default_max_total")]
    pub total: usize,
}

impl Default for ErrorThresholds {
    fn default() -> Self {
        Self {
            critical: default_max_critical(),
            high: default_warn_total(),
            total: default_max_total(),
        }
    }
}

const fn default_max_critical() -> usize { 50 }
const fn default_warn_total() -> usize { 500 }
const fn default_max_total() -> usize { 1000 }

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchProtection {
    /// Run the enforced pre-change gate before any live fix.
    #[serde(default)]
    pub require_gate: bool,
    #[serde(default)]
    pub protected_branches: Vec<String>,
}

/// The threshold document: `{errorThresholds, autoFixEnabled, branchProtection}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityConfig {
    #[serde(default)]
    pub error_thresholds: ErrorThresholds,
    #[serde(default = "default_true")]
    pub auto_fix_enabled: bool,
    #[serde(default)]
    pub branch_protection: BranchProtection,
    /// Codes whose counts add up to the gate's critical error figure.
    #[serde(default = "default_critical_codes")]
    pub critical_codes: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            error_thresholds: ErrorThresholds::default(),
            auto_fix_enabled: true,
            branch_protection: BranchProtection::default(),
            critical_codes: default_critical_codes(),
        }
    }
}

const fn default_true() -> bool { true }

fn default_critical_codes() -> Vec<String> {
    vec!["D1005".into(), "D1128".into(), "D1434".into()]
}

/// Raw shape of `atomfix.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AtomfixToml {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub quality: QualityConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub batch: BatchConfig,
    pub validation: ValidationConfig,
    pub metrics: MetricsConfig,
    pub quality: QualityConfig,
}
