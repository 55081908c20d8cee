// src/gate/mod.rs
//! Quality gate: current metrics against configured thresholds.

use serde::Serialize;

use crate::config::QualityConfig;
use crate::metrics::MetricsSnapshot;

/// Thresholds the verdict is computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateThresholds {
    pub max_total_errors: usize,
    pub max_critical_errors: usize,
    /// Advisory only. Crossing it warns but never fails the gate.
    pub warn_total_errors: usize,
    /// Codes whose counts add up to the critical error figure.
    pub critical_codes: Vec<String>,
}

impl GateThresholds {
    #[must_use]
    pub fn from_quality(quality: &QualityConfig) -> Self {
        let t = &quality.error_thresholds;
        Self {
            max_total_errors: t.total,
            max_critical_errors: t.critical,
            warn_total_errors: t.high,
            critical_codes: quality.critical_codes.clone(),
        }
    }
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self::from_quality(&QualityConfig::default())
    }
}

/// Whether a failed verdict only reports or also fails the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    #[default]
    Advisory,
    Enforce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateVerdict {
    pub passed: bool,
    pub current_errors: usize,
    pub critical_errors: usize,
    pub thresholds: GateThresholds,
    /// One entry per violated threshold; empty when passed.
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

/// Evaluates `snapshot` against `thresholds`. Pure.
#[must_use]
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &GateThresholds) -> GateVerdict {
    let current_errors = snapshot.total_errors;
    let critical_errors: usize = thresholds
        .critical_codes
        .iter()
        .map(|c| snapshot.count_for(c))
        .sum();

    let mut recommendations = Vec::new();
    if current_errors > thresholds.max_total_errors {
        recommendations.push(format!(
            "Reduce total errors from {current_errors} to at most {} ({} over); run `atomfix plan` and batch the highest tiers first",
            thresholds.max_total_errors,
            current_errors - thresholds.max_total_errors
        ));
    }
    if critical_errors > thresholds.max_critical_errors {
        recommendations.push(format!(
            "Reduce critical errors ({}) from {critical_errors} to at most {}; fix these codes before any other work",
            thresholds.critical_codes.join(", "),
            thresholds.max_critical_errors
        ));
    }

    let mut warnings = Vec::new();
    if current_errors > thresholds.warn_total_errors && current_errors <= thresholds.max_total_errors {
        warnings.push(format!(
            "{current_errors} errors is above the warning level of {}",
            thresholds.warn_total_errors
        ));
    }

    GateVerdict {
        passed: recommendations.is_empty(),
        current_errors,
        critical_errors,
        thresholds: thresholds.clone(),
        recommendations,
        warnings,
    }
}
