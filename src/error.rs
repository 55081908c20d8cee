// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::transaction::TxStatus;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("collector failure: {0}")]
    Collector(#[from] CollectorFailure),

    #[error("unsupported diagnostic code: {0} (no processor registered)")]
    UnsupportedCode(String),

    #[error("processor {code} failed: {reason}")]
    Processor { code: String, reason: String },

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("rollback incomplete: {failed} of {attempted} file(s) could not be restored")]
    RollbackPartial { failed: usize, attempted: usize },

    #[error("illegal transaction transition {from} -> {to}")]
    IllegalTransition { from: TxStatus, to: TxStatus },

    #[error("config error: {0}")]
    Config(String),

    #[error("no metrics snapshot for {0}")]
    SnapshotNotFound(String),

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why the external analysis collaborator produced no trustworthy result.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectorFailure {
    #[error("could not start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("`{command}` exited with {exit_code} and produced no diagnostics: {output}")]
    Crashed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("invalid collector command `{command}`: {reason}")]
    BadCommand { command: String, reason: String },
}

pub type Result<T> = std::result::Result<T, FixError>;

impl FixError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FixError::Io {
            source,
            path: path.into(),
        }
    }
}

// Allow `?` on std::io::Error by converting to FixError::Io with unknown path.
impl From<std::io::Error> for FixError {
    fn from(source: std::io::Error) -> Self {
        FixError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<toml::de::Error> for FixError {
    fn from(e: toml::de::Error) -> Self {
        FixError::Config(e.to_string())
    }
}
