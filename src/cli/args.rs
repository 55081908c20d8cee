use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::metrics::ExportFormat;

#[derive(Parser)]
#[command(
    name = "atomfix",
    version,
    about = "Transactional auto-fix pipeline for static-analysis diagnostics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Config file (defaults to <root>/atomfix.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print machine-readable JSON instead of console output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the analysis tool and print grouped diagnostic counts
    Collect,
    /// Print tiered fix recommendations
    Plan,
    /// List registered processors
    Processors,
    /// Run one processor as a transaction (dry run unless --confirm)
    Execute {
        code: String,
        /// Write changes to disk
        #[arg(long)]
        confirm: bool,
    },
    /// Run several processors in order, one transaction each
    Batch {
        #[arg(required = true)]
        codes: Vec<String>,
        /// Write changes to disk
        #[arg(long)]
        confirm: bool,
        /// Stop at the first rolled-back transaction
        #[arg(long)]
        stop_on_failure: bool,
        /// Pause between processors, in milliseconds
        #[arg(long, value_name = "MS")]
        pause: Option<u64>,
    },
    /// Evaluate the quality gate
    Gate {
        /// Exit non-zero when the gate fails
        #[arg(long)]
        enforce: bool,
        /// Evaluate a stored snapshot instead of collecting
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,
    },
    /// Collect, record a snapshot, then enforce the gate
    Pipeline,
    #[command(subcommand)]
    Metrics(MetricsCommand),
}

#[derive(Subcommand)]
pub enum MetricsCommand {
    /// Collect and store today's snapshot
    Record,
    /// Show the trend over the trailing N days
    Trend {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Compare two dated snapshots (YYYY-MM-DD)
    Diff { from: String, to: String },
    /// Export every stored snapshot
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
}

/// Options for the batch command.
#[derive(Debug, Clone, Default)]
pub struct BatchArgs {
    pub codes: Vec<String>,
    pub confirm: bool,
    pub stop_on_failure: bool,
    pub pause: Option<u64>,
}
