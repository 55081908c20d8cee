//! Console and JSON output for every command.
//!
//! Warnings about skipped backups, collector failures and partial rollbacks
//! are also printed by the engine itself, on stderr, as they happen.

mod console;
mod metrics;
mod shared;

pub use console::{print_batch, print_diagnostics, print_plan, print_processors, print_transaction};
pub use metrics::{print_diff, print_gate, print_snapshot_saved, print_trend};
pub use shared::print_json;
