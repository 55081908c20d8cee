//! Persisted error metrics: dated snapshots, trends and diffs.

mod snapshot;
mod store;
mod trend;

pub use snapshot::{CodeCount, FileCount, MetricsSnapshot};
pub use store::{ExportFormat, MetricsStore, LATEST_FILE};
pub use trend::{
    diff, diff_dates, trend, trend_from_store, CodeDelta, SnapshotDiff, TrendBar, TrendPoint,
    TrendReport, BAR_WIDTH,
};
