// src/metrics/trend.rs
//! Trend and point-to-point reports over stored snapshots.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::snapshot::MetricsSnapshot;
use super::store::MetricsStore;
use crate::error::Result;

pub const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBar {
    pub date: String,
    pub total: usize,
    /// Columns, scaled against the largest total in the window.
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    /// Requested window, in calendar days ending at the newest snapshot.
    pub days: u32,
    pub first: Option<TrendPoint>,
    pub last: Option<TrendPoint>,
    /// `last - first`; negative means fewer errors.
    pub delta: i64,
    /// Average change per calendar day between first and last.
    pub daily_average: f64,
    pub bars: Vec<TrendBar>,
}

impl TrendReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDelta {
    pub code: String,
    pub from: usize,
    pub to: usize,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub from: TrendPoint,
    pub to: TrendPoint,
    /// `from.total - to.total`; positive means errors went down.
    pub reduction: i64,
    /// Most improved first.
    pub per_code: Vec<CodeDelta>,
}

/// Builds a trend over the snapshots in the trailing `days` window.
#[must_use]
pub fn trend(snapshots: &[MetricsSnapshot], days: u32) -> TrendReport {
    let Some(newest) = snapshots.iter().map(|s| s.timestamp.date_naive()).max() else {
        return empty_trend(days);
    };
    let window_start = newest
        .checked_sub_signed(chrono::Duration::days(i64::from(days.max(1)) - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut points: Vec<(NaiveDate, TrendPoint)> = snapshots
        .iter()
        .filter(|s| s.timestamp.date_naive() >= window_start)
        .map(|s| {
            let point = TrendPoint {
                date: s.date(),
                total: s.total_errors,
            };
            (s.timestamp.date_naive(), point)
        })
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0));

    let (Some((first_day, first)), Some((last_day, last))) = (points.first(), points.last()) else {
        return empty_trend(days);
    };
    let delta = signed(last.total) - signed(first.total);
    let span = (*last_day - *first_day).num_days();
    #[allow(clippy::cast_precision_loss)]
    let daily_average = if span > 0 { delta as f64 / span as f64 } else { 0.0 };

    let max = points.iter().map(|(_, p)| p.total).max().unwrap_or(0);
    let bars = points
        .iter()
        .map(|(_, p)| TrendBar {
            date: p.date.clone(),
            total: p.total,
            width: scale(p.total, max),
        })
        .collect();

    TrendReport {
        days,
        first: Some(first.clone()),
        last: Some(last.clone()),
        delta,
        daily_average,
        bars,
    }
}

/// Loads the store and builds a trend over it.
///
/// # Errors
/// Returns error if a stored snapshot cannot be read.
pub fn trend_from_store(store: &MetricsStore, days: u32) -> Result<TrendReport> {
    Ok(trend(&store.load_all()?, days))
}

/// Compares two snapshots code by code.
#[must_use]
pub fn diff(from: &MetricsSnapshot, to: &MetricsSnapshot) -> SnapshotDiff {
    let codes: BTreeSet<&String> = from
        .errors_by_type
        .keys()
        .chain(to.errors_by_type.keys())
        .collect();
    let mut per_code: Vec<CodeDelta> = codes
        .into_iter()
        .map(|code| {
            let (a, b) = (from.count_for(code), to.count_for(code));
            CodeDelta {
                code: code.clone(),
                from: a,
                to: b,
                delta: signed(b) - signed(a),
            }
        })
        .collect();
    per_code.sort_by(|a, b| a.delta.cmp(&b.delta).then_with(|| a.code.cmp(&b.code)));

    SnapshotDiff {
        from: TrendPoint {
            date: from.date(),
            total: from.total_errors,
        },
        to: TrendPoint {
            date: to.date(),
            total: to.total_errors,
        },
        reduction: signed(from.total_errors) - signed(to.total_errors),
        per_code,
    }
}

/// Loads two dated snapshots and diffs them.
///
/// # Errors
/// Returns `FixError::SnapshotNotFound` if either date has no document.
pub fn diff_dates(store: &MetricsStore, from: &str, to: &str) -> Result<SnapshotDiff> {
    Ok(diff(&store.load(from)?, &store.load(to)?))
}

fn empty_trend(days: u32) -> TrendReport {
    TrendReport {
        days,
        first: None,
        last: None,
        delta: 0,
        daily_average: 0.0,
        bars: Vec::new(),
    }
}

fn scale(total: usize, max: usize) -> usize {
    if max == 0 || total == 0 {
        return 0;
    }
    (total * BAR_WIDTH / max).max(1)
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn snap(day: u32, counts: &[(&str, usize)]) -> MetricsSnapshot {
        let by_type = counts.iter().map(|(c, n)| ((*c).to_string(), *n)).collect();
        let ts = Utc.with_ymd_and_hms(2025, 10, day, 9, 0, 0).single().unwrap_or_default();
        MetricsSnapshot::from_counts(by_type, BTreeMap::new(), ts, 10)
    }

    #[test]
    fn trend_reports_delta_average_and_bars() {
        let snaps = vec![
            snap(1, &[("D1005", 400)]),
            snap(3, &[("D1005", 300)]),
            snap(5, &[("D1005", 200)]),
        ];
        let report = trend(&snaps, 7);
        assert_eq!(report.delta, -200);
        assert!((report.daily_average - -50.0).abs() < f64::EPSILON);
        let widths: Vec<usize> = report.bars.iter().map(|b| b.width).collect();
        assert_eq!(widths, vec![40, 30, 20]);
    }

    #[test]
    fn trend_window_is_trailing() {
        let snaps = vec![snap(1, &[("D1005", 10)]), snap(9, &[("D1005", 5)])];
        let report = trend(&snaps, 3);
        assert_eq!(report.bars.len(), 1);
        assert_eq!(report.first, report.last);
        assert_eq!(report.delta, 0);
    }

    #[test]
    fn huge_window_covers_everything() {
        let snaps = vec![snap(1, &[("D1005", 10)]), snap(9, &[("D1005", 5)])];
        let report = trend(&snaps, u32::MAX);
        assert_eq!(report.bars.len(), 2);
        assert_eq!(report.delta, -5);
    }

    #[test]
    fn trend_of_nothing_is_empty() {
        assert!(trend(&[], 7).is_empty());
    }

    #[test]
    fn diff_sorts_most_improved_first() {
        let from = snap(1, &[("D1005", 300), ("D1434", 150), ("D2339", 50)]);
        let to = snap(8, &[("D1005", 100), ("D1434", 140), ("D7006", 60)]);
        let d = diff(&from, &to);
        assert_eq!(d.reduction, 200);
        let order: Vec<(&str, i64)> = d.per_code.iter().map(|c| (c.code.as_str(), c.delta)).collect();
        assert_eq!(
            order,
            vec![("D1005", -200), ("D2339", -50), ("D1434", -10), ("D7006", 60)]
        );
    }
}
