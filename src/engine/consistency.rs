//! Internal consistency checks on aggregate snapshots.
//!
//! Checks never fail: every mismatch is collected into a
//! [`ConsistencyReport`] so a caller can see all of them at once.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use super::aggregate::{AggregateSeries, rollup};
use crate::snapshot::{AggregateSnapshot, TOTAL_KEY, View, ViewKind};

/// Default relative tolerance for floating-point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// One value that did not match its expected counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Where the mismatch was found, e.g. `monthly/solar/total`.
    pub scope: String,
    /// Literal bucket key, or `*` for whole-series checks.
    pub bucket: String,
    pub expected: f64,
    pub actual: f64,
    pub delta: f64,
}

/// Outcome of a consistency check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub ok: bool,
    pub mismatches: Vec<Mismatch>,
}

impl ConsistencyReport {
    fn from_mismatches(mismatches: Vec<Mismatch>) -> Self {
        Self {
            ok: mismatches.is_empty(),
            mismatches,
        }
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: ConsistencyReport) {
        self.mismatches.extend(other.mismatches);
        self.ok = self.mismatches.is_empty();
    }
}

impl Default for ConsistencyReport {
    fn default() -> Self {
        Self::from_mismatches(Vec::new())
    }
}

/// `true` when `expected` and `actual` agree within a relative `tolerance`.
pub fn within_tolerance(expected: f64, actual: f64, tolerance: f64) -> bool {
    let delta = (expected - actual).abs();
    delta == 0.0 || delta <= tolerance * expected.abs().max(actual.abs())
}

/// Verifies that `total` equals the bucket-wise sum of `per_entity`.
///
/// Every bucket present in either side is checked; a bucket missing from one
/// side compares against zero.
pub fn check_rollup<'a, I>(total: &AggregateSeries, per_entity: I, tolerance: f64) -> ConsistencyReport
where
    I: IntoIterator<Item = &'a AggregateSeries>,
{
    let expected = rollup(per_entity);
    ConsistencyReport::from_mismatches(compare_series("rollup", &expected, total, tolerance))
}

/// Runs every internal check on one snapshot.
///
/// For each view and group, the `total` series must equal the roll-up of
/// the entity series. For each group, the grand total of the monthly view
/// must equal the grand total of the hour-of-day sum view.
pub fn check_snapshot(snapshot: &AggregateSnapshot, tolerance: f64) -> ConsistencyReport {
    let mut mismatches = Vec::new();

    for kind in ViewKind::ALL {
        for (group, table) in snapshot.view(kind) {
            let Some(total) = table.get(TOTAL_KEY) else {
                continue;
            };
            let entities = table
                .iter()
                .filter(|(name, _)| name.as_str() != TOTAL_KEY)
                .map(|(_, series)| series);
            let scope = format!("{kind}/{group}/{TOTAL_KEY}");
            mismatches.extend(compare_series(&scope, &rollup(entities), total, tolerance));
        }
    }

    for group in group_union(&snapshot.monthly, &snapshot.hourly_total) {
        let monthly = grand_total(&snapshot.monthly, group);
        let hourly = grand_total(&snapshot.hourly_total, group);
        if !within_tolerance(monthly, hourly, tolerance) {
            mismatches.push(Mismatch {
                scope: format!("{}~{}/{group}", ViewKind::Monthly, ViewKind::HourlyTotal),
                bucket: "*".to_string(),
                expected: monthly,
                actual: hourly,
                delta: hourly - monthly,
            });
        }
    }

    if !mismatches.is_empty() {
        warn!(count = mismatches.len(), "snapshot failed consistency check");
    }
    ConsistencyReport::from_mismatches(mismatches)
}

/// Compares two snapshots series by series.
///
/// A series or bucket present in only one of them is reported against zero.
pub fn compare_snapshots(
    expected: &AggregateSnapshot,
    actual: &AggregateSnapshot,
    tolerance: f64,
) -> ConsistencyReport {
    let mut mismatches = Vec::new();
    let empty = AggregateSeries::new();
    for kind in ViewKind::ALL {
        let (a, b) = (expected.view(kind), actual.view(kind));
        for group in group_union(a, b) {
            let names: BTreeSet<&str> = a
                .get(group)
                .into_iter()
                .chain(b.get(group))
                .flat_map(|t| t.keys().map(String::as_str))
                .collect();
            for name in names {
                let left = a.get(group).and_then(|t| t.get(name)).unwrap_or(&empty);
                let right = b.get(group).and_then(|t| t.get(name)).unwrap_or(&empty);
                let scope = format!("{kind}/{group}/{name}");
                mismatches.extend(compare_series(&scope, left, right, tolerance));
            }
        }
    }
    ConsistencyReport::from_mismatches(mismatches)
}

fn compare_series(
    scope: &str,
    expected: &AggregateSeries,
    actual: &AggregateSeries,
    tolerance: f64,
) -> Vec<Mismatch> {
    let buckets: BTreeSet<_> = expected.buckets().chain(actual.buckets()).collect();
    buckets
        .into_iter()
        .filter_map(|b| {
            let e = expected.get_or_zero(b);
            let a = actual.get_or_zero(b);
            (!within_tolerance(e, a, tolerance)).then(|| Mismatch {
                scope: scope.to_string(),
                bucket: b.to_string(),
                expected: e,
                actual: a,
                delta: a - e,
            })
        })
        .collect()
}

fn group_union<'a>(a: &'a View, b: &'a View) -> BTreeSet<&'a str> {
    a.keys().chain(b.keys()).map(String::as_str).collect()
}

fn grand_total(view: &View, group: &str) -> f64 {
    view.get(group)
        .and_then(|t| t.get(TOTAL_KEY))
        .map_or(0.0, AggregateSeries::total)
}
