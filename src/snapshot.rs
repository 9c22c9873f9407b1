//! The finished aggregate snapshot and the entity-name remap.
//!
//! A snapshot is the only output of an aggregation run. Views are nested as
//! `group → series → bucket → value`, where `group` is a supply subtype name
//! or `"demand"` and `series` is an entity label or [`TOTAL_KEY`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::aggregate::AggregateSeries;
use crate::engine::coverage::{CoverageDetail, CoverageRate};
use crate::engine::store::IngestReport;
use crate::engine::summary::SummaryReport;
use crate::error::EngineError;
use crate::model::{Granularity, TimeBucket};

/// Series key of the roll-up across all entities of a group.
pub const TOTAL_KEY: &str = "total";

/// Series of one group, keyed by entity label or [`TOTAL_KEY`].
pub type SeriesTable = BTreeMap<String, AggregateSeries>;

/// All groups of one view.
pub type View = BTreeMap<String, SeriesTable>;

/// The aggregate views carried by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Mean reading per hour of day (typical-day profile).
    HourlyProfile,
    /// Summed readings per hour of day across the data set.
    HourlyTotal,
    /// Summed readings per calendar month.
    Monthly,
    /// Summed readings per calendar day.
    Daily,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::HourlyProfile,
        ViewKind::HourlyTotal,
        ViewKind::Monthly,
        ViewKind::Daily,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::HourlyProfile => "hourly_profile",
            ViewKind::HourlyTotal => "hourly_total",
            ViewKind::Monthly => "monthly",
            ViewKind::Daily => "daily",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            ViewKind::HourlyProfile | ViewKind::HourlyTotal => Granularity::HourOfDay,
            ViewKind::Monthly => Granularity::Month,
            ViewKind::Daily => Granularity::Day,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewKind::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown view \"{s}\", expected one of hourly_profile, hourly_total, monthly, daily"
                )
            })
    }
}

/// A series computation that failed without aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFailure {
    pub view: String,
    pub group: String,
    pub series: String,
    pub error: String,
}

/// Finished output of one aggregation run. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub hourly_profile: View,
    pub hourly_total: View,
    pub monthly: View,
    pub daily: View,
    /// Capped coverage percentage per month.
    pub coverage_rate: CoverageRate,
    pub coverage_detail: BTreeMap<TimeBucket, CoverageDetail>,
    /// Capped coverage percentage per hour of day, from the mean profiles.
    pub hourly_coverage_rate: CoverageRate,
    pub summary: SummaryReport,
    pub ingest: IngestReport,
    pub errors: Vec<SeriesFailure>,
}

impl AggregateSnapshot {
    pub fn view(&self, kind: ViewKind) -> &View {
        match kind {
            ViewKind::HourlyProfile => &self.hourly_profile,
            ViewKind::HourlyTotal => &self.hourly_total,
            ViewKind::Monthly => &self.monthly,
            ViewKind::Daily => &self.daily,
        }
    }

    pub fn view_mut(&mut self, kind: ViewKind) -> &mut View {
        match kind {
            ViewKind::HourlyProfile => &mut self.hourly_profile,
            ViewKind::HourlyTotal => &mut self.hourly_total,
            ViewKind::Monthly => &mut self.monthly,
            ViewKind::Daily => &mut self.daily,
        }
    }

    /// Group labels present in any view, in order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = ViewKind::ALL
            .iter()
            .flat_map(|k| self.view(*k).keys().map(String::as_str))
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Looks up one series.
    pub fn series(&self, kind: ViewKind, group: &str, series: &str) -> Option<&AggregateSeries> {
        self.view(kind).get(group).and_then(|t| t.get(series))
    }

    /// Returns a copy with entity labels rewritten through `mapping`.
    ///
    /// Only keys change: every value is carried over untouched. Group keys,
    /// [`TOTAL_KEY`] and bucket keys are never renamed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RenameCollision`] when a new label would land on
    /// a key that already exists in the same table.
    pub fn rename(&self, mapping: &BTreeMap<String, String>) -> Result<Self, EngineError> {
        let mut out = self.clone();
        for kind in ViewKind::ALL {
            for table in out.view_mut(kind).values_mut() {
                *table = rename_table(std::mem::take(table), mapping)?;
            }
        }
        for table in out.summary.entities.values_mut() {
            *table = rename_table(std::mem::take(table), mapping)?;
        }
        for failure in &mut out.errors {
            if let Some(new) = mapping.get(&failure.series) {
                failure.series.clone_from(new);
            }
        }
        Ok(out)
    }

    /// Serializes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn rename_table<V>(
    table: BTreeMap<String, V>,
    mapping: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, V>, EngineError> {
    let mut out = BTreeMap::new();
    for (key, value) in table {
        let new_key = match mapping.get(&key) {
            Some(new) if key != TOTAL_KEY => new.clone(),
            _ => key.clone(),
        };
        if out.contains_key(&new_key) {
            return Err(EngineError::RenameCollision {
                from: key,
                to: new_key,
            });
        }
        out.insert(new_key, value);
    }
    Ok(out)
}

/// Rewrites object keys found in `mapping` at every nesting level of a JSON
/// document. Values are never modified.
///
/// Used for snapshots produced elsewhere, where the typed structure is not
/// available.
///
/// # Errors
///
/// Returns [`EngineError::RenameCollision`] when a renamed key would collide
/// with a sibling key.
pub fn rename_json(value: &Value, mapping: &BTreeMap<String, String>) -> Result<Value, EngineError> {
    match value {
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, child) in obj {
                let new_key = mapping.get(key).cloned().unwrap_or_else(|| key.clone());
                if out.contains_key(&new_key) {
                    return Err(EngineError::RenameCollision {
                        from: key.clone(),
                        to: new_key,
                    });
                }
                out.insert(new_key, rename_json(child, mapping)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| rename_json(v, mapping))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN: TimeBucket = TimeBucket::Month { year: 2024, month: 1 };

    fn snapshot() -> AggregateSnapshot {
        let a: AggregateSeries = [(JAN, 100.0)].into_iter().collect();
        let b: AggregateSeries = [(JAN, 50.0)].into_iter().collect();
        let total: AggregateSeries = [(JAN, 150.0)].into_iter().collect();
        let mut table = SeriesTable::new();
        table.insert("plantA".to_string(), a);
        table.insert("plantB".to_string(), b);
        table.insert(TOTAL_KEY.to_string(), total);
        let mut snap = AggregateSnapshot::default();
        snap.monthly.insert("solar".to_string(), table);
        snap
    }

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    fn values(snap: &AggregateSnapshot) -> Vec<f64> {
        let mut v: Vec<f64> = snap
            .monthly
            .values()
            .flat_map(|t| t.values())
            .flat_map(|s| s.iter().map(|(_, v)| v))
            .collect();
        v.sort_by(f64::total_cmp);
        v
    }

    #[test]
    fn rename_preserves_values() {
        let snap = snapshot();
        let renamed = snap
            .rename(&mapping(&[("plantA", "Onshore Solar")]))
            .unwrap_or_default();
        assert_eq!(values(&snap), values(&renamed));
        assert!(renamed.series(ViewKind::Monthly, "solar", "Onshore Solar").is_some());
        assert!(renamed.series(ViewKind::Monthly, "solar", "plantA").is_none());
        assert_eq!(
            renamed.series(ViewKind::Monthly, "solar", "Onshore Solar"),
            snap.series(ViewKind::Monthly, "solar", "plantA")
        );
    }

    #[test]
    fn rename_never_touches_total() {
        let snap = snapshot();
        let renamed = snap.rename(&mapping(&[("total", "everything")])).unwrap_or_default();
        assert!(renamed.series(ViewKind::Monthly, "solar", TOTAL_KEY).is_some());
    }

    #[test]
    fn rename_collision_is_rejected() {
        let err = snapshot().rename(&mapping(&[("plantA", "plantB")]));
        assert!(matches!(err, Err(EngineError::RenameCollision { .. })));
    }

    #[test]
    fn rename_json_rewrites_keys_at_every_level() {
        let doc = serde_json::json!({
            "solar": { "plantA": { "2024-01": 100.0 } },
            "capacity": { "plantA": { "capacity_gw": 1.5 } },
            "list": [ { "plantA": 1 } ]
        });
        let out = rename_json(&doc, &mapping(&[("plantA", "Onshore Solar")])).unwrap_or_default();
        assert_eq!(out["solar"]["Onshore Solar"]["2024-01"], 100.0);
        assert_eq!(out["capacity"]["Onshore Solar"]["capacity_gw"], 1.5);
        assert_eq!(out["list"][0]["Onshore Solar"], 1);
        assert!(out["solar"].get("plantA").is_none());
    }

    #[test]
    fn view_kind_parses() {
        assert_eq!("monthly".parse::<ViewKind>().ok(), Some(ViewKind::Monthly));
        assert!("weekly".parse::<ViewKind>().is_err());
    }

    #[test]
    fn json_uses_literal_bucket_keys() {
        let json = snapshot().to_json_pretty().unwrap_or_default();
        let v: Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(v["monthly"]["solar"]["total"]["2024-01"], 150.0);
    }
}
