//! One aggregation run: every view, roll-up and coverage figure for a store.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::aggregate::{
    AggregateSeries, daily_sum, hourly_profile_mean, hourly_total_sum, monthly_sum, rollup,
    zero_fill_hours,
};
use super::consistency::{DEFAULT_TOLERANCE, check_snapshot};
use super::coverage::{coverage_detail, coverage_rate, hourly_balance};
use super::store::{IngestReport, ReadingStore};
use super::summary::SummaryReport;
use crate::error::EngineError;
use crate::model::{Category, DisplayNames, EntityId, Granularity, Reading};
use crate::snapshot::{AggregateSnapshot, SeriesFailure, SeriesTable, TOTAL_KEY, View, ViewKind};

/// How hour-of-day series treat hours without readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourlyFill {
    /// Hours with no readings are absent.
    #[default]
    Sparse,
    /// Every hour 0..=23 is present, missing ones as 0.
    Zero,
}

/// Settings for one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOptions {
    pub hourly_fill: HourlyFill,
    /// Relative tolerance for the post-run consistency check.
    pub tolerance: f64,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            hourly_fill: HourlyFill::Sparse,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Computes every view of `store` and assembles the snapshot.
///
/// Runs are pure functions of the store: nothing is mutated, so several runs
/// over one store may proceed on different threads. A series that fails is
/// recorded in [`AggregateSnapshot::errors`] and left out of its table; the
/// rest of the run continues.
pub fn run(
    store: &ReadingStore,
    ingest: IngestReport,
    options: &AggregationOptions,
) -> AggregateSnapshot {
    let names = resolve_labels(store);
    let mut snapshot = AggregateSnapshot {
        ingest,
        ..AggregateSnapshot::default()
    };
    let mut supply_groups = Vec::new();
    let mut demand_groups = Vec::new();

    for key in store.series_keys() {
        let group = key.label();
        match key.category {
            Category::Supply => supply_groups.push(group.clone()),
            Category::Demand => demand_groups.push(group.clone()),
        }

        for kind in ViewKind::ALL {
            let mut table = SeriesTable::new();
            for id in store.entity_ids(&key) {
                let label = names.label(id).to_string();
                let result = if label == TOTAL_KEY || table.contains_key(&label) {
                    Err(EngineError::RenameCollision {
                        from: id.to_string(),
                        to: label.clone(),
                    })
                } else {
                    series_for(kind, store.readings_of(&key, id), options.hourly_fill)
                };
                match result {
                    Ok(series) => {
                        table.insert(label, series);
                    }
                    Err(err) => {
                        warn!(view = %kind, group = %group, series = %label, error = %err, "series failed");
                        snapshot.errors.push(SeriesFailure {
                            view: kind.to_string(),
                            group: group.clone(),
                            series: label,
                            error: err.to_string(),
                        });
                    }
                }
            }
            let total = rollup(table.values());
            table.insert(TOTAL_KEY.to_string(), total);
            snapshot.view_mut(kind).insert(group.clone(), table);
        }
    }

    let supply = category_total(&snapshot.monthly, &supply_groups);
    let demand = category_total(&snapshot.monthly, &demand_groups);
    snapshot.coverage_rate = coverage_rate(&supply, &demand);
    snapshot.coverage_detail = coverage_detail(&supply, &demand);

    let (hourly_supply, hourly_demand) = match hourly_balance(store.all()) {
        (s, d) if options.hourly_fill == HourlyFill::Zero && !store.is_empty() => {
            (zero_fill_hours(&s), zero_fill_hours(&d))
        }
        balance => balance,
    };
    snapshot.hourly_coverage_rate = coverage_rate(&hourly_supply, &hourly_demand);

    snapshot.summary = SummaryReport::build(
        store,
        &snapshot.monthly,
        &snapshot.coverage_rate,
        &snapshot.coverage_detail,
        &names,
    );

    let check = check_snapshot(&snapshot, options.tolerance);
    debug!(ok = check.ok, mismatches = check.mismatches.len(), "post-run consistency");
    info!(
        readings = store.len(),
        groups = supply_groups.len() + demand_groups.len(),
        months = snapshot.coverage_rate.len(),
        failures = snapshot.errors.len(),
        "aggregation complete"
    );
    snapshot
}

fn series_for<'a, I>(
    kind: ViewKind,
    readings: I,
    fill: HourlyFill,
) -> Result<AggregateSeries, EngineError>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let series = match kind {
        ViewKind::HourlyProfile => hourly_profile_mean(readings)?,
        ViewKind::HourlyTotal => hourly_total_sum(readings),
        ViewKind::Monthly => monthly_sum(readings),
        ViewKind::Daily => daily_sum(readings),
    };
    Ok(match (kind.granularity(), fill) {
        (Granularity::HourOfDay, HourlyFill::Zero) => zero_fill_hours(&series),
        _ => series,
    })
}

/// Roll-up of the `total` series of several groups.
fn category_total(view: &View, groups: &[String]) -> AggregateSeries {
    rollup(
        groups
            .iter()
            .filter_map(|g| view.get(g))
            .filter_map(|t| t.get(TOTAL_KEY)),
    )
}

/// Display names usable as series keys.
///
/// A configured name that would share a key with another entity of the same
/// group, or with the total, is dropped and the entity keeps its id. Falling
/// back to an id can create a new clash with another entity's display name,
/// so the check repeats until no further name is dropped.
fn resolve_labels(store: &ReadingStore) -> DisplayNames {
    let configured = store.display_names();
    let mut rejected: BTreeSet<EntityId> = BTreeSet::new();

    for key in store.series_keys() {
        let ids = store.entity_ids(&key);
        loop {
            let label = |id: &EntityId| -> String {
                match configured.get(id) {
                    Some(name) if !rejected.contains(id) => name.to_string(),
                    _ => id.to_string(),
                }
            };
            let mut uses: BTreeMap<String, usize> = BTreeMap::new();
            for &id in &ids {
                *uses.entry(label(id)).or_default() += 1;
            }
            let clashing: Vec<EntityId> = ids
                .iter()
                .copied()
                .filter(|&id| configured.get(id).is_some() && !rejected.contains(id))
                .filter(|&id| {
                    let name = label(id);
                    name == TOTAL_KEY || uses.get(&name).copied().unwrap_or(0) > 1
                })
                .cloned()
                .collect();
            if clashing.is_empty() {
                break;
            }
            for id in clashing {
                warn!(entity = %id, display_name = configured.label(&id), group = %key.label(), "display name collides, keeping id");
                rejected.insert(id);
            }
        }
    }

    store
        .entities()
        .filter(|e| !rejected.contains(&e.id))
        .filter_map(|e| e.display_name.clone().map(|n| (e.id.clone(), n)))
        .collect()
}
