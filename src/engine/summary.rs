//! Headline figures derived from a finished aggregation run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::aggregate::stable_sum;
use super::coverage::{CoverageDetail, CoverageRate, rate_for};
use super::store::ReadingStore;
use crate::model::{Category, DisplayNames, TimeBucket};
use crate::snapshot::{TOTAL_KEY, View};

/// Annual figures for one plant or company.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityTotal {
    /// Energy over the whole data set (GWh).
    pub total_gwh: f64,
    /// Rated capacity (GW), when configured.
    pub capacity_gw: Option<f64>,
}

/// Dashboard summary of a whole run.
///
/// Computed post-hoc from the monthly view and the store so that the figures
/// always agree with the series in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Generation per supply subtype (GWh).
    pub generation_by_subtype: BTreeMap<String, f64>,
    /// Total generation (GWh).
    pub total_supply_gwh: f64,
    /// Total consumption (GWh).
    pub total_demand_gwh: f64,
    /// Capped coverage over the whole data set (%).
    pub coverage_rate_pct: f64,
    /// Mean of the monthly coverage rates (%).
    pub mean_monthly_coverage_pct: f64,
    /// Largest monthly unmet demand (GWh).
    pub peak_external_power_gwh: f64,
    /// Storage sizing: largest |supply - demand| at any single timestamp (GWh).
    pub storage_capacity_gwh: f64,
    /// Number of months covered.
    pub months: usize,
    /// Per-entity totals, keyed by group and then entity label.
    pub entities: BTreeMap<String, BTreeMap<String, EntityTotal>>,
}

impl SummaryReport {
    /// Builds the summary.
    ///
    /// # Arguments
    ///
    /// * `store` - Readings of the run, for per-timestamp balances
    /// * `monthly` - Monthly view of the snapshot
    /// * `coverage` - Monthly coverage rates
    /// * `detail` - Monthly coverage detail
    /// * `names` - Display names used for entity labels
    pub fn build(
        store: &ReadingStore,
        monthly: &View,
        coverage: &CoverageRate,
        detail: &BTreeMap<TimeBucket, CoverageDetail>,
        names: &DisplayNames,
    ) -> Self {
        let mut generation_by_subtype = BTreeMap::new();
        let mut total_demand_gwh = 0.0;
        for key in store.series_keys() {
            let total = monthly
                .get(&key.label())
                .and_then(|t| t.get(TOTAL_KEY))
                .map_or(0.0, |s| s.total());
            match key.category {
                Category::Supply => {
                    *generation_by_subtype.entry(key.label()).or_insert(0.0) += total;
                }
                Category::Demand => total_demand_gwh += total,
            }
        }
        let total_supply_gwh = stable_sum(generation_by_subtype.values().copied());

        let mut entities: BTreeMap<String, BTreeMap<String, EntityTotal>> = BTreeMap::new();
        for entity in store.entities() {
            let group = match (&entity.category, &entity.subtype) {
                (Category::Supply, Some(s)) => s.as_str().to_string(),
                (Category::Supply, None) => "supply".to_string(),
                (Category::Demand, _) => "demand".to_string(),
            };
            let label = names.label(&entity.id).to_string();
            let total_gwh = monthly
                .get(&group)
                .and_then(|t| t.get(&label))
                .map_or(0.0, |s| s.total());
            entities.entry(group).or_default().insert(
                label,
                EntityTotal {
                    total_gwh,
                    capacity_gw: entity.capacity_gw,
                },
            );
        }

        let peak_external_power_gwh = detail
            .values()
            .map(|d| d.external_power)
            .fold(0.0_f64, f64::max);

        Self {
            generation_by_subtype,
            total_supply_gwh,
            total_demand_gwh,
            coverage_rate_pct: rate_for(total_supply_gwh, total_demand_gwh),
            mean_monthly_coverage_pct: coverage.mean(),
            peak_external_power_gwh,
            storage_capacity_gwh: storage_capacity(store),
            months: coverage.len(),
            entities,
        }
    }
}

/// Largest absolute supply/demand imbalance at any single timestamp.
fn storage_capacity(store: &ReadingStore) -> f64 {
    let mut balance: BTreeMap<NaiveDateTime, (f64, f64)> = BTreeMap::new();
    for r in store.all() {
        let slot = balance.entry(r.timestamp).or_insert((0.0, 0.0));
        match r.category() {
            Category::Supply => slot.0 += r.magnitude,
            Category::Demand => slot.1 += r.magnitude,
        }
    }
    balance
        .values()
        .map(|(supply, demand)| (supply - demand).abs())
        .fold(0.0_f64, f64::max)
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Coverage Summary ---")?;
        for (subtype, gwh) in &self.generation_by_subtype {
            writeln!(f, "{:<22} {:>12.2} GWh", format!("{subtype} generation:"), gwh)?;
        }
        writeln!(f, "{:<22} {:>12.2} GWh", "Total supply:", self.total_supply_gwh)?;
        writeln!(f, "{:<22} {:>12.2} GWh", "Total demand:", self.total_demand_gwh)?;
        writeln!(f, "{:<22} {:>12.1}%", "Coverage rate:", self.coverage_rate_pct)?;
        writeln!(
            f,
            "{:<22} {:>12.1}% over {} month(s)",
            "Mean monthly coverage:", self.mean_monthly_coverage_pct, self.months
        )?;
        writeln!(
            f,
            "{:<22} {:>12.2} GWh",
            "Peak external power:", self.peak_external_power_gwh
        )?;
        write!(
            f,
            "{:<22} {:>12.2} GWh",
            "Storage capacity:", self.storage_capacity_gwh
        )
    }
}
