//! Renewable coverage rate: share of demand met by supply, per bucket.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use chrono::NaiveDateTime;

use super::aggregate::{AggregateSeries, stable_sum};
use crate::model::{Category, Granularity, Reading, TimeBucket};

/// Upper bound of the reported coverage percentage. Oversupply is reported
/// as full coverage; see [`CoverageDetail::uncapped_ratio`] for the raw ratio.
pub const COVERAGE_CAP_PCT: f64 = 100.0;

/// Bucket → coverage percentage in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CoverageRate {
    rates: BTreeMap<TimeBucket, f64>,
}

impl CoverageRate {
    pub fn get(&self, bucket: &TimeBucket) -> Option<f64> {
        self.rates.get(bucket).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeBucket, f64)> {
        self.rates.iter().map(|(b, r)| (b, *r))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Arithmetic mean of the bucket rates, 0 when there are none.
    pub fn mean(&self) -> f64 {
        if self.rates.is_empty() {
            return 0.0;
        }
        self.rates.values().sum::<f64>() / self.rates.len() as f64
    }
}

/// Supply/demand balance for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageDetail {
    pub supply: f64,
    pub demand: f64,
    /// Capped coverage percentage, as in [`CoverageRate`].
    pub rate: f64,
    /// `supply / demand * 100` without the cap; `None` when demand is zero.
    pub uncapped_ratio: Option<f64>,
    /// Demand not met by supply (bought from the grid).
    pub external_power: f64,
    /// Supply exceeding demand (discarded by the cap).
    pub surplus: f64,
}

/// Coverage percentage for one supply/demand pair.
///
/// `min(supply / demand * 100, 100)` when `demand > 0`, otherwise 0.
pub fn rate_for(supply: f64, demand: f64) -> f64 {
    if demand > 0.0 {
        (supply * 100.0 / demand).clamp(0.0, COVERAGE_CAP_PCT)
    } else {
        0.0
    }
}

/// Coverage rate per bucket over the union of both series' buckets.
///
/// A bucket missing from one side counts as zero on that side.
pub fn coverage_rate(total_supply: &AggregateSeries, total_demand: &AggregateSeries) -> CoverageRate {
    let rates = union_buckets(total_supply, total_demand)
        .into_iter()
        .map(|b| {
            let rate = rate_for(total_supply.get_or_zero(&b), total_demand.get_or_zero(&b));
            (b, rate)
        })
        .collect();
    CoverageRate { rates }
}

/// Full supply/demand balance per bucket, including uncapped ratio,
/// external power and surplus.
pub fn coverage_detail(
    total_supply: &AggregateSeries,
    total_demand: &AggregateSeries,
) -> BTreeMap<TimeBucket, CoverageDetail> {
    union_buckets(total_supply, total_demand)
        .into_iter()
        .map(|b| {
            let supply = total_supply.get_or_zero(&b);
            let demand = total_demand.get_or_zero(&b);
            let detail = CoverageDetail {
                supply,
                demand,
                rate: rate_for(supply, demand),
                uncapped_ratio: (demand > 0.0).then(|| supply * 100.0 / demand),
                external_power: (demand - supply).max(0.0),
                surplus: (supply - demand).max(0.0),
            };
            (b, detail)
        })
        .collect()
}

/// Hour-of-day supply and demand over the whole data set.
///
/// At each hour, the supply (and demand) readings of every timestamp falling
/// in that hour are summed and divided by the number of distinct timestamps
/// at that hour. An entity with no reading at a timestamp counts as zero
/// there, so sparse entities pull the hour's mean down.
///
/// Returns `(supply, demand)`; an hour with readings on only one side has 0
/// on the other.
pub fn hourly_balance<'a, I>(readings: I) -> (AggregateSeries, AggregateSeries)
where
    I: IntoIterator<Item = &'a Reading>,
{
    #[derive(Default)]
    struct Pool {
        supply: Vec<f64>,
        demand: Vec<f64>,
        stamps: BTreeSet<NaiveDateTime>,
    }

    let mut pools: BTreeMap<TimeBucket, Pool> = BTreeMap::new();
    for r in readings {
        let pool = pools
            .entry(Granularity::HourOfDay.bucket_of(&r.timestamp))
            .or_default();
        pool.stamps.insert(r.timestamp);
        match r.category() {
            Category::Supply => pool.supply.push(r.magnitude),
            Category::Demand => pool.demand.push(r.magnitude),
        }
    }

    let mut supply = Vec::with_capacity(pools.len());
    let mut demand = Vec::with_capacity(pools.len());
    for (hour, mut pool) in pools {
        let stamps = pool.stamps.len() as f64;
        pool.supply.sort_by(f64::total_cmp);
        pool.demand.sort_by(f64::total_cmp);
        supply.push((hour, stable_sum(pool.supply) / stamps));
        demand.push((hour, stable_sum(pool.demand) / stamps));
    }
    (supply.into_iter().collect(), demand.into_iter().collect())
}

fn union_buckets(a: &AggregateSeries, b: &AggregateSeries) -> BTreeSet<TimeBucket> {
    a.buckets().chain(b.buckets()).copied().collect()
}
