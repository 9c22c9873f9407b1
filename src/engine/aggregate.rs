//! Reduction of grouped readings into aggregate series, and roll-ups.

use std::collections::BTreeMap;

use serde::Serialize;

use super::grouping::{Grouped, group};
use crate::error::EngineError;
use crate::model::{Granularity, Reading, TimeBucket};

/// How the readings of one bucket collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
}

/// Bucket → value mapping for one (category, subtype, entity-or-total) tuple.
///
/// Values are in GWh. Read-only once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateSeries {
    values: BTreeMap<TimeBucket, f64>,
}

impl AggregateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &TimeBucket) -> Option<f64> {
        self.values.get(bucket).copied()
    }

    /// Value at `bucket`, treating an absent bucket as zero.
    pub fn get_or_zero(&self, bucket: &TimeBucket) -> f64 {
        self.get(bucket).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeBucket, f64)> {
        self.values.iter().map(|(b, v)| (b, *v))
    }

    pub fn buckets(&self) -> impl Iterator<Item = &TimeBucket> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all bucket values.
    pub fn total(&self) -> f64 {
        stable_sum(self.values.values().copied())
    }

    /// Bucket values keyed by their literal snapshot key.
    pub fn to_keyed(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(b, v)| (b.to_string(), *v))
            .collect()
    }
}

impl FromIterator<(TimeBucket, f64)> for AggregateSeries {
    fn from_iter<I: IntoIterator<Item = (TimeBucket, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Reduces every bucket of `grouped` with `reduction`.
///
/// # Errors
///
/// Returns [`EngineError::EmptyBucket`] when `reduction` is `Mean` and a
/// bucket holds no readings. `Sum` over an empty bucket is 0.
pub fn aggregate(grouped: &Grouped<'_>, reduction: Reduction) -> Result<AggregateSeries, EngineError> {
    let mut values = BTreeMap::new();
    for (bucket, readings) in grouped {
        let sum = stable_sum(readings.iter().map(|r| r.magnitude));
        let value = match reduction {
            Reduction::Sum => sum,
            Reduction::Mean => {
                if readings.is_empty() {
                    return Err(EngineError::EmptyBucket {
                        bucket: bucket.to_string(),
                    });
                }
                sum / readings.len() as f64
            }
        };
        values.insert(*bucket, value);
    }
    Ok(AggregateSeries { values })
}

/// Generation or consumption summed per calendar month.
pub fn monthly_sum<'a, I>(readings: I) -> AggregateSeries
where
    I: IntoIterator<Item = &'a Reading>,
{
    sum_by(readings, Granularity::Month)
}

/// Energy summed per calendar day.
pub fn daily_sum<'a, I>(readings: I) -> AggregateSeries
where
    I: IntoIterator<Item = &'a Reading>,
{
    sum_by(readings, Granularity::Day)
}

/// Total energy at each hour of day across the whole data set.
pub fn hourly_total_sum<'a, I>(readings: I) -> AggregateSeries
where
    I: IntoIterator<Item = &'a Reading>,
{
    sum_by(readings, Granularity::HourOfDay)
}

/// Typical daily profile: mean reading at each hour of day.
///
/// Hours with no readings are absent; use [`zero_fill_hours`] for a dense
/// profile.
///
/// # Errors
///
/// Propagates [`EngineError::EmptyBucket`] from [`aggregate`].
pub fn hourly_profile_mean<'a, I>(readings: I) -> Result<AggregateSeries, EngineError>
where
    I: IntoIterator<Item = &'a Reading>,
{
    aggregate(&group(readings, Granularity::HourOfDay), Reduction::Mean)
}

fn sum_by<'a, I>(readings: I, granularity: Granularity) -> AggregateSeries
where
    I: IntoIterator<Item = &'a Reading>,
{
    let grouped = group(readings, granularity);
    let values = grouped
        .iter()
        .map(|(b, rs)| (*b, stable_sum(rs.iter().map(|r| r.magnitude))))
        .collect();
    AggregateSeries { values }
}

/// Sums per-entity series into a `total` series.
///
/// Covers every bucket present in any input; an entity absent at a bucket
/// contributes zero.
pub fn rollup<'a, I>(per_entity: I) -> AggregateSeries
where
    I: IntoIterator<Item = &'a AggregateSeries>,
{
    let mut parts: BTreeMap<TimeBucket, Vec<f64>> = BTreeMap::new();
    for series in per_entity {
        for (bucket, value) in series.iter() {
            parts.entry(*bucket).or_default().push(value);
        }
    }
    parts
        .into_iter()
        .map(|(b, vs)| (b, stable_sum(vs)))
        .collect()
}

/// Hour-of-day series with an explicit zero for every hour 0..=23 that has
/// no value.
pub fn zero_fill_hours(series: &AggregateSeries) -> AggregateSeries {
    TimeBucket::all_hours()
        .map(|h| (h, series.get_or_zero(&h)))
        .chain(
            series
                .iter()
                .filter(|(b, _)| !matches!(b, TimeBucket::Hour(_)))
                .map(|(b, v)| (*b, v)),
        )
        .collect()
}

/// Compensated (Neumaier) summation, so results do not drift with input order.
pub(crate) fn stable_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0_f64;
    let mut comp = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            comp += (sum - t) + v;
        } else {
            comp += (v - t) + sum;
        }
        sum = t;
    }
    sum + comp
}
