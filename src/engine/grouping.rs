//! Partitioning of readings into time buckets.

use std::collections::BTreeMap;

use crate::model::{Granularity, Reading, TimeBucket};

/// Readings partitioned by bucket. Buckets with no readings are absent.
pub type Grouped<'a> = BTreeMap<TimeBucket, Vec<&'a Reading>>;

/// Partitions `readings` by the bucket of their timestamp at `granularity`.
///
/// Every reading lands in exactly one bucket. An empty input yields an empty
/// mapping, not an error.
pub fn group<'a, I>(readings: I, granularity: Granularity) -> Grouped<'a>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut grouped: Grouped<'a> = BTreeMap::new();
    for r in readings {
        grouped
            .entry(granularity.bucket_of(&r.timestamp))
            .or_default()
            .push(r);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, SeriesKey, parse_timestamp};

    fn reading(ts: &str, magnitude: f64) -> Reading {
        Reading {
            timestamp: parse_timestamp(ts).unwrap_or_default(),
            key: SeriesKey::supply("solar"),
            entity_id: EntityId::new("plantA"),
            magnitude,
        }
    }

    #[test]
    fn hour_of_day_pools_across_dates() {
        let readings = vec![
            reading("2024-01-01 06:00", 10.0),
            reading("2024-01-02 06:00", 30.0),
            reading("2024-02-15 18:00", 100.0),
        ];
        let g = group(&readings, Granularity::HourOfDay);
        assert_eq!(g.len(), 2);
        assert_eq!(g[&TimeBucket::Hour(6)].len(), 2);
        assert_eq!(g[&TimeBucket::Hour(18)].len(), 1);
    }

    #[test]
    fn month_buckets_are_disjoint_and_exhaustive() {
        let readings = vec![
            reading("2024-01-31 23:00", 1.0),
            reading("2024-02-01 00:00", 2.0),
            reading("2024-02-10 12:00", 3.0),
        ];
        let g = group(&readings, Granularity::Month);
        let total: usize = g.values().map(Vec::len).sum();
        assert_eq!(total, readings.len());
        let keys: Vec<String> = g.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["2024-01", "2024-02"]);
    }

    #[test]
    fn empty_input_gives_empty_mapping() {
        let none: Vec<Reading> = Vec::new();
        assert!(group(&none, Granularity::Month).is_empty());
    }
}
