//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use re100_agg::engine::{AggregationOptions, IngestOptions, ReadingStore, run};
use re100_agg::model::RawReading;
use re100_agg::sample::{self, SampleOptions};
use re100_agg::snapshot::AggregateSnapshot;

/// One raw reading with `gwh` expressed in the default kWh source unit.
pub fn reading(datetime: &str, kind: &str, entity: &str, gwh: f64) -> RawReading {
    RawReading {
        datetime: datetime.to_string(),
        kind: kind.to_string(),
        entity: entity.to_string(),
        value: gwh * 1e6,
    }
}

/// Ingests `rows` with default options and runs one aggregation.
pub fn aggregate(rows: Vec<RawReading>) -> AggregateSnapshot {
    aggregate_with(rows, &IngestOptions::default(), &AggregationOptions::default())
}

pub fn aggregate_with(
    rows: Vec<RawReading>,
    ingest: &IngestOptions,
    options: &AggregationOptions,
) -> AggregateSnapshot {
    let (store, report) = ReadingStore::ingest(rows, ingest);
    run(&store, report, options)
}

/// Seeded sample readings (seed 42, January 2024, `days` days).
pub fn sample_readings(days: u32) -> Vec<RawReading> {
    sample::generate(&SampleOptions {
        days,
        ..SampleOptions::default()
    })
    .expect("default sample plants are valid")
}

/// Snapshot of `days` days of seeded sample readings.
pub fn sample_snapshot(days: u32) -> AggregateSnapshot {
    aggregate(sample_readings(days))
}
