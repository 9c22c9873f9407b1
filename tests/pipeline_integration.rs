//! Integration tests for the ingest → aggregate → check pipeline.

mod common;

use std::collections::BTreeMap;

use common::reading;
use re100_agg::engine::{
    AggregationOptions, DEFAULT_TOLERANCE, HourlyFill, IngestOptions, check_snapshot,
    compare_snapshots,
};
use re100_agg::model::{TimeBucket, parse_timestamp};
use re100_agg::snapshot::{TOTAL_KEY, ViewKind};

const JAN: TimeBucket = TimeBucket::Month {
    year: 2024,
    month: 1,
};

fn value(
    snap: &re100_agg::snapshot::AggregateSnapshot,
    kind: ViewKind,
    group: &str,
    series: &str,
    bucket: &TimeBucket,
) -> Option<f64> {
    snap.series(kind, group, series).and_then(|s| s.get(bucket))
}

#[test]
fn month_rollup_of_two_plants() {
    let snap = common::aggregate(vec![
        reading("2024-01-03 10:00", "solar", "plantA", 100.0),
        reading("2024-01-20 14:00", "solar", "plantB", 50.0),
    ]);

    let monthly = snap.view(ViewKind::Monthly);
    let solar = &monthly["solar"];
    assert_eq!(solar.len(), 3);
    assert_eq!(solar["plantA"].to_keyed(), BTreeMap::from([("2024-01".to_string(), 100.0)]));
    assert_eq!(solar["plantB"].to_keyed(), BTreeMap::from([("2024-01".to_string(), 50.0)]));
    assert_eq!(solar[TOTAL_KEY].to_keyed(), BTreeMap::from([("2024-01".to_string(), 150.0)]));
}

#[test]
fn coverage_below_and_above_demand() {
    let partial = common::aggregate(vec![
        reading("2024-01-03 10:00", "solar", "plantA", 80.0),
        reading("2024-01-03 10:00", "demand", "compA", 100.0),
    ]);
    assert_eq!(partial.coverage_rate.get(&JAN), Some(80.0));

    let over = common::aggregate(vec![
        reading("2024-01-03 10:00", "solar", "plantA", 120.0),
        reading("2024-01-03 10:00", "demand", "compA", 100.0),
    ]);
    assert_eq!(over.coverage_rate.get(&JAN), Some(100.0));
    let detail = &over.coverage_detail[&JAN];
    assert_eq!(detail.uncapped_ratio, Some(120.0));
    assert_eq!(detail.surplus, 20.0);
    assert_eq!(detail.external_power, 0.0);
}

#[test]
fn zero_demand_gives_zero_coverage() {
    let snap = common::aggregate(vec![
        reading("2024-01-03 10:00", "solar", "plantA", 75.0),
        reading("2024-01-03 10:00", "demand", "compA", 0.0),
    ]);
    assert_eq!(snap.coverage_rate.get(&JAN), Some(0.0));
    assert_eq!(snap.coverage_detail[&JAN].uncapped_ratio, None);
}

#[test]
fn hour_of_day_mean_pools_dates() {
    let rows = vec![
        reading("2024-01-01 06:00", "wind", "windA", 10.0),
        reading("2024-01-02 06:00", "wind", "windA", 30.0),
        reading("2024-01-02 18:00", "wind", "windA", 100.0),
    ];

    let sparse = common::aggregate(rows.clone());
    let profile = sparse
        .series(ViewKind::HourlyProfile, "wind", "windA")
        .expect("wind profile");
    assert_eq!(profile.get(&TimeBucket::Hour(6)), Some(20.0));
    assert_eq!(profile.get(&TimeBucket::Hour(18)), Some(100.0));
    assert_eq!(profile.len(), 2);

    let zero = common::aggregate_with(
        rows,
        &IngestOptions::default(),
        &AggregationOptions {
            hourly_fill: HourlyFill::Zero,
            ..AggregationOptions::default()
        },
    );
    let profile = zero
        .series(ViewKind::HourlyProfile, "wind", "windA")
        .expect("wind profile");
    assert_eq!(profile.len(), 24);
    assert_eq!(profile.get(&TimeBucket::Hour(7)), Some(0.0));
    assert_eq!(profile.get(&TimeBucket::Hour(6)), Some(20.0));
}

#[test]
fn month_values_equal_sum_of_readings() {
    let rows = common::sample_readings(10);
    let snap = common::aggregate(rows.clone());

    let mut expected = 0.0;
    for r in rows.iter().filter(|r| r.entity == "solar_plant2") {
        let ts = parse_timestamp(&r.datetime).expect("sample timestamps parse");
        assert_eq!(ts.format("%Y-%m").to_string(), "2024-01");
        expected += r.value / 1e6;
    }
    let actual = value(&snap, ViewKind::Monthly, "solar", "solar_plant2", &JAN).expect("series");
    assert!(
        (actual - expected).abs() <= 1e-9 * expected,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn sample_snapshot_is_consistent_and_bounded() {
    let snap = common::sample_snapshot(31);
    let report = check_snapshot(&snap, DEFAULT_TOLERANCE);
    assert!(report.ok, "{:?}", report.mismatches);

    for (_, rate) in snap.coverage_rate.iter().chain(snap.hourly_coverage_rate.iter()) {
        assert!((0.0..=100.0).contains(&rate), "rate {rate} out of bounds");
    }
    assert_eq!(snap.coverage_rate.len(), 1);
    assert_eq!(snap.hourly_coverage_rate.len(), 24);
    assert!(snap.errors.is_empty());
}

#[test]
fn input_order_does_not_change_results() {
    let rows = common::sample_readings(5);
    let forward = common::aggregate(rows.clone());
    let backward = common::aggregate(rows.into_iter().rev().collect());
    let report = compare_snapshots(&forward, &backward, DEFAULT_TOLERANCE);
    assert!(report.ok, "{:?}", report.mismatches);
}

#[test]
fn seeded_sample_is_deterministic() {
    let a = common::sample_snapshot(3);
    let b = common::sample_snapshot(3);
    assert_eq!(
        a.to_json_pretty().expect("serialize"),
        b.to_json_pretty().expect("serialize")
    );
}

#[test]
fn rename_preserves_values() {
    let snap = common::sample_snapshot(4);
    let forward = BTreeMap::from([
        ("solar_plant1".to_string(), "Onshore Solar".to_string()),
        ("wind_plant3".to_string(), "Southwest Offshore Wind".to_string()),
    ]);
    let renamed = snap.rename(&forward).expect("no collisions");

    for kind in ViewKind::ALL {
        assert_eq!(
            renamed.series(kind, "solar", "Onshore Solar"),
            snap.series(kind, "solar", "solar_plant1"),
            "{kind}"
        );
        assert!(renamed.series(kind, "solar", "solar_plant1").is_none());
        assert_eq!(
            renamed.series(kind, "wind", TOTAL_KEY),
            snap.series(kind, "wind", TOTAL_KEY)
        );
    }
    assert_eq!(renamed.coverage_rate, snap.coverage_rate);

    let back: BTreeMap<String, String> =
        forward.into_iter().map(|(from, to)| (to, from)).collect();
    let restored = renamed.rename(&back).expect("no collisions");
    assert!(compare_snapshots(&snap, &restored, 0.0).ok);
}

#[test]
fn rename_onto_existing_entity_fails() {
    let snap = common::sample_snapshot(1);
    let mapping = BTreeMap::from([("solar_plant1".to_string(), "solar_plant2".to_string())]);
    assert!(snap.rename(&mapping).is_err());
}

#[test]
fn invalid_rows_are_counted_not_fatal() {
    let rows = vec![
        reading("2024-01-03 10:00", "solar", "plantA", 10.0),
        reading("not a date", "solar", "plantA", 10.0),
        reading("2024-01-03 10:00", "nuclear", "plantN", 10.0),
        reading("2024-01-03 11:00", "solar", "plantA", -1.0),
    ];
    let snap = common::aggregate(rows);
    assert_eq!(snap.ingest.accepted, 1);
    assert_eq!(snap.ingest.skipped(), 3);
    assert_eq!(value(&snap, ViewKind::Monthly, "solar", TOTAL_KEY, &JAN), Some(10.0));
}
