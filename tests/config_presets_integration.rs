mod common;

use re100_agg::config::RunConfig;
use re100_agg::engine::{
    AggregationOptions, DEFAULT_TOLERANCE, IngestOptions, ReadingStore, check_snapshot,
    compare_snapshots, run,
};
use re100_agg::sample;
use re100_agg::snapshot::{TOTAL_KEY, ViewKind};

/// The `sample` preset shortened to a few days.
fn short_sample_preset(days: u32) -> RunConfig {
    let mut cfg = RunConfig::sample_preset();
    cfg.sample.days = days;
    cfg
}

#[test]
fn every_preset_validates_and_converts() {
    for name in RunConfig::PRESETS {
        let cfg = RunConfig::from_preset(name).expect("preset should load");
        assert!(cfg.validate().is_empty(), "preset {name} should be valid");
        assert!(cfg.to_ingest_options().is_ok());
        assert!(cfg.to_aggregation_options().is_ok());
        assert!(cfg.to_sample_options().is_ok());
    }
}

#[test]
fn sample_preset_labels_series_by_display_name() {
    let cfg = short_sample_preset(2);
    let raw = sample::generate(&cfg.to_sample_options().expect("sample options"))
        .expect("valid sample plants");
    let (store, report) =
        ReadingStore::ingest(raw, &cfg.to_ingest_options().expect("ingest options"));
    let snap = run(
        &store,
        report,
        &cfg.to_aggregation_options().expect("aggregation options"),
    );

    let wind = &snap.view(ViewKind::HourlyProfile)["wind"];
    assert!(wind.contains_key("Gunsan Offshore Wind"));
    assert!(!wind.contains_key("wind_plant1"));
    assert_eq!(wind[TOTAL_KEY].len(), 24);

    let entity = &snap.summary.entities["solar"]["Onshore Solar"];
    assert_eq!(entity.capacity_gw, Some(1.2));
    assert!(check_snapshot(&snap, DEFAULT_TOLERANCE).ok);
}

#[test]
fn renaming_after_the_run_matches_naming_at_ingest() {
    let cfg = short_sample_preset(2);
    let raw = sample::generate(&cfg.to_sample_options().expect("sample options"))
        .expect("valid sample plants");
    let agg = cfg.to_aggregation_options().expect("aggregation options");

    let named = common::aggregate_with(
        raw.clone(),
        &cfg.to_ingest_options().expect("ingest options"),
        &agg,
    );
    let renamed = common::aggregate_with(raw, &IngestOptions::default(), &agg)
        .rename(&cfg.rename_map())
        .expect("no collisions");

    let report = compare_snapshots(&named, &renamed, 0.0);
    assert!(report.ok, "{:?}", report.mismatches);
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.toml");
    std::fs::write(
        &path,
        r#"
[input]
source_unit = "mwh"

[aggregation]
hourly_fill = "zero"
demand_filter = ["compA"]

[entities.plantA]
display_name = "Plant A"
"#,
    )
    .expect("write config");

    let cfg = RunConfig::from_toml_file(&path).expect("config should parse");
    assert!(cfg.validate().is_empty());

    let rows = vec![
        re100_agg::model::RawReading {
            datetime: "2024-01-01 12:00".to_string(),
            kind: "solar".to_string(),
            entity: "plantA".to_string(),
            value: 5_000.0,
        },
        re100_agg::model::RawReading {
            datetime: "2024-01-01 12:00".to_string(),
            kind: "demand".to_string(),
            entity: "compB".to_string(),
            value: 1_000.0,
        },
    ];
    let snap = common::aggregate_with(
        rows,
        &cfg.to_ingest_options().expect("ingest options"),
        &AggregationOptions::default(),
    );
    let jan = re100_agg::model::TimeBucket::Month {
        year: 2024,
        month: 1,
    };
    let plant = snap.series(ViewKind::Monthly, "solar", "Plant A");
    assert_eq!(plant.and_then(|s| s.get(&jan)), Some(5.0));
    assert_eq!(snap.ingest.filtered_out, 1);
    assert!(!snap.view(ViewKind::Monthly).contains_key("demand"));
}
