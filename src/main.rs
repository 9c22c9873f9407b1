//! re100-agg entry point: CLI wiring and config-driven aggregation.

use std::path::Path;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use re100_agg::cli::{self, CliOptions};
use re100_agg::config::RunConfig;
use re100_agg::engine::{ReadingStore, check_snapshot, run};
use re100_agg::io::export::{export_series_csv, export_snapshot_json, read_json, write_json};
use re100_agg::io::import::{import_csv_files, read_rename_map};
use re100_agg::sample;
use re100_agg::snapshot::{AggregateSnapshot, rename_json};

/// Exit code when `--check` finds mismatches.
const EXIT_INCONSISTENT: i32 = 2;

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn load_config(cli: &CliOptions) -> RunConfig {
    let cfg = if let Some(path) = &cli.config {
        RunConfig::from_toml_file(path)
    } else if let Some(name) = &cli.preset {
        RunConfig::from_preset(name)
    } else {
        Ok(RunConfig::default_preset())
    };
    let mut cfg = cfg.unwrap_or_else(|e| fail(e));

    if let Some(seed) = cli.seed {
        cfg.sample.seed = seed;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

/// Renames an existing snapshot document and writes it back out.
///
/// Display names from the configuration's `[entities]` table apply first;
/// entries of a `--rename` table override them.
fn rename_existing(cli: &CliOptions, cfg: &RunConfig, input: &Path) {
    let doc = read_json(input).unwrap_or_else(|e| fail(e));
    let mut mapping = cfg.rename_map();
    if let Some(path) = &cli.rename {
        mapping.extend(read_rename_map(path).unwrap_or_else(|e| fail(e)));
    }
    let renamed = rename_json(&doc, &mapping).unwrap_or_else(|e| fail(e));
    match &cli.out {
        Some(path) => {
            write_json(&renamed, path).unwrap_or_else(|e| fail(e));
            eprintln!("Renamed snapshot written to {}", path.display());
        }
        None => match serde_json::to_string_pretty(&renamed) {
            Ok(text) => println!("{text}"),
            Err(e) => fail(e),
        },
    }
}

fn aggregate(cli: &CliOptions, cfg: &RunConfig) -> AggregateSnapshot {
    let raw = if cli.sample {
        let opts = cfg.to_sample_options().unwrap_or_else(|e| fail(e));
        sample::generate(&opts).unwrap_or_else(|e| fail(e))
    } else {
        import_csv_files(&cli.inputs).unwrap_or_else(|e| fail(e))
    };

    let ingest_opts = cfg.to_ingest_options().unwrap_or_else(|e| fail(e));
    let agg_opts = cfg.to_aggregation_options().unwrap_or_else(|e| fail(e));
    let (store, report) = ReadingStore::ingest(raw, &ingest_opts);
    info!(
        accepted = report.accepted,
        skipped = report.skipped(),
        filtered = report.filtered_out,
        "ingest complete"
    );

    let snapshot = run(&store, report, &agg_opts);
    match &cli.rename {
        Some(path) => {
            let mapping = read_rename_map(path).unwrap_or_else(|e| fail(e));
            snapshot.rename(&mapping).unwrap_or_else(|e| fail(e))
        }
        None => snapshot,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });

    let cfg = load_config(&cli);
    if let Some(input) = &cli.snapshot_in {
        rename_existing(&cli, &cfg, input);
        return;
    }

    let snapshot = aggregate(&cli, &cfg);

    println!("{}", snapshot.summary);
    if !snapshot.errors.is_empty() {
        eprintln!("{} series failed:", snapshot.errors.len());
        for f in &snapshot.errors {
            eprintln!("  {}/{}/{}: {}", f.view, f.group, f.series, f.error);
        }
    }

    if let Some(path) = &cli.out {
        export_snapshot_json(&snapshot, path).unwrap_or_else(|e| fail(e));
        eprintln!("Snapshot written to {}", path.display());
    }
    if let Some(path) = &cli.series_csv {
        export_series_csv(&snapshot, path).unwrap_or_else(|e| fail(e));
        eprintln!("Series written to {}", path.display());
    }

    let consistency = check_snapshot(&snapshot, cfg.aggregation.tolerance);
    if cli.check {
        if consistency.ok {
            println!("\nConsistency: ok");
        } else {
            println!("\nConsistency: {} mismatch(es)", consistency.mismatches.len());
            for m in &consistency.mismatches {
                println!(
                    "  {} @ {}: expected {:.6}, actual {:.6}, delta {:+.3e}",
                    m.scope, m.bucket, m.expected, m.actual, m.delta
                );
            }
        }
    }

    if cli.serve {
        serve(snapshot, consistency.clone(), cli.port);
    } else if cli.tui {
        open_tui(snapshot, consistency.mismatches.len());
    }

    if cli.check && !consistency.ok {
        process::exit(EXIT_INCONSISTENT);
    }
}

#[cfg(feature = "api")]
fn serve(snapshot: AggregateSnapshot, consistency: re100_agg::engine::ConsistencyReport, port: u16) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let state = Arc::new(re100_agg::api::AppState {
        snapshot,
        consistency,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new()
        .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
    if let Err(e) = rt.block_on(re100_agg::api::serve(state, addr)) {
        fail(format!("API server on {addr}: {e}"));
    }
}

#[cfg(not(feature = "api"))]
fn serve(_: AggregateSnapshot, _: re100_agg::engine::ConsistencyReport, _: u16) {
    fail("`--serve` requires building with `--features api`");
}

#[cfg(feature = "tui")]
fn open_tui(snapshot: AggregateSnapshot, mismatches: usize) {
    if let Err(e) = re100_agg::tui::run(snapshot, mismatches) {
        fail(format!("TUI: {e}"));
    }
}

#[cfg(not(feature = "tui"))]
fn open_tui(_: AggregateSnapshot, _: usize) {
    fail("`--tui` requires building with `--features tui`");
}
