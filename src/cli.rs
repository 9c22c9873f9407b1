use std::env;
use std::path::PathBuf;

/// Default port of the REST API.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub inputs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub sample: bool,
    pub seed: Option<u64>,
    pub out: Option<PathBuf>,
    pub series_csv: Option<PathBuf>,
    pub rename: Option<PathBuf>,
    pub snapshot_in: Option<PathBuf>,
    pub check: bool,
    pub serve: bool,
    pub port: u16,
    pub tui: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut inputs = Vec::new();
    let mut config = None;
    let mut preset = None;
    let mut sample = false;
    let mut seed = None;
    let mut out = None;
    let mut series_csv = None;
    let mut rename = None;
    let mut snapshot_in = None;
    let mut check = false;
    let mut serve = false;
    let mut port = None;
    let mut tui = false;

    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --input (expected a CSV file path)")?;
                inputs.push(PathBuf::from(path));
            }
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--sample" => sample = true,
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                if seed.replace(value).is_some() {
                    return Err("--seed provided more than once".to_string());
                }
            }
            "--out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --out (expected a file path)")?;
                if out.replace(PathBuf::from(path)).is_some() {
                    return Err("--out provided more than once".to_string());
                }
            }
            "--series-csv" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --series-csv (expected a file path)")?;
                if series_csv.replace(PathBuf::from(path)).is_some() {
                    return Err("--series-csv provided more than once".to_string());
                }
            }
            "--rename" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --rename (expected a TOML file path)")?;
                if rename.replace(PathBuf::from(path)).is_some() {
                    return Err("--rename provided more than once".to_string());
                }
            }
            "--snapshot-in" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --snapshot-in (expected a JSON file path)")?;
                if snapshot_in.replace(PathBuf::from(path)).is_some() {
                    return Err("--snapshot-in provided more than once".to_string());
                }
            }
            "--check" => check = true,
            "--serve" => serve = true,
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let value = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
                port = Some(value);
            }
            "--tui" => tui = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if let Some(path) = &snapshot_in {
        if !inputs.is_empty() || sample {
            return Err(format!(
                "`--snapshot-in {}` cannot be combined with `--input` or `--sample`",
                path.display()
            ));
        }
        if rename.is_none() && out.is_none() {
            return Err("`--snapshot-in` needs `--rename` or `--out`".to_string());
        }
        if serve || tui || check || series_csv.is_some() {
            return Err(
                "`--snapshot-in` only supports `--rename`, `--config`, `--preset` and `--out`"
                    .to_string(),
            );
        }
    } else if inputs.is_empty() && !sample {
        return Err("no data source: pass `--input <csv>`, `--sample` or `--snapshot-in <json>`".to_string());
    }

    if !inputs.is_empty() && sample {
        return Err("arguments `--input` and `--sample` are mutually exclusive".to_string());
    }

    if seed.is_some() && !sample {
        return Err("`--seed` only applies with `--sample`".to_string());
    }

    if port.is_some() && !serve {
        return Err("`--port` only applies with `--serve`".to_string());
    }

    if serve && tui {
        return Err("arguments `--serve` and `--tui` are mutually exclusive".to_string());
    }

    Ok(CliOptions {
        inputs,
        config,
        preset,
        sample,
        seed,
        out,
        series_csv,
        rename,
        snapshot_in,
        check,
        serve,
        port: port.unwrap_or(DEFAULT_PORT),
        tui,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("re100-agg: aggregate renewable supply and demand readings");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  re100-agg (--input <csv>... | --sample [--seed <u64>]) [OPTIONS]");
    eprintln!("  re100-agg --snapshot-in <json> [--rename <toml>] [--config <path> | --preset <name>] [--out <json>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --input <path>          Read readings from CSV (repeatable)");
    eprintln!("  --sample                Generate seeded synthetic readings");
    eprintln!("  --seed <u64>            Override the sample seed");
    eprintln!("  --config <path>         Load run configuration from TOML");
    eprintln!("  --preset <name>         Use a built-in preset (default, sample)");
    eprintln!("  --out <path>            Write the snapshot as JSON");
    eprintln!("  --series-csv <path>     Write every series as long-format CSV");
    eprintln!("  --rename <path>         Rename entity keys (TOML table id = \"name\")");
    eprintln!("  --snapshot-in <path>    Rename an existing snapshot with [entities] names and --rename");
    eprintln!("  --check                 Run consistency checks; exit 2 on mismatch");
    eprintln!("  --serve                 Serve the snapshot over HTTP (feature `api`)");
    eprintln!("  --port <u16>            API server port (default: 3000)");
    eprintln!("  --tui                   Open the terminal dashboard (feature `tui`)");
    eprintln!("  --help                  Show this help message");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn supports_repeated_inputs() {
        let opts = parse_args_from(args(&["--input", "a.csv", "--input", "b.csv"]))
            .expect("parse should succeed");
        assert_eq!(opts.inputs.len(), 2);
        assert!(!opts.sample);
        assert_eq!(opts.port, 3000);
    }

    #[test]
    fn supports_sample_with_seed() {
        let opts = parse_args_from(args(&["--sample", "--seed", "9", "--preset", "sample"]))
            .expect("parse should succeed");
        assert!(opts.sample);
        assert_eq!(opts.seed, Some(9));
        assert_eq!(opts.preset.as_deref(), Some("sample"));
    }

    #[test]
    fn supports_rename_of_existing_snapshot() {
        let opts = parse_args_from(args(&[
            "--snapshot-in",
            "in.json",
            "--rename",
            "names.toml",
            "--out",
            "out.json",
        ]))
        .expect("parse should succeed");
        assert_eq!(
            opts.snapshot_in.as_deref().and_then(|p| p.to_str()),
            Some("in.json")
        );
        assert!(opts.rename.is_some());
    }

    #[test]
    fn snapshot_rename_can_take_names_from_a_preset() {
        let opts = parse_args_from(args(&[
            "--snapshot-in",
            "in.json",
            "--preset",
            "sample",
            "--out",
            "out.json",
        ]))
        .expect("parse should succeed");
        assert!(opts.rename.is_none());
        assert_eq!(opts.preset.as_deref(), Some("sample"));
    }

    #[test]
    fn requires_a_data_source() {
        let err = parse_args_from(args(&["--check"])).err().unwrap_or_default();
        assert!(err.contains("no data source"));
    }

    #[test]
    fn rejects_conflicting_sources() {
        assert!(parse_args_from(args(&["--input", "a.csv", "--sample"])).is_err());
        assert!(parse_args_from(args(&["--sample", "--config", "c.toml", "--preset", "default"])).is_err());
        assert!(parse_args_from(args(&["--snapshot-in", "s.json", "--sample", "--out", "o.json"])).is_err());
    }

    #[test]
    fn rejects_bad_numbers_and_unknown_flags() {
        assert!(parse_args_from(args(&["--sample", "--seed", "abc"])).is_err());
        assert!(parse_args_from(args(&["--sample", "--serve", "--port", "99999"])).is_err());
        assert!(parse_args_from(args(&["--sample", "--bogus"])).is_err());
        assert!(parse_args_from(args(&["--input"])).is_err());
    }

    #[test]
    fn port_requires_serve() {
        assert!(parse_args_from(args(&["--sample", "--port", "8080"])).is_err());
        let opts = parse_args_from(args(&["--sample", "--serve", "--port", "8080"]))
            .expect("parse should succeed");
        assert_eq!(opts.port, 8080);
    }
}
