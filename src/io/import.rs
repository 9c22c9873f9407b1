//! CSV import of raw readings (`datetime,type,plant_name,value`).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::IoError;
use crate::model::RawReading;

/// One source row with the value still as text.
#[derive(Debug, Deserialize)]
struct CsvRow {
    datetime: String,
    #[serde(rename = "type")]
    kind: String,
    plant_name: String,
    value: String,
}

impl From<CsvRow> for RawReading {
    fn from(row: CsvRow) -> Self {
        // Unparseable values become NaN and are rejected at ingest with the
        // other invalid magnitudes.
        let value = row.value.trim().parse::<f64>().unwrap_or(f64::NAN);
        RawReading {
            datetime: row.datetime,
            kind: row.kind,
            entity: row.plant_name,
            value,
        }
    }
}

/// Reads raw readings from CSV with a header row.
///
/// Fields are trimmed. Validation is left to ingest.
///
/// # Errors
///
/// Returns an [`IoError::Csv`] when the header is missing a column or a row
/// has the wrong number of fields.
pub fn read_csv(reader: impl Read) -> Result<Vec<RawReading>, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        out.push(row?.into());
    }
    Ok(out)
}

/// Reads raw readings from a CSV file.
///
/// # Errors
///
/// Returns an [`IoError`] if the file cannot be opened or parsed.
pub fn import_csv(path: &Path) -> Result<Vec<RawReading>, IoError> {
    let file = File::open(path)?;
    let rows = read_csv(BufReader::new(file))?;
    debug!(path = %path.display(), rows = rows.len(), "read input file");
    Ok(rows)
}

/// Reads and concatenates several CSV files in order.
///
/// # Errors
///
/// Returns the first [`IoError`] encountered.
pub fn import_csv_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawReading>, IoError> {
    let mut out = Vec::new();
    for path in paths {
        out.extend(import_csv(path.as_ref())?);
    }
    Ok(out)
}

/// Parses an entity rename table: a flat TOML table of `id = "name"`.
///
/// # Errors
///
/// Returns an [`IoError::Toml`] when the document is not a flat string table.
pub fn parse_rename_map(s: &str) -> Result<BTreeMap<String, String>, IoError> {
    Ok(toml::from_str(s)?)
}

/// Reads an entity rename table from a TOML file.
///
/// # Errors
///
/// Returns an [`IoError`] if the file cannot be read or parsed.
pub fn read_rename_map(path: &Path) -> Result<BTreeMap<String, String>, IoError> {
    parse_rename_map(&fs::read_to_string(path)?)
}
