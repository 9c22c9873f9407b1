//! Snapshot export: pretty JSON and long-format series CSV.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use serde_json::Value;

use crate::error::IoError;
use crate::model::RawReading;
use crate::snapshot::{AggregateSnapshot, ViewKind};

/// Column header of the long-format series export.
const SERIES_HEADER: [&str; 5] = ["view", "group", "series", "bucket", "value"];

/// Writes every series of a snapshot as one CSV row per bucket.
///
/// Rows are ordered by view, group, series and bucket, so identical snapshots
/// produce identical bytes.
///
/// # Errors
///
/// Returns an [`IoError`] if writing fails.
pub fn write_series_csv(snapshot: &AggregateSnapshot, writer: impl Write) -> Result<(), IoError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SERIES_HEADER)?;

    for kind in ViewKind::ALL {
        for (group, table) in snapshot.view(kind) {
            for (series, values) in table {
                for (bucket, value) in values.iter() {
                    wtr.write_record(&[
                        kind.as_str().to_string(),
                        group.clone(),
                        series.clone(),
                        bucket.to_string(),
                        value.to_string(),
                    ])?;
                }
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the series of a snapshot to a CSV file.
///
/// # Errors
///
/// Returns an [`IoError`] if file creation or writing fails.
pub fn export_series_csv(snapshot: &AggregateSnapshot, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_series_csv(snapshot, io::BufWriter::new(file))
}

/// Writes a snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns an [`IoError`] if serialization or writing fails.
pub fn write_snapshot_json(snapshot: &AggregateSnapshot, mut writer: impl Write) -> Result<(), IoError> {
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Exports a snapshot to a JSON file.
///
/// # Errors
///
/// Returns an [`IoError`] if file creation or writing fails.
pub fn export_snapshot_json(snapshot: &AggregateSnapshot, path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_snapshot_json(snapshot, io::BufWriter::new(file))
}

/// Reads any JSON document, e.g. a snapshot written by an earlier run.
///
/// # Errors
///
/// Returns an [`IoError`] if the file cannot be read or is not JSON.
pub fn read_json(path: &Path) -> Result<Value, IoError> {
    let file = File::open(path)?;
    let mut buf = String::new();
    BufReader::new(file).read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Writes a JSON document, pretty-printed.
///
/// # Errors
///
/// Returns an [`IoError`] if file creation or writing fails.
pub fn write_json(value: &Value, path: &Path) -> Result<(), IoError> {
    let mut wtr = io::BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut wtr, value)?;
    writeln!(wtr)?;
    wtr.flush()?;
    Ok(())
}

/// Writes raw readings in the source CSV layout.
///
/// # Errors
///
/// Returns an [`IoError`] if writing fails.
pub fn write_readings_csv(readings: &[RawReading], writer: impl Write) -> Result<(), IoError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for r in readings {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports raw readings to a CSV file in the source layout.
///
/// # Errors
///
/// Returns an [`IoError`] if file creation or writing fails.
pub fn export_readings_csv(readings: &[RawReading], path: &Path) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_readings_csv(readings, io::BufWriter::new(file))
}
