//! Error types for the aggregation engine and its file surfaces.

use thiserror::Error;

/// Failures raised by the aggregation engine.
///
/// Per-reading variants (`InvalidMagnitude`, `UnknownCategory`,
/// `InvalidTimestamp`) reject a single reading during ingest and are counted
/// rather than propagated. `EmptyBucket` fails one series computation only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid magnitude {value}: must be finite and non-negative")]
    InvalidMagnitude { value: f64 },
    #[error("unknown category tag \"{tag}\"")]
    UnknownCategory { tag: String },
    #[error("invalid timestamp \"{raw}\"")]
    InvalidTimestamp { raw: String },
    #[error("unknown unit \"{unit}\", expected one of wh, kwh, mwh, gwh")]
    UnknownUnit { unit: String },
    #[error("mean requested over empty bucket {bucket}")]
    EmptyBucket { bucket: String },
    #[error("rename would merge \"{from}\" into existing key \"{to}\"")]
    RenameCollision { from: String, to: String },
    #[error("sample plant \"{plant}\" needs 0 <= min_gwh <= max_gwh, got {min}..={max}")]
    InvalidSampleRange { plant: String, min: f64, max: f64 },
}

/// Failures reading inputs or writing outputs.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
