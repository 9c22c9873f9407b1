//! Data model: readings, entities, time buckets, and units.

/// Time-bucket keys and granularities.
pub mod bucket;
pub mod types;
/// Unit normalization to GWh.
pub mod units;

pub use bucket::{Granularity, TimeBucket};
pub use types::{
    Category, DisplayNames, Entity, EntityId, RawReading, Reading, SeriesKey, Subtype,
    parse_timestamp,
};
pub use units::{Unit, normalize};
