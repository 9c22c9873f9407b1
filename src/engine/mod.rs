//! Aggregation engine: store, grouping, reduction, coverage and checks.

pub mod aggregate;
/// Consistency checks over snapshots and roll-ups.
pub mod consistency;
pub mod coverage;
/// Time-bucket partitioning of readings.
pub mod grouping;
pub mod pipeline;
pub mod store;
pub mod summary;

pub use aggregate::{
    AggregateSeries, Reduction, aggregate, daily_sum, hourly_profile_mean, hourly_total_sum,
    monthly_sum, rollup, zero_fill_hours,
};
pub use consistency::{
    ConsistencyReport, DEFAULT_TOLERANCE, Mismatch, check_rollup, check_snapshot,
    compare_snapshots,
};
pub use coverage::{CoverageDetail, CoverageRate, coverage_detail, coverage_rate, hourly_balance};
pub use grouping::{Grouped, group};
pub use pipeline::{AggregationOptions, HourlyFill, run};
pub use store::{EntityDetails, IngestOptions, IngestReport, ReadingStore};
pub use summary::{EntityTotal, SummaryReport};
