//! API response and query types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::{AggregateSeries, CoverageDetail, CoverageRate};
use crate::model::TimeBucket;

/// Coverage figures of the snapshot.
#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    /// Capped coverage per month (%).
    pub monthly: CoverageRate,
    /// Per-month supply, demand, external power and surplus.
    pub detail: BTreeMap<TimeBucket, CoverageDetail>,
    /// Capped coverage per hour of day from the mean profiles (%).
    pub hourly: CoverageRate,
}

/// One series with its address in the snapshot.
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub view: String,
    pub group: String,
    pub series: String,
    /// Bucket key to value (GWh).
    pub values: AggregateSeries,
}

/// Query parameters of the series endpoint.
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    /// View name; defaults to `monthly`.
    pub view: Option<String>,
    /// Entity label or `total`; defaults to `total`.
    pub series: Option<String>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
