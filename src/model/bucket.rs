//! Time buckets: the grouping keys derived from reading timestamps.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

/// Resolution at which readings are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Hour of day, 0..=23. Readings from all dates pool into the same bucket,
    /// giving a typical-day profile rather than an instantaneous total.
    HourOfDay,
    /// Calendar day, `YYYY-MM-DD`.
    Day,
    /// Calendar month, `YYYY-MM`.
    Month,
}

impl Granularity {
    /// Bucket containing `ts` at this granularity.
    pub fn bucket_of(self, ts: &NaiveDateTime) -> TimeBucket {
        match self {
            Granularity::HourOfDay => TimeBucket::Hour(ts.hour() as u8),
            Granularity::Day => TimeBucket::Day(ts.date()),
            Granularity::Month => TimeBucket::Month {
                year: ts.year(),
                month: ts.month() as u8,
            },
        }
    }
}

/// A granularity-specific grouping key.
///
/// Ordering is chronological within a granularity. Keys render as the literal
/// strings used in snapshots: `"0"`..`"23"`, `"YYYY-MM-DD"`, `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    Hour(u8),
    Day(NaiveDate),
    Month { year: i32, month: u8 },
}

impl TimeBucket {
    pub fn granularity(&self) -> Granularity {
        match self {
            TimeBucket::Hour(_) => Granularity::HourOfDay,
            TimeBucket::Day(_) => Granularity::Day,
            TimeBucket::Month { .. } => Granularity::Month,
        }
    }

    /// All 24 hour-of-day buckets in order.
    pub fn all_hours() -> impl Iterator<Item = TimeBucket> {
        (0u8..24).map(TimeBucket::Hour)
    }

    /// Parses a snapshot key back into a bucket of the given granularity.
    pub fn parse(granularity: Granularity, key: &str) -> Option<TimeBucket> {
        match granularity {
            Granularity::HourOfDay => key
                .parse::<u8>()
                .ok()
                .filter(|h| *h < 24)
                .map(TimeBucket::Hour),
            Granularity::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .ok()
                .map(TimeBucket::Day),
            Granularity::Month => {
                let (y, m) = key.split_once('-')?;
                let year = y.parse::<i32>().ok()?;
                let month = m.parse::<u8>().ok().filter(|m| (1..=12).contains(m))?;
                Some(TimeBucket::Month { year, month })
            }
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBucket::Hour(h) => write!(f, "{h}"),
            TimeBucket::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TimeBucket::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

impl Serialize for TimeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
