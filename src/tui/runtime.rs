//! Dashboard state over a finished snapshot.

use crate::engine::AggregateSeries;
use crate::model::TimeBucket;
use crate::snapshot::{AggregateSnapshot, TOTAL_KEY, ViewKind};

/// Which hour-of-day view the profile chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourlyMode {
    /// Typical-day mean per hour.
    Mean,
    /// Total per hour across the data set.
    Sum,
}

impl HourlyMode {
    pub fn view(self) -> ViewKind {
        match self {
            HourlyMode::Mean => ViewKind::HourlyProfile,
            HourlyMode::Sum => ViewKind::HourlyTotal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HourlyMode::Mean => "mean",
            HourlyMode::Sum => "sum",
        }
    }
}

/// TUI application state.
pub struct App {
    /// Snapshot being displayed. Never modified.
    pub snapshot: AggregateSnapshot,
    /// Supply groups that can be selected, in order.
    pub groups: Vec<String>,
    /// Index into `groups`.
    pub group_idx: usize,
    pub hourly_mode: HourlyMode,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// Number of consistency mismatches found at startup.
    pub mismatches: usize,
}

impl App {
    pub fn new(snapshot: AggregateSnapshot) -> Self {
        let groups = snapshot
            .groups()
            .into_iter()
            .filter(|g| *g != "demand")
            .map(str::to_string)
            .collect();
        Self {
            snapshot,
            groups,
            group_idx: 0,
            hourly_mode: HourlyMode::Mean,
            quit: false,
            mismatches: 0,
        }
    }

    /// Currently selected supply group, if any.
    pub fn selected_group(&self) -> Option<&str> {
        self.groups.get(self.group_idx).map(String::as_str)
    }

    pub fn next_group(&mut self) {
        if !self.groups.is_empty() {
            self.group_idx = (self.group_idx + 1) % self.groups.len();
        }
    }

    pub fn prev_group(&mut self) {
        if !self.groups.is_empty() {
            self.group_idx = (self.group_idx + self.groups.len() - 1) % self.groups.len();
        }
    }

    pub fn toggle_hourly_mode(&mut self) {
        self.hourly_mode = match self.hourly_mode {
            HourlyMode::Mean => HourlyMode::Sum,
            HourlyMode::Sum => HourlyMode::Mean,
        };
    }

    /// Hour-of-day points of the selected group's total.
    pub fn supply_points(&self) -> Vec<(f64, f64)> {
        self.selected_group()
            .and_then(|g| self.snapshot.series(self.hourly_mode.view(), g, TOTAL_KEY))
            .map(hour_points)
            .unwrap_or_default()
    }

    /// Hour-of-day points of total demand.
    pub fn demand_points(&self) -> Vec<(f64, f64)> {
        self.snapshot
            .series(self.hourly_mode.view(), "demand", TOTAL_KEY)
            .map(hour_points)
            .unwrap_or_default()
    }

    /// `(month key, capped coverage %)` for each month.
    pub fn monthly_coverage(&self) -> Vec<(String, f64)> {
        self.snapshot
            .coverage_rate
            .iter()
            .map(|(b, r)| (b.to_string(), r))
            .collect()
    }
}

fn hour_points(series: &AggregateSeries) -> Vec<(f64, f64)> {
    series
        .iter()
        .filter_map(|(b, v)| match b {
            TimeBucket::Hour(h) => Some((f64::from(*h), v)),
            _ => None,
        })
        .collect()
}
