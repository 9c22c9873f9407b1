//! Synthetic hourly readings in the source CSV layout.
//!
//! Solar plants produce only between 06:00 and 18:00; other plants produce
//! around the clock. Company demand follows business hours. Identical seeds
//! give identical readings.

use chrono::{NaiveDate, NaiveTime, TimeDelta, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::model::RawReading;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const KWH_PER_GWH: f64 = 1e6;

/// One synthetic plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantSpec {
    /// Entity id written to the `plant_name` column.
    pub id: String,
    /// Type tag written to the `type` column (`solar`, `wind`, ...).
    pub kind: String,
    /// Lower bound of hourly output while generating (GWh).
    pub min_gwh: f64,
    /// Upper bound of hourly output while generating (GWh).
    pub max_gwh: f64,
}

impl PlantSpec {
    pub fn new(id: &str, kind: &str, min_gwh: f64, max_gwh: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            min_gwh,
            max_gwh,
        }
    }

    /// Checks that the output range is finite, non-negative and ordered.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSampleRange`] otherwise.
    pub fn validate(&self) -> Result<(), EngineError> {
        let finite = self.min_gwh.is_finite() && self.max_gwh.is_finite();
        if finite && 0.0 <= self.min_gwh && self.min_gwh <= self.max_gwh {
            Ok(())
        } else {
            Err(EngineError::InvalidSampleRange {
                plant: self.id.clone(),
                min: self.min_gwh,
                max: self.max_gwh,
            })
        }
    }

    fn generates_at(&self, hour: u32) -> bool {
        self.kind != "solar" || (6..=18).contains(&hour)
    }
}

/// Parameters of a synthetic data set.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOptions {
    pub seed: u64,
    pub start: NaiveDate,
    pub days: u32,
    pub plants: Vec<PlantSpec>,
    pub companies: Vec<String>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 31,
            plants: default_plants(),
            companies: default_companies(),
        }
    }
}

/// Three solar and three wind plants.
pub fn default_plants() -> Vec<PlantSpec> {
    vec![
        PlantSpec::new("solar_plant1", "solar", 100.0, 500.0),
        PlantSpec::new("solar_plant2", "solar", 80.0, 400.0),
        PlantSpec::new("solar_plant3", "solar", 120.0, 450.0),
        PlantSpec::new("wind_plant1", "wind", 150.0, 600.0),
        PlantSpec::new("wind_plant2", "wind", 120.0, 550.0),
        PlantSpec::new("wind_plant3", "wind", 100.0, 500.0),
    ]
}

pub fn default_companies() -> Vec<String> {
    ["compA", "compB", "compC", "compD"]
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

/// Hourly demand range (GWh) of one company.
fn demand_range(hour: u32) -> (f64, f64) {
    match hour {
        9..=18 => (200.0, 500.0),
        6..=8 | 19..=22 => (150.0, 300.0),
        _ => (50.0, 150.0),
    }
}

/// Generates hourly readings for every plant and company, values in kWh.
///
/// Rows are ordered by timestamp, then plants, then companies.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSampleRange`] when a plant's range is
/// unusable; nothing is generated in that case.
pub fn generate(options: &SampleOptions) -> Result<Vec<RawReading>, EngineError> {
    for plant in &options.plants {
        plant.validate()?;
    }
    let mut rng = StdRng::seed_from_u64(options.seed);
    let start = options.start.and_time(NaiveTime::MIN);
    let hours = i64::from(options.days) * 24;
    let per_hour = options.plants.len() + options.companies.len();
    let mut out = Vec::with_capacity(per_hour * usize::try_from(hours).unwrap_or(0));

    for h in 0..hours {
        let ts = start + TimeDelta::hours(h);
        let stamp = ts.format(TIMESTAMP_FORMAT).to_string();
        let hour = ts.hour();

        for plant in &options.plants {
            let gwh = if plant.generates_at(hour) {
                rng.random_range(plant.min_gwh..=plant.max_gwh)
            } else {
                0.0
            };
            out.push(row(&stamp, &plant.kind, &plant.id, gwh));
        }

        let (lo, hi) = demand_range(hour);
        for company in &options.companies {
            let gwh = rng.random_range(lo..=hi);
            out.push(row(&stamp, "demand", company, gwh));
        }
    }

    debug!(readings = out.len(), seed = options.seed, "generated sample readings");
    Ok(out)
}

fn row(stamp: &str, kind: &str, entity: &str, gwh: f64) -> RawReading {
    RawReading {
        datetime: stamp.to_string(),
        kind: kind.to_string(),
        entity: entity.to_string(),
        value: gwh * KWH_PER_GWH,
    }
}
