//! TOML-based run configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::{AggregationOptions, EntityDetails, HourlyFill, IngestOptions};
use crate::model::{EntityId, Subtype, Unit};
use crate::sample::{PlantSpec, SampleOptions, default_companies, default_plants};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Top-level run configuration parsed from TOML.
///
/// All sections have defaults matching the `default` preset. Load from
/// TOML with [`RunConfig::from_toml_file`] or use a preset via
/// [`RunConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// How raw input is interpreted.
    #[serde(default)]
    pub input: InputConfig,
    /// Aggregation behavior and tolerance.
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Per-entity display names and capacities, keyed by entity id.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
    /// Synthetic data parameters for `--sample`.
    #[serde(default)]
    pub sample: SampleConfig,
}

/// How raw input is interpreted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Unit of the `value` column: `"wh"`, `"kwh"`, `"mwh"` or `"gwh"`.
    pub source_unit: String,
    /// Type tags treated as supply subtypes.
    pub supply_subtypes: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source_unit: "kwh".to_string(),
            supply_subtypes: vec!["solar".into(), "wind".into(), "hydro".into()],
        }
    }
}

/// Aggregation behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// `"sparse"` or `"zero"` (explicit zeros for hours without readings).
    pub hourly_fill: String,
    /// Relative tolerance for consistency checks.
    pub tolerance: f64,
    /// Demand entities to keep; empty keeps all.
    pub demand_filter: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            hourly_fill: "sparse".to_string(),
            tolerance: 1e-6,
            demand_filter: Vec::new(),
        }
    }
}

/// Metadata for one entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityConfig {
    pub display_name: Option<String>,
    /// Rated capacity (GW).
    pub capacity_gw: Option<f64>,
}

/// Synthetic data parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleConfig {
    /// Random seed.
    pub seed: u64,
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Number of days (must be > 0).
    pub days: u32,
    pub plants: Vec<PlantSpec>,
    pub companies: Vec<String>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_date: "2024-01-01".to_string(),
            days: 31,
            plants: default_plants(),
            companies: default_companies(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"aggregation.tolerance"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl RunConfig {
    /// Returns the `default` preset: kWh input, sparse hourly views.
    pub fn default_preset() -> Self {
        Self::default()
    }

    /// Returns the `sample` preset: one year of synthetic data with named,
    /// rated plants and dense hourly views.
    pub fn sample_preset() -> Self {
        let plants = [
            ("solar_plant1", "Onshore Solar", 1.2),
            ("solar_plant2", "Floating Solar 1", 0.8),
            ("solar_plant3", "Floating Solar 2", 1.0),
            ("wind_plant1", "Gunsan Offshore Wind", 2.4),
            ("wind_plant2", "Saemangeum Offshore Wind", 2.0),
            ("wind_plant3", "Southwest Offshore Wind", 2.5),
        ];
        let entities = plants
            .iter()
            .map(|(id, name, gw)| {
                (
                    (*id).to_string(),
                    EntityConfig {
                        display_name: Some((*name).to_string()),
                        capacity_gw: Some(*gw),
                    },
                )
            })
            .collect();
        Self {
            input: InputConfig::default(),
            aggregation: AggregationConfig {
                hourly_fill: "zero".to_string(),
                ..AggregationConfig::default()
            },
            entities,
            sample: SampleConfig {
                days: 366,
                ..SampleConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "sample"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default_preset()),
            "sample" => Ok(Self::sample_preset()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let input = &self.input;
        if let Err(e) = input.source_unit.parse::<Unit>() {
            errors.push(ConfigError::new("input.source_unit", e.to_string()));
        }
        if input.supply_subtypes.is_empty() {
            errors.push(ConfigError::new("input.supply_subtypes", "must not be empty"));
        }
        if input
            .supply_subtypes
            .iter()
            .any(|s| s.trim().is_empty() || s.trim().eq_ignore_ascii_case("demand"))
        {
            errors.push(ConfigError::new(
                "input.supply_subtypes",
                "entries must be non-empty and must not be \"demand\"",
            ));
        }

        let agg = &self.aggregation;
        if agg.hourly_fill != "sparse" && agg.hourly_fill != "zero" {
            errors.push(ConfigError::new(
                "aggregation.hourly_fill",
                format!("must be \"sparse\" or \"zero\", got \"{}\"", agg.hourly_fill),
            ));
        }
        if !agg.tolerance.is_finite() || agg.tolerance < 0.0 {
            errors.push(ConfigError::new("aggregation.tolerance", "must be finite and >= 0"));
        }

        for (id, entity) in &self.entities {
            if let Some(gw) = entity.capacity_gw {
                if !gw.is_finite() || gw < 0.0 {
                    errors.push(ConfigError::new(
                        &format!("entities.{id}.capacity_gw"),
                        "must be finite and >= 0",
                    ));
                }
            }
            if entity
                .display_name
                .as_deref()
                .is_some_and(|n| n.trim().is_empty())
            {
                errors.push(ConfigError::new(
                    &format!("entities.{id}.display_name"),
                    "must not be empty",
                ));
            }
        }

        let s = &self.sample;
        if NaiveDate::parse_from_str(&s.start_date, DATE_FORMAT).is_err() {
            errors.push(ConfigError::new(
                "sample.start_date",
                format!("must be YYYY-MM-DD, got \"{}\"", s.start_date),
            ));
        }
        if s.days == 0 {
            errors.push(ConfigError::new("sample.days", "must be > 0"));
        }
        for (i, p) in s.plants.iter().enumerate() {
            if let Err(e) = p.validate() {
                errors.push(ConfigError::new(&format!("sample.plants[{i}]"), e.to_string()));
            }
        }

        errors
    }

    /// Ingest settings for this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `input.source_unit` is not a known unit.
    pub fn to_ingest_options(&self) -> Result<IngestOptions, ConfigError> {
        let source_unit = self
            .input
            .source_unit
            .parse::<Unit>()
            .map_err(|e| ConfigError::new("input.source_unit", e.to_string()))?;
        Ok(IngestOptions {
            source_unit,
            supply_subtypes: self
                .input
                .supply_subtypes
                .iter()
                .map(|s| Subtype::new(s))
                .collect(),
            demand_filter: self
                .aggregation
                .demand_filter
                .iter()
                .map(|id| EntityId::new(id.as_str()))
                .collect(),
            entity_details: self
                .entities
                .iter()
                .map(|(id, e)| {
                    (
                        EntityId::new(id.as_str()),
                        EntityDetails {
                            display_name: e.display_name.clone(),
                            capacity_gw: e.capacity_gw,
                        },
                    )
                })
                .collect(),
        })
    }

    /// Aggregation settings for this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `aggregation.hourly_fill` is unknown.
    pub fn to_aggregation_options(&self) -> Result<AggregationOptions, ConfigError> {
        let hourly_fill = match self.aggregation.hourly_fill.as_str() {
            "sparse" => HourlyFill::Sparse,
            "zero" => HourlyFill::Zero,
            other => {
                return Err(ConfigError::new(
                    "aggregation.hourly_fill",
                    format!("must be \"sparse\" or \"zero\", got \"{other}\""),
                ));
            }
        };
        Ok(AggregationOptions {
            hourly_fill,
            tolerance: self.aggregation.tolerance,
        })
    }

    /// Synthetic data settings for this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `sample.start_date` is not a valid date.
    pub fn to_sample_options(&self) -> Result<SampleOptions, ConfigError> {
        let s = &self.sample;
        let start = NaiveDate::parse_from_str(&s.start_date, DATE_FORMAT).map_err(|e| {
            ConfigError::new("sample.start_date", format!("\"{}\": {e}", s.start_date))
        })?;
        Ok(SampleOptions {
            seed: s.seed,
            start,
            days: s.days,
            plants: s.plants.clone(),
            companies: s.companies.clone(),
        })
    }

    /// Entity id to display name, as used for `--rename`.
    pub fn rename_map(&self) -> BTreeMap<String, String> {
        self.entities
            .iter()
            .filter_map(|(id, e)| e.display_name.clone().map(|n| (id.clone(), n)))
            .collect()
    }
}
