//! Core record types: readings, entities, and series keys.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Timestamp layouts accepted in raw input, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Whether a reading is generated energy or consumed energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Supply,
    Demand,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Supply => f.write_str("supply"),
            Category::Demand => f.write_str("demand"),
        }
    }
}

/// Generation technology of a supply entity (`solar`, `wind`, ...).
///
/// Always stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subtype(String);

impl Subtype {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a plant or company.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (category, subtype) pair that scopes a family of series.
///
/// Demand series carry no subtype.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub category: Category,
    pub subtype: Option<Subtype>,
}

impl SeriesKey {
    pub fn supply(subtype: &str) -> Self {
        Self {
            category: Category::Supply,
            subtype: Some(Subtype::new(subtype)),
        }
    }

    pub fn demand() -> Self {
        Self {
            category: Category::Demand,
            subtype: None,
        }
    }

    /// Group label used as the top-level key in snapshots: the subtype name
    /// for supply, `"demand"` for demand.
    pub fn label(&self) -> String {
        match (&self.category, &self.subtype) {
            (Category::Supply, Some(s)) => s.as_str().to_string(),
            (Category::Supply, None) => "supply".to_string(),
            (Category::Demand, _) => "demand".to_string(),
        }
    }

    /// Classifies a raw type tag.
    ///
    /// Accepts `demand`, any name in `supply_subtypes`, or the explicit form
    /// `supply:<subtype>`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCategory`] for anything else.
    pub fn from_tag(tag: &str, supply_subtypes: &[Subtype]) -> Result<Self, EngineError> {
        let norm = tag.trim().to_ascii_lowercase();
        if norm == "demand" {
            return Ok(Self::demand());
        }
        if let Some(rest) = norm.strip_prefix("supply:") {
            if !rest.is_empty() && rest != "demand" {
                return Ok(Self::supply(rest));
            }
        }
        if supply_subtypes.iter().any(|s| s.as_str() == norm) {
            return Ok(Self::supply(&norm));
        }
        Err(EngineError::UnknownCategory {
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtype {
            Some(s) => write!(f, "{}/{}", self.category, s),
            None => write!(f, "{}", self.category),
        }
    }
}

/// A validated energy reading in the canonical unit (GWh). Immutable once
/// ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub key: SeriesKey,
    pub entity_id: EntityId,
    pub magnitude: f64,
}

impl Reading {
    pub fn category(&self) -> Category {
        self.key.category
    }
}

/// An input record as parsed from a source file, before validation.
///
/// Column names follow the source CSV layout: `datetime,type,plant_name,value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub datetime: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "plant_name")]
    pub entity: String,
    pub value: f64,
}

/// Parses a raw timestamp in any of the accepted layouts.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimestamp`] when no layout matches.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, EngineError> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| EngineError::InvalidTimestamp {
            raw: raw.to_string(),
        })
}

/// A plant or company known to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    pub subtype: Option<Subtype>,
    pub display_name: Option<String>,
    /// Rated capacity in GW, when known.
    pub capacity_gw: Option<f64>,
}

impl Entity {
    /// Label shown to consumers: display name if set, else the id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Display-name lookup kept apart from entity ids so that renaming never
/// touches aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayNames {
    names: BTreeMap<EntityId, String>,
}

impl DisplayNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn get(&self, id: &EntityId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Display name for `id`, falling back to the id itself.
    pub fn label<'a>(&'a self, id: &'a EntityId) -> &'a str {
        self.get(id).unwrap_or(id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Mapping of id string to display name, as used by snapshot rename.
    pub fn as_rename_map(&self) -> BTreeMap<String, String> {
        self.names
            .iter()
            .map(|(id, name)| (id.as_str().to_string(), name.clone()))
            .collect()
    }
}

impl FromIterator<(EntityId, String)> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = (EntityId, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
