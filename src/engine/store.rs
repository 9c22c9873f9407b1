//! In-memory reading store built once per run by [`ReadingStore::ingest`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::model::{
    Category, DisplayNames, Entity, EntityId, RawReading, Reading, SeriesKey, Subtype, Unit,
    normalize, parse_timestamp,
};

/// Optional metadata attached to an entity at ingest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDetails {
    pub display_name: Option<String>,
    pub capacity_gw: Option<f64>,
}

/// Settings that control how raw readings are validated and stored.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Unit of the raw `value` column.
    pub source_unit: Unit,
    /// Type tags recognised as supply subtypes.
    pub supply_subtypes: Vec<Subtype>,
    /// When non-empty, only these demand entities are kept.
    pub demand_filter: BTreeSet<EntityId>,
    /// Display names and capacities keyed by entity id.
    pub entity_details: BTreeMap<EntityId, EntityDetails>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            source_unit: Unit::Kwh,
            supply_subtypes: ["solar", "wind", "hydro"]
                .iter()
                .map(|s| Subtype::new(s))
                .collect(),
            demand_filter: BTreeSet::new(),
            entity_details: BTreeMap::new(),
        }
    }
}

/// Counts of accepted and rejected readings from one ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped_invalid_magnitude: usize,
    pub skipped_unknown_category: usize,
    pub skipped_invalid_timestamp: usize,
    /// Demand readings dropped by the demand filter (not an error).
    pub filtered_out: usize,
}

impl IngestReport {
    /// Total readings rejected as invalid.
    pub fn skipped(&self) -> usize {
        self.skipped_invalid_magnitude + self.skipped_unknown_category + self.skipped_invalid_timestamp
    }

    fn record(&mut self, err: &EngineError) {
        match err {
            EngineError::InvalidMagnitude { .. } => self.skipped_invalid_magnitude += 1,
            EngineError::UnknownCategory { .. } => self.skipped_unknown_category += 1,
            EngineError::InvalidTimestamp { .. } => self.skipped_invalid_timestamp += 1,
            _ => {}
        }
    }
}

/// Immutable readings keyed by (series key, entity).
///
/// Shared freely across threads once built; aggregation only reads from it.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    by_entity: BTreeMap<(SeriesKey, EntityId), Vec<Reading>>,
    entities: BTreeMap<(SeriesKey, EntityId), Entity>,
}

impl ReadingStore {
    /// Validates, normalizes and stores raw readings.
    ///
    /// Invalid readings are skipped and counted; ingest never aborts.
    pub fn ingest<I>(raw: I, options: &IngestOptions) -> (Self, IngestReport)
    where
        I: IntoIterator<Item = RawReading>,
    {
        let mut report = IngestReport::default();
        let mut readings = Vec::new();

        for (idx, r) in raw.into_iter().enumerate() {
            match validate(&r, options) {
                Ok(reading) => {
                    if reading.category() == Category::Demand
                        && !options.demand_filter.is_empty()
                        && !options.demand_filter.contains(&reading.entity_id)
                    {
                        report.filtered_out += 1;
                        continue;
                    }
                    readings.push(reading);
                }
                Err(err) => {
                    debug!(row = idx, error = %err, "skipping reading");
                    report.record(&err);
                }
            }
        }

        report.accepted = readings.len();
        if report.skipped() > 0 {
            warn!(
                skipped = report.skipped(),
                invalid_magnitude = report.skipped_invalid_magnitude,
                unknown_category = report.skipped_unknown_category,
                invalid_timestamp = report.skipped_invalid_timestamp,
                "rejected readings during ingest"
            );
        }

        let mut store = Self::from_readings(readings);
        for entity in store.entities.values_mut() {
            if let Some(details) = options.entity_details.get(&entity.id) {
                entity.display_name.clone_from(&details.display_name);
                entity.capacity_gw = details.capacity_gw;
            }
        }
        (store, report)
    }

    /// Builds a store from readings that are already validated.
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut store = Self::default();
        for r in readings {
            let slot = (r.key.clone(), r.entity_id.clone());
            store.entities.entry(slot.clone()).or_insert_with(|| Entity {
                id: r.entity_id.clone(),
                category: r.key.category,
                subtype: r.key.subtype.clone(),
                display_name: None,
                capacity_gw: None,
            });
            store.by_entity.entry(slot).or_default().push(r);
        }
        store
    }

    /// Readings matching a category and, optionally, a subtype and entity.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn readings_for<'a>(
        &'a self,
        category: Category,
        subtype: Option<&'a Subtype>,
        entity: Option<&'a EntityId>,
    ) -> impl Iterator<Item = &'a Reading> + Clone + 'a {
        self.by_entity
            .iter()
            .filter(move |((key, id), _)| {
                key.category == category
                    && subtype.is_none_or(|s| key.subtype.as_ref() == Some(s))
                    && entity.is_none_or(|e| id == e)
            })
            .flat_map(|(_, readings)| readings.iter())
    }

    /// Readings of one entity within one series family.
    pub fn readings_of<'a>(
        &'a self,
        key: &SeriesKey,
        entity: &EntityId,
    ) -> impl Iterator<Item = &'a Reading> + Clone + use<'a> {
        self.by_entity
            .get(&(key.clone(), entity.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
    }

    /// Every (category, subtype) family present, in order.
    pub fn series_keys(&self) -> BTreeSet<SeriesKey> {
        self.by_entity.keys().map(|(k, _)| k.clone()).collect()
    }

    /// Entity ids belonging to one series family, in order.
    pub fn entity_ids(&self, key: &SeriesKey) -> Vec<&EntityId> {
        self.by_entity
            .keys()
            .filter(|(k, _)| k == key)
            .map(|(_, id)| id)
            .collect()
    }

    /// All entities known to the store.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Display names configured for entities in this store.
    pub fn display_names(&self) -> DisplayNames {
        self.entities
            .values()
            .filter_map(|e| e.display_name.clone().map(|n| (e.id.clone(), n)))
            .collect()
    }

    /// Iterates every stored reading.
    pub fn all(&self) -> impl Iterator<Item = &Reading> + Clone {
        self.by_entity.values().flat_map(|v| v.iter())
    }

    pub fn len(&self) -> usize {
        self.by_entity.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

fn validate(raw: &RawReading, options: &IngestOptions) -> Result<Reading, EngineError> {
    let key = SeriesKey::from_tag(&raw.kind, &options.supply_subtypes)?;
    let timestamp = parse_timestamp(&raw.datetime)?;
    let magnitude = normalize(raw.value, options.source_unit)?;
    Ok(Reading {
        timestamp,
        key,
        entity_id: EntityId::new(raw.entity.trim()),
        magnitude,
    })
}
