//! Conversion of raw energy magnitudes into the canonical unit (GWh).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Energy unit of a raw magnitude.
///
/// The canonical unit is [`Unit::Gwh`]. Source data observed so far arrives
/// in kWh, which converts with a fixed factor of `1e-6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Wh,
    Kwh,
    Mwh,
    Gwh,
}

impl Unit {
    /// Canonical unit of every stored magnitude.
    pub const CANONICAL: Unit = Unit::Gwh;

    /// Multiplier taking a magnitude in this unit to GWh.
    pub fn scale_factor(self) -> f64 {
        1.0 / self.per_gwh()
    }

    /// How many of this unit make one GWh.
    pub fn per_gwh(self) -> f64 {
        match self {
            Unit::Wh => 1e9,
            Unit::Kwh => 1e6,
            Unit::Mwh => 1e3,
            Unit::Gwh => 1.0,
        }
    }

    /// Lowercase unit name as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Wh => "wh",
            Unit::Kwh => "kwh",
            Unit::Mwh => "mwh",
            Unit::Gwh => "gwh",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wh" => Ok(Unit::Wh),
            "kwh" => Ok(Unit::Kwh),
            "mwh" => Ok(Unit::Mwh),
            "gwh" => Ok(Unit::Gwh),
            _ => Err(EngineError::UnknownUnit {
                unit: s.to_string(),
            }),
        }
    }
}

/// Converts a raw magnitude in `source_unit` to GWh.
///
/// # Errors
///
/// Returns [`EngineError::InvalidMagnitude`] for negative, NaN or infinite
/// input.
///
/// # Examples
///
/// ```
/// use re100_agg::model::units::{Unit, normalize};
///
/// let gwh = normalize(250_000_000.0, Unit::Kwh).unwrap();
/// assert!((gwh - 250.0).abs() < 1e-9);
/// ```
pub fn normalize(raw_magnitude: f64, source_unit: Unit) -> Result<f64, EngineError> {
    if !raw_magnitude.is_finite() || raw_magnitude < 0.0 {
        return Err(EngineError::InvalidMagnitude {
            value: raw_magnitude,
        });
    }
    // Dividing by an exact power of ten keeps whole-number inputs exact.
    Ok(raw_magnitude / source_unit.per_gwh())
}
