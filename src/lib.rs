//! Renewable-energy reading aggregation: monthly and hourly roll-ups,
//! coverage rates, and consistency checks over plant and company data.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
/// TOML run configuration and presets.
pub mod config;
pub mod engine;
pub mod error;
/// CSV and JSON import/export.
pub mod io;
pub mod model;
/// Seeded synthetic readings for demos and tests.
pub mod sample;
pub mod snapshot;
#[cfg(feature = "tui")]
pub mod tui;
