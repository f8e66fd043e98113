//! Navcheck - POI and road network validation for map tiles
//!
//! This library provides the data model, geometry helpers and checks used by
//! the `validate` binary.

pub mod checks;
pub mod config;
pub mod geometry;
pub mod models;

pub use checks::{TileReport, Validator};
pub use config::ValidationConfig;
pub use models::{Finding, FindingKind, Link, Poi, Side, TileBundle};
