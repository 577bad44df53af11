//! # Map
//!
//! This module implements the [`WorldMap`], the persistent record of the terrain the rover has
//! seen, along with [`MapStats`] which grades the map against a known ground truth.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`WorldMap`] type
mod world_map;

/// Mapping quality statistics
mod stats;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use stats::{GroundTruth, MapStats};
pub use world_map::{WorldMap, WorldMapLayer, WorldMapParams};
