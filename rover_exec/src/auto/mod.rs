//! # Autonomy Module
//!
//! This module provides the reactive autonomy of the rover: perception of the terrain in front of
//! it, the world map that perception is accumulated into, and the navigation manager which drives
//! the rover based on what it sees.

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use nav_mgr::NavMgr;
pub use per::PerMgr;

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation module - represents the pose reported by the simulator
pub mod loc;

/// Map module - provides the world map and its statistics
pub mod map;

/// Navigation module - decides the drive demands from perception
pub mod nav_mgr;

/// Perception module - converts camera frames into rover-centric terrain points
pub mod per;
