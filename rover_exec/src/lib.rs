//! # Rover library.
//!
//! This library allows other crates in the workspace to access items defined inside the rover 
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy - perception, mapping and navigation
pub mod auto;

/// Parameters of the rover executable
pub mod params;

/// Replay client - provides telemetry from a recorded drive log
pub mod replay_client;

/// Rover state - everything carried from one cycle to the next
pub mod rover_state;
