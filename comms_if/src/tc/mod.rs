//! # Telecommand module
//!
//! This module provides the commands which the rover software sends back to the simulator in
//! response to each telemetry sample.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive;

pub use drive::{DriveDems, RoverCmd};
