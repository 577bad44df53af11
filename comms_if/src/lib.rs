//! # Communications interface crate.
//!
//! Provides the interface types exchanged between the rover software and the simulator's
//! telemetry link. The link itself (socket transport, frame decoding) lives outside this
//! workspace, this crate only defines what crosses it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands sent from the rover software to the simulator
pub mod tc;

/// Data recieved from the simulated rover equipment
pub mod eqpt;
