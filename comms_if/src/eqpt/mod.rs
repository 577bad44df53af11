//! # Equipment Interface
//!
//! This module defines the interface structures which are recieved from the simulated rover
//! equipment each cycle.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod telem;
