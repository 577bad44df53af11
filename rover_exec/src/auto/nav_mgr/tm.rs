//! # Defines Telemetry Pack for Navigation

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{NavModeKind, Trigger};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Summary of one navigation cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NavTm {
    /// Mode after this cycle's transition
    pub mode: NavModeKind,

    /// Trigger produced by the mode stepped this cycle
    pub trigger: Trigger,

    /// Number of consecutive cycles spent in the current mode
    pub mode_ticks: u64,

    /// True if a pickup was requested this cycle
    pub send_pickup: bool,

    /// True while a pickup request is waiting on the simulator
    pub pickup_in_flight: bool,
}

impl Default for NavTm {
    fn default() -> Self {
        Self {
            mode: NavModeKind::Forward,
            trigger: Trigger::None,
            mode_ticks: 0,
            send_pickup: false,
            pickup_in_flight: false,
        }
    }
}
