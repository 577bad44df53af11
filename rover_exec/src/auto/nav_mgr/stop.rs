//! # [`NavMode::Stop`] implementation
//!
//! [`NavMode::Stop`]: super::NavMode::Stop

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::DriveDems;

use super::{params::NavMgrParams, NavInput, StepOutput, Trigger};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Stop mode, brings the rover to a halt then turns on the spot until open ground is found.
///
/// Possible transitions:
/// - Forward, once the rover is halted and sees more than `go_forward` navigable points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stop;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Stop {
    pub fn new() -> Self {
        Self
    }

    pub fn step(&mut self, params: &NavMgrParams, input: &NavInput) -> StepOutput {
        // Keep braking until halted
        if input.vel_ms.abs() > params.halt_vel_epsilon {
            return StepOutput::new(Trigger::None, DriveDems::brake(params.brake_set));
        }

        if input.nav_count > params.go_forward {
            return StepOutput::new(Trigger::PathFound, DriveDems::default());
        }

        // Turn on the spot to look for open ground
        StepOutput::new(
            Trigger::None,
            DriveDems {
                throttle: 0.0,
                brake: 0.0,
                steer_deg: params.scan_steer_deg,
            },
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
