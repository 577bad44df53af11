//! # [`NavMode::Stuck`] implementation
//!
//! [`NavMode::Stuck`]: super::NavMode::Stuck

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::DriveDems;

use super::{params::NavMgrParams, NavInput, StepOutput, Trigger};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Stuck mode, a fixed open loop manoeuvre to free the rover.
///
/// Perception is ignored. The manoeuvre always completes within
/// [`NavMgrParams::stuck_budget_ticks`] ticks.
///
/// Possible transitions:
/// - Forward, once the manoeuvre is complete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stuck {
    /// Number of ticks spent in this mode
    tick: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Phases of the recovery manoeuvre, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckPhase {
    /// Brake to let the rover settle
    Settle,

    /// Turn on the spot away from whatever is blocking the rover
    Rotate,

    /// Drive slowly straight ahead
    Creep,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Stuck {
    pub fn new() -> Self {
        Self::default()
    }

    /// The phase of the manoeuvre for the current tick.
    pub fn phase(&self, params: &NavMgrParams) -> StuckPhase {
        let rotate_start = params.stuck_settle_ticks;
        let creep_start = rotate_start + params.stuck_rotate_ticks;
        let end = creep_start + params.stuck_creep_ticks;

        if self.tick < rotate_start || self.tick >= end {
            StuckPhase::Settle
        } else if self.tick < creep_start {
            StuckPhase::Rotate
        } else {
            StuckPhase::Creep
        }
    }

    pub fn step(&mut self, params: &NavMgrParams, _input: &NavInput) -> StepOutput {
        let dems = match self.phase(params) {
            StuckPhase::Settle => DriveDems::brake(params.brake_set),
            StuckPhase::Rotate => DriveDems {
                throttle: 0.0,
                brake: 0.0,
                steer_deg: params.scan_steer_deg,
            },
            StuckPhase::Creep => DriveDems {
                throttle: params.stuck_creep_throttle,
                brake: 0.0,
                steer_deg: 0.0,
            },
        };

        self.tick += 1;

        let trigger = if self.tick >= params.stuck_budget_ticks() {
            Trigger::RecoveryComplete
        } else {
            Trigger::None
        };

        StepOutput::new(trigger, dems)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_phases() {
        let params = NavMgrParams {
            stuck_settle_ticks: 2,
            stuck_rotate_ticks: 3,
            stuck_creep_ticks: 1,
            ..Default::default()
        };
        let mut stuck = Stuck::new();
        let input = NavInput::default();

        let mut phases = Vec::new();
        let mut triggers = Vec::new();
        for _ in 0..6 {
            phases.push(stuck.phase(&params));
            triggers.push(stuck.step(&params, &input).trigger);
        }

        assert_eq!(
            phases,
            vec![
                StuckPhase::Settle,
                StuckPhase::Settle,
                StuckPhase::Rotate,
                StuckPhase::Rotate,
                StuckPhase::Rotate,
                StuckPhase::Creep
            ]
        );
        assert!(triggers[..5].iter().all(|t| *t == Trigger::None));
        assert_eq!(triggers[5], Trigger::RecoveryComplete);
    }

    #[test]
    fn test_zero_budget() {
        let params = NavMgrParams {
            stuck_settle_ticks: 0,
            stuck_rotate_ticks: 0,
            stuck_creep_ticks: 0,
            ..Default::default()
        };

        let out = Stuck::new().step(&params, &NavInput::default());

        assert_eq!(out.trigger, Trigger::RecoveryComplete);
        assert_eq!(out.dems, DriveDems::brake(params.brake_set));
    }
}
