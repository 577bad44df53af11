//! # [`NavMode::Forward`] implementation
//!
//! [`NavMode::Forward`]: super::NavMode::Forward

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::{drive::MAX_STEER_DEG, DriveDems};
use util::maths::clamp;

use super::{params::NavMgrParams, NavInput, StepOutput, Trigger};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Forward mode, drives along the open ground, or toward a visible sample.
///
/// Possible transitions, checked in order:
/// - Sampling, if the rover is next to a sample or picking one up
/// - Stuck, if throttle has been demanded without the rover moving for too long
/// - Stop, if there isn't enough open ground ahead
/// - Sampling, if a sample is in reach
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forward {
    /// Number of consecutive ticks the rover hasn't moved despite a throttle demand
    stall_ticks: u64,

    /// Throttle demanded on the previous tick
    last_throttle: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Forward {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, params: &NavMgrParams, input: &NavInput) -> StepOutput {
        // Next to a sample the rover is stopped on purpose, so it isn't stalled
        if input.near_sample || input.picking_up {
            self.stall_ticks = 0;
            self.last_throttle = 0.0;
            return StepOutput::new(Trigger::SampleInReach, DriveDems::brake(params.brake_set));
        }

        if input.vel_ms.abs() < params.stall_vel_epsilon && self.last_throttle > 0.0 {
            self.stall_ticks += 1;
        } else {
            self.stall_ticks = 0;
        }

        if self.stall_ticks > params.stuck_timeout_ticks {
            self.last_throttle = 0.0;
            return StepOutput::new(Trigger::Stalled, DriveDems::brake(params.brake_set));
        }

        if input.nav_count == 0 || input.nav_count < params.stop_forward {
            self.last_throttle = 0.0;
            return StepOutput::new(Trigger::NoPath, DriveDems::brake(params.brake_set));
        }

        if let Some(sample) = input.nearest_sample {
            let reach_px =
                params.sample_reach_px + params.sample_closing_time_s * input.vel_ms.abs();

            if sample.dist < reach_px {
                self.last_throttle = 0.0;
                return StepOutput::new(Trigger::SampleInReach, DriveDems::brake(params.brake_set));
            }
        }

        // Head for a visible sample, otherwise follow the open ground
        let (angle_deg, dist) = match (input.sample_mean_angle_deg, input.nearest_sample) {
            (Some(angle_deg), Some(sample)) => (angle_deg, sample.dist),
            _ => (
                input.nav_mean_angle_deg.unwrap_or(0.0) + params.wall_bias_deg,
                input.clearance,
            ),
        };

        let throttle = clamp(
            &(params.throttle_clearance_gain * dist - params.throttle_vel_gain * input.vel_ms),
            &0.0,
            &params.max_vel,
        );
        self.last_throttle = throttle;

        StepOutput::new(
            Trigger::None,
            DriveDems {
                throttle,
                brake: 0.0,
                steer_deg: clamp(&angle_deg, &-MAX_STEER_DEG, &MAX_STEER_DEG),
            },
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::per::PolarPoint;

    fn open_ground() -> NavInput {
        NavInput {
            nav_count: 1000,
            nav_mean_angle_deg: Some(5.0),
            clearance: 50.0,
            vel_ms: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_drive() {
        let params = NavMgrParams::default();
        let out = Forward::new().step(&params, &open_ground());

        assert_eq!(out.trigger, Trigger::None);
        assert!((out.dems.throttle - (50.0 * 0.005 - 0.5 * 0.2)).abs() < 1e-12);
        assert_eq!(out.dems.brake, 0.0);
        assert_eq!(out.dems.steer_deg, 5.0);

        // Steering is limited
        let input = NavInput {
            nav_mean_angle_deg: Some(-40.0),
            ..open_ground()
        };
        assert_eq!(Forward::new().step(&params, &input).dems.steer_deg, -15.0);

        // Fast enough that no throttle is needed
        let input = NavInput {
            vel_ms: 2.0,
            ..open_ground()
        };
        assert_eq!(Forward::new().step(&params, &input).dems.throttle, 0.0);
    }

    #[test]
    fn test_no_path() {
        let params = NavMgrParams::default();

        for &nav_count in &[0, 10, 49] {
            let input = NavInput {
                nav_count,
                ..open_ground()
            };
            let out = Forward::new().step(&params, &input);

            assert_eq!(out.trigger, Trigger::NoPath);
            assert_eq!(out.dems.throttle, 0.0);
            assert!(out.dems.brake > 0.0);
            assert_eq!(out.dems.steer_deg, 0.0);
        }
    }

    #[test]
    fn test_sample() {
        let params = NavMgrParams::default();

        // Visible but out of reach, steer toward it
        let input = NavInput {
            sample_mean_angle_deg: Some(-10.0),
            nearest_sample: Some(PolarPoint {
                dist: 40.0,
                angle_rad: -0.17,
            }),
            ..open_ground()
        };
        let out = Forward::new().step(&params, &input);
        assert_eq!(out.trigger, Trigger::None);
        assert_eq!(out.dems.steer_deg, -10.0);
        assert!((out.dems.throttle - (40.0 * 0.005 - 0.5 * 0.2)).abs() < 1e-12);

        // In reach at this speed (20 + 5 * 5 = 45 px)
        let input = NavInput {
            vel_ms: 5.0,
            ..input
        };
        let out = Forward::new().step(&params, &input);
        assert_eq!(out.trigger, Trigger::SampleInReach);
        assert_eq!(out.dems.throttle, 0.0);
        assert!(out.dems.brake > 0.0);
    }

    #[test]
    fn test_near_sample() {
        let params = NavMgrParams::default();
        let mut forward = Forward::new();
        let stalled = NavInput {
            vel_ms: 0.0,
            ..open_ground()
        };

        for _ in 0..params.stuck_timeout_ticks {
            forward.step(&params, &stalled);
        }

        let at_sample = NavInput {
            near_sample: true,
            ..stalled.clone()
        };
        let out = forward.step(&params, &at_sample);
        assert_eq!(out.trigger, Trigger::SampleInReach);
        assert_eq!(out.dems.throttle, 0.0);
        assert!(out.dems.brake > 0.0);

        // The stall count starts again from zero
        for _ in 0..=params.stuck_timeout_ticks {
            assert_eq!(forward.step(&params, &stalled).trigger, Trigger::None);
        }
    }

    #[test]
    fn test_stall() {
        let params = NavMgrParams::default();
        let mut forward = Forward::new();
        let stalled = NavInput {
            vel_ms: 0.0,
            ..open_ground()
        };

        for _ in 0..=params.stuck_timeout_ticks {
            assert_eq!(forward.step(&params, &stalled).trigger, Trigger::None);
        }

        assert_eq!(forward.step(&params, &stalled).trigger, Trigger::Stalled);
    }

    #[test]
    fn test_stall_reset_by_motion() {
        let params = NavMgrParams::default();
        let mut forward = Forward::new();
        let stalled = NavInput {
            vel_ms: 0.0,
            ..open_ground()
        };

        for _ in 0..params.stuck_timeout_ticks {
            forward.step(&params, &stalled);
        }
        forward.step(&params, &open_ground());

        for _ in 0..params.stuck_timeout_ticks {
            assert_eq!(forward.step(&params, &stalled).trigger, Trigger::None);
        }
    }
}
