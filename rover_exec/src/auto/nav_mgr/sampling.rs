//! # [`NavMode::Sampling`] implementation
//!
//! [`NavMode::Sampling`]: super::NavMode::Sampling

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tc::{drive::MAX_STEER_DEG, DriveDems};
use util::maths::clamp;

use super::{params::NavMgrParams, NavInput, StepOutput, Trigger};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sampling mode, approaches the nearest sample and holds next to it for the pickup.
///
/// The pickup request itself is made by the [`NavMgr`](super::NavMgr) whatever the mode.
///
/// Possible transitions:
/// - Forward, if the sample is lost from view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sampling;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Sampling {
    pub fn new() -> Self {
        Self
    }

    pub fn step(&mut self, params: &NavMgrParams, input: &NavInput) -> StepOutput {
        // Next to the sample, stop and hold for the pickup
        if input.near_sample || input.picking_up {
            return StepOutput::new(Trigger::None, DriveDems::brake(params.brake_set));
        }

        match input.nearest_sample {
            Some(sample) if sample.dist <= params.sample_lost_px => {
                let throttle = clamp(
                    &(params.approach_throttle_gain * sample.dist),
                    &params.approach_min_throttle,
                    &params.max_vel,
                );

                StepOutput::new(
                    Trigger::None,
                    DriveDems {
                        throttle,
                        brake: 0.0,
                        steer_deg: clamp(&sample.angle_deg(), &-MAX_STEER_DEG, &MAX_STEER_DEG),
                    },
                )
            }
            _ => StepOutput::new(Trigger::SampleLost, DriveDems::brake(params.brake_set)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::per::PolarPoint;

    fn sample_at(dist: f64, angle_deg: f64) -> NavInput {
        NavInput {
            sample_mean_angle_deg: Some(angle_deg),
            nearest_sample: Some(PolarPoint {
                dist,
                angle_rad: angle_deg.to_radians(),
            }),
            vel_ms: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_approach() {
        let params = NavMgrParams::default();
        let mut sampling = Sampling::new();

        let far = sampling.step(&params, &sample_at(60.0, 8.0));
        let close = sampling.step(&params, &sample_at(20.0, 8.0));
        let very_close = sampling.step(&params, &sample_at(1.0, -30.0));

        assert_eq!(far.trigger, Trigger::None);
        assert!((far.dems.steer_deg - 8.0).abs() < 1e-9);
        assert_eq!(far.dems.brake, 0.0);

        // Throttle falls as the sample gets closer, but never reaches zero
        assert!(far.dems.throttle > close.dems.throttle);
        assert!(close.dems.throttle > very_close.dems.throttle);
        assert_eq!(very_close.dems.throttle, params.approach_min_throttle);
        assert_eq!(very_close.dems.steer_deg, -15.0);
    }

    #[test]
    fn test_near_sample() {
        let params = NavMgrParams::default();
        let input = NavInput {
            near_sample: true,
            ..sample_at(5.0, 0.0)
        };

        let out = Sampling::new().step(&params, &input);

        assert_eq!(out.trigger, Trigger::None);
        assert_eq!(out.dems, DriveDems::brake(params.brake_set));
    }

    #[test]
    fn test_lost() {
        let params = NavMgrParams::default();
        let mut sampling = Sampling::new();

        assert_eq!(
            sampling.step(&params, &NavInput::default()).trigger,
            Trigger::SampleLost
        );
        assert_eq!(
            sampling.step(&params, &sample_at(75.0, 0.0)).trigger,
            Trigger::SampleLost
        );
    }
}
