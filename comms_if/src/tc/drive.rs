//! # Drive commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum magnitude of the steering angle accepted by the simulator.
///
/// Units: degrees
pub const MAX_STEER_DEG: f64 = 15.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator demands for one cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveDems {
    /// Throttle demand, between 0 and the maximum velocity parameter.
    pub throttle: f64,

    /// Brake demand, zero or positive.
    pub brake: f64,

    /// Steering angle demand, positive to the left.
    ///
    /// Units: degrees, between -[`MAX_STEER_DEG`] and +[`MAX_STEER_DEG`]
    pub steer_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The reply sent to the simulator for one telemetry sample.
///
/// The simulator answers every reply with a new telemetry sample, so exactly one of these must be
/// sent per cycle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoverCmd {
    /// Drive the rover with the given demands
    Drive(DriveDems),

    /// Pick up the sample next to the rover
    Pickup,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Demands which bring the rover to a halt and keep it there.
    pub fn brake(brake: f64) -> Self {
        Self {
            throttle: 0.0,
            brake,
            steer_deg: 0.0,
        }
    }

    /// Returns a copy of these demands limited to the actuator ranges.
    ///
    /// Non-finite demands are replaced by zero.
    pub fn clamped(&self, max_throttle: f64) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };

        Self {
            throttle: finite_or_zero(self.throttle).max(0.0).min(max_throttle.max(0.0)),
            brake: finite_or_zero(self.brake).max(0.0),
            steer_deg: finite_or_zero(self.steer_deg)
                .max(-MAX_STEER_DEG)
                .min(MAX_STEER_DEG),
        }
    }
}

impl RoverCmd {
    /// Name of the event this command is emitted under.
    pub fn event_name(&self) -> &'static str {
        match self {
            RoverCmd::Drive(_) => "data",
            RoverCmd::Pickup => "pickup",
        }
    }

    /// Body of the event sent to the simulator.
    ///
    /// The simulator parses all drive values from strings.
    pub fn payload(&self) -> Value {
        match self {
            RoverCmd::Drive(d) => json!({
                "throttle": d.throttle.to_string(),
                "brake": d.brake.to_string(),
                "steering_angle": d.steer_deg.to_string(),
            }),
            RoverCmd::Pickup => json!({}),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamped() {
        let d = DriveDems {
            throttle: 5.0,
            brake: -1.0,
            steer_deg: -40.0,
        }
        .clamped(2.0);

        assert_eq!(d.throttle, 2.0);
        assert_eq!(d.brake, 0.0);
        assert_eq!(d.steer_deg, -MAX_STEER_DEG);

        let d = DriveDems {
            throttle: f64::NAN,
            brake: f64::INFINITY,
            steer_deg: f64::NAN,
        }
        .clamped(2.0);

        assert_eq!(d, DriveDems::default());
    }

    #[test]
    fn test_payload() {
        let cmd = RoverCmd::Drive(DriveDems {
            throttle: 0.5,
            brake: 0.0,
            steer_deg: -15.0,
        });

        assert_eq!(cmd.event_name(), "data");
        assert_eq!(cmd.payload()["throttle"], "0.5");
        assert_eq!(cmd.payload()["steering_angle"], "-15");

        assert_eq!(RoverCmd::Pickup.event_name(), "pickup");
        assert_eq!(RoverCmd::Pickup.payload(), json!({}));
    }
}
