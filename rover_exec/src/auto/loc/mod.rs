//! # Localisation module
//!
//! The simulator provides the rover's pose directly, so localisation reduces to representing that
//! pose and deciding whether the rover is level enough for its camera projection to be trusted.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::telem::RoverTelem;
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::wrap_180_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the world map frame) of the rover.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the world map frame.
    ///
    /// Units: meters, one world map cell is one meter.
    pub position_m: Vector2<f64>,

    /// Heading, anticlockwise from the world X axis.
    ///
    /// Units: degrees
    pub yaw_deg: f64,

    /// Pitch, wrapping at 360.
    ///
    /// Units: degrees
    pub pitch_deg: f64,

    /// Roll, wrapping at 360.
    ///
    /// Units: degrees
    pub roll_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Build the pose reported in a telemetry sample.
    pub fn from_telem(telem: &RoverTelem) -> Self {
        Self {
            position_m: Vector2::new(telem.position_m[0], telem.position_m[1]),
            yaw_deg: telem.yaw_deg,
            pitch_deg: telem.pitch_deg,
            roll_deg: telem.roll_deg,
        }
    }

    /// Return the heading of the rover in radians.
    pub fn get_heading(&self) -> f64 {
        self.yaw_deg.to_radians()
    }

    /// Rotation from the rover frame into the world map frame.
    pub fn rotation(&self) -> Rotation2<f64> {
        Rotation2::new(self.get_heading())
    }

    /// Returns true if both pitch and roll are strictly within `tolerance_deg` of level.
    ///
    /// Angles are wrapped first, so 359.5 degrees is treated as -0.5 degrees.
    pub fn is_level(&self, tolerance_deg: f64) -> bool {
        wrap_180_deg(self.pitch_deg).abs() < tolerance_deg
            && wrap_180_deg(self.roll_deg).abs() < tolerance_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn pose_with_attitude(pitch_deg: f64, roll_deg: f64) -> Pose {
        Pose {
            pitch_deg,
            roll_deg,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_level() {
        assert!(pose_with_attitude(0.0, 0.0).is_level(1.0));
        assert!(pose_with_attitude(0.5, 359.5).is_level(1.0));
        assert!(pose_with_attitude(-0.5, 0.2).is_level(1.0));

        assert!(!pose_with_attitude(1.5, 0.0).is_level(1.0));
        assert!(!pose_with_attitude(0.0, 358.0).is_level(1.0));
        assert!(!pose_with_attitude(359.0, 0.0).is_level(1.0));
    }

    #[test]
    fn test_rotation() {
        let pose = Pose {
            yaw_deg: 90.0,
            ..Default::default()
        };

        let rotated = pose.rotation() * Vector2::new(1.0, 0.0);

        assert!(rotated.x.abs() < 1e-12);
        assert!((rotated.y - 1.0).abs() < 1e-12);
    }
}
