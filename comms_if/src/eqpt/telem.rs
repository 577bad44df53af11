//! # Rover Telemetry Interface
//!
//! One [`RoverTelem`] is recieved per cycle from the simulator. The camera frame has already been
//! decoded by the transport layer, the remaining fields are the raw values the simulator reports.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::RgbImage;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single telemetry sample from the simulated rover.
#[derive(Debug, Clone)]
pub struct RoverTelem {
    /// UTC timestamp at which the sample was recieved
    pub timestamp: DateTime<Utc>,

    /// Front camera frame
    pub image: RgbImage,

    /// Ground speed of the rover.
    ///
    /// Units: meters/second. Not guaranteed to be finite, see [`RoverTelem::is_valid`].
    pub speed_ms: f64,

    /// Position of the rover in the world map frame.
    ///
    /// Units: meters (one world map cell per meter)
    pub position_m: [f64; 2],

    /// Heading of the rover, anticlockwise from the world X axis.
    ///
    /// Units: degrees, in [0, 360)
    pub yaw_deg: f64,

    /// Pitch of the rover.
    ///
    /// Units: degrees, in [0, 360), so a small nose down pitch is reported close to 360
    pub pitch_deg: f64,

    /// Roll of the rover.
    ///
    /// Units: degrees, in [0, 360)
    pub roll_deg: f64,

    /// Current throttle as reported by the simulator
    pub throttle: f64,

    /// Current steering angle as reported by the simulator.
    ///
    /// Units: degrees
    pub steer_deg: f64,

    /// True if the rover is close enough to a sample to pick it up
    pub near_sample: bool,

    /// True while the simulator is executing a pickup
    pub picking_up: bool,

    /// Number of samples remaining in the world
    pub sample_count: u32,

    /// Known positions of the samples in the world map frame, only sent by some simulator
    /// versions and only on the first sample of a session.
    pub samples_pos_m: Option<Vec<[f64; 2]>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoverTelem {
    /// Returns true if the sample can be used for processing.
    ///
    /// The simulator occasionally reports a non-finite speed (typically on the first frame after a
    /// reset), in which case the whole sample must be discarded.
    pub fn is_valid(&self) -> bool {
        self.speed_ms.is_finite()
    }
}
