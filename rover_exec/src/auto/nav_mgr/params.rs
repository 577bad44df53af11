//! # NavMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::NavMgrError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the navigation manager and all its modes.
///
/// Distances are in warped image pixels, as produced by perception. Ticks are cycles of the main
/// loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavMgrParams {
    // ---- THRESHOLDS ----
    /// Below this number of navigable points the rover stops.
    pub stop_forward: usize,

    /// Above this number of navigable points a stopped rover moves off again. Must be greater
    /// than `stop_forward`.
    pub go_forward: usize,

    /// Maximum throttle demand.
    pub max_vel: f64,

    /// Brake demand used whenever the rover has to stop.
    pub brake_set: f64,

    /// Steering demand used to turn on the spot while scanning for open ground.
    ///
    /// Units: degrees
    pub scan_steer_deg: f64,

    /// The rover is considered halted below this speed.
    ///
    /// Units: meters/second
    pub halt_vel_epsilon: f64,

    // ---- FORWARD ----
    /// Throttle per pixel of clearance ahead.
    pub throttle_clearance_gain: f64,

    /// Throttle reduction per meter/second of speed.
    pub throttle_vel_gain: f64,

    /// Added to the mean navigable angle, positive values hug the left wall.
    ///
    /// Units: degrees
    pub wall_bias_deg: f64,

    /// A sample closer than this is in reach whatever the rover's speed.
    pub sample_reach_px: f64,

    /// Extra reach per meter/second of speed.
    ///
    /// Units: seconds (pixels per meter/second)
    pub sample_closing_time_s: f64,

    /// The rover is stalled if its speed stays below this while throttle is demanded.
    ///
    /// Units: meters/second
    pub stall_vel_epsilon: f64,

    /// Number of stalled ticks after which the rover is stuck.
    pub stuck_timeout_ticks: u64,

    // ---- STUCK ----
    /// Number of ticks braking at the start of a recovery.
    pub stuck_settle_ticks: u64,

    /// Number of ticks turning on the spot.
    pub stuck_rotate_ticks: u64,

    /// Number of ticks creeping straight ahead.
    pub stuck_creep_ticks: u64,

    /// Throttle demand while creeping.
    pub stuck_creep_throttle: f64,

    // ---- SAMPLING ----
    /// Throttle per pixel of distance to the sample.
    pub approach_throttle_gain: f64,

    /// Minimum throttle while approaching a sample.
    pub approach_min_throttle: f64,

    /// A sample further than this is considered lost.
    pub sample_lost_px: f64,

    /// Below this speed a pickup may be requested.
    ///
    /// Units: meters/second
    pub pickup_vel_epsilon: f64,

    /// Number of ticks to wait for the simulator to start a requested pickup before allowing
    /// another request.
    pub pickup_timeout_ticks: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavMgrParams {
    fn default() -> Self {
        Self {
            stop_forward: 50,
            go_forward: 500,
            max_vel: 2.0,
            brake_set: 10.0,
            scan_steer_deg: -15.0,
            halt_vel_epsilon: 0.2,

            throttle_clearance_gain: 0.005,
            throttle_vel_gain: 0.2,
            wall_bias_deg: 0.0,
            sample_reach_px: 20.0,
            sample_closing_time_s: 5.0,
            stall_vel_epsilon: 0.05,
            stuck_timeout_ticks: 60,

            stuck_settle_ticks: 10,
            stuck_rotate_ticks: 25,
            stuck_creep_ticks: 25,
            stuck_creep_throttle: 0.5,

            approach_throttle_gain: 0.01,
            approach_min_throttle: 0.1,
            sample_lost_px: 70.0,
            pickup_vel_epsilon: 0.0,
            pickup_timeout_ticks: 100,
        }
    }
}

impl NavMgrParams {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), NavMgrError> {
        let invalid = |msg: &str| Err(NavMgrError::InvalidParams(msg.into()));

        if self.go_forward <= self.stop_forward {
            return invalid("go_forward must be greater than stop_forward");
        }
        if !(self.max_vel > 0.0) {
            return invalid("max_vel must be positive");
        }
        if !(self.brake_set > 0.0) {
            return invalid("brake_set must be positive");
        }
        if self.halt_vel_epsilon < 0.0 || self.pickup_vel_epsilon < 0.0 {
            return invalid("velocity tolerances must not be negative");
        }
        if self.approach_min_throttle < 0.0 || self.stuck_creep_throttle < 0.0 {
            return invalid("throttle demands must not be negative");
        }

        Ok(())
    }

    /// Maximum number of ticks a stuck recovery takes.
    pub fn stuck_budget_ticks(&self) -> u64 {
        (self.stuck_settle_ticks + self.stuck_rotate_ticks + self.stuck_creep_ticks).max(1)
    }
}
