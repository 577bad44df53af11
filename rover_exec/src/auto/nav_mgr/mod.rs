//! # NavMgr module
//!
//! This module implements the [`NavMgr`] state machine, which decides how the rover drives based on
//! what perception sees. The state machine is broken down into a number of modes:
//!
//! - `Forward` - Drive along the open ground, steering toward any visible sample.
//! - `Stop` - Brake to a halt, then turn on the spot until open ground is found.
//! - `Stuck` - A fixed manoeuvre to free a rover which isn't moving despite demanding throttle.
//! - `Sampling` - Approach a sample and hold next to it while it is picked up.
//!
//! Each mode's step function reports a [`Trigger`], and all transitions between modes are made by
//! [`transition`]. Whatever the mode, a pickup is requested once the rover is halted next to a
//! sample.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod forward;
mod params;
mod sampling;
mod stop;
mod stuck;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::tc::{DriveDems, RoverCmd};
use log::{info, trace};
use serde::{Deserialize, Serialize};
use util::{module::State, params as util_params};

use super::per::{PerOutput, PolarPoint};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use self::{params::NavMgrParams, stuck::StuckPhase, tm::NavTm};

pub mod modes {
    pub use super::forward::Forward;
    pub use super::sampling::Sampling;
    pub use super::stop::Stop;
    pub use super::stuck::Stuck;
}

use modes::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation Manager
///
/// Holds the current mode and the state of any outstanding pickup request.
#[derive(Debug, Clone)]
pub struct NavMgr {
    /// Parameters for the NavMgr and all its modes.
    pub params: NavMgrParams,

    /// The current mode
    mode: NavMode,

    /// Number of consecutive cycles spent in the current mode
    mode_ticks: u64,

    /// Set when a pickup is requested, cleared once the rover has left the sample or the
    /// simulator never started the pickup.
    pickup_in_flight: bool,

    /// Number of cycles since the pickup was requested that the simulator hasn't been picking up
    pickup_wait_ticks: u64,
}

/// Everything the navigation manager needs from one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavInput {
    /// Number of navigable points seen
    pub nav_count: usize,

    /// Mean bearing of the navigable points, `None` if there are none.
    ///
    /// Units: degrees
    pub nav_mean_angle_deg: Option<f64>,

    /// Mean distance of the open ground straight ahead.
    ///
    /// Units: warped image pixels
    pub clearance: f64,

    /// Mean bearing of the sample points, `None` if there are none.
    ///
    /// Units: degrees
    pub sample_mean_angle_deg: Option<f64>,

    /// The sample point closest to the rover
    pub nearest_sample: Option<PolarPoint>,

    /// Speed of the rover.
    ///
    /// Units: meters/second
    pub vel_ms: f64,

    /// True if the rover is close enough to a sample to pick it up
    pub near_sample: bool,

    /// True while the simulator is picking up a sample
    pub picking_up: bool,
}

/// Output of a mode's step function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    /// Event used to decide the next mode
    pub trigger: Trigger,

    /// Demands for this cycle
    pub dems: DriveDems,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the navigation manager.
#[derive(Debug, thiserror::Error)]
pub enum NavMgrError {
    #[error("Failed to load NavMgrParams: {0}")]
    ParamLoadError(util_params::LoadError),

    #[error("Invalid NavMgrParams: {0}")]
    InvalidParams(String),

    #[error("The rover speed is not finite: {0}")]
    InvalidVelocity(f64),
}

/// The modes of the navigation manager, holding each mode's state.
#[derive(Debug, Clone, PartialEq)]
pub enum NavMode {
    Forward(Forward),
    Stop(Stop),
    Stuck(Stuck),
    Sampling(Sampling),
}

/// The modes of the navigation manager, without their state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavModeKind {
    Forward,
    Stop,
    Stuck,
    Sampling,
}

/// Events produced by a mode's step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Nothing happened which would change the mode
    None,

    /// Not enough open ground ahead to keep driving
    NoPath,

    /// Enough open ground to drive again
    PathFound,

    /// A sample is close enough to approach
    SampleInReach,

    /// The sample being approached is no longer visible
    SampleLost,

    /// Throttle demanded for too long without the rover moving
    Stalled,

    /// The stuck recovery manoeuvre has finished
    RecoveryComplete,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The mode which follows `mode` when `trigger` occurs.
pub fn transition(mode: NavModeKind, trigger: Trigger) -> NavModeKind {
    match (mode, trigger) {
        (NavModeKind::Forward, Trigger::NoPath) => NavModeKind::Stop,
        (NavModeKind::Forward, Trigger::SampleInReach) => NavModeKind::Sampling,
        (NavModeKind::Forward, Trigger::Stalled) => NavModeKind::Stuck,
        (NavModeKind::Stop, Trigger::PathFound) => NavModeKind::Forward,
        (NavModeKind::Stuck, Trigger::RecoveryComplete) => NavModeKind::Forward,
        (NavModeKind::Sampling, Trigger::SampleLost) => NavModeKind::Forward,
        (mode, _) => mode,
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavMgr {
    fn default() -> Self {
        Self::new(NavMgrParams::default())
    }
}

impl NavMgr {
    /// Create a new manager in `Forward` mode.
    pub fn new(params: NavMgrParams) -> Self {
        Self {
            params,
            mode: NavMode::enter(NavModeKind::Forward),
            mode_ticks: 0,
            pickup_in_flight: false,
            pickup_wait_ticks: 0,
        }
    }

    pub fn mode(&self) -> &NavMode {
        &self.mode
    }

    pub fn mode_kind(&self) -> NavModeKind {
        self.mode.kind()
    }

    /// Decide whether to request a pickup this cycle.
    ///
    /// A request is made when the rover is halted next to a sample and the simulator isn't
    /// already picking up, and is not repeated while the request is outstanding.
    fn update_pickup(&mut self, input: &NavInput) -> bool {
        if self.pickup_in_flight {
            if input.picking_up {
                self.pickup_wait_ticks = 0;
            } else {
                self.pickup_wait_ticks += 1;
            }

            if (!input.near_sample && !input.picking_up)
                || self.pickup_wait_ticks > self.params.pickup_timeout_ticks
            {
                self.pickup_in_flight = false;
                self.pickup_wait_ticks = 0;
            }
        }

        let want_pickup = input.near_sample
            && input.vel_ms.abs() <= self.params.pickup_vel_epsilon
            && !input.picking_up;

        if want_pickup && !self.pickup_in_flight {
            self.pickup_in_flight = true;
            self.pickup_wait_ticks = 0;
            true
        } else {
            false
        }
    }
}

impl State for NavMgr {
    type InitData = &'static str;
    type InitError = NavMgrError;

    type InputData = NavInput;
    type OutputData = RoverCmd;
    type StatusReport = NavTm;
    type ProcError = NavMgrError;

    /// Initialise the NavMgr.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: NavMgrParams =
            util_params::load(init_data).map_err(NavMgrError::ParamLoadError)?;

        params.validate()?;

        *self = Self::new(params);

        Ok(())
    }

    /// Step the current mode, make any transition, and produce the command for this cycle.
    fn proc(
        &mut self,
        input: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !input.vel_ms.is_finite() {
            return Err(NavMgrError::InvalidVelocity(input.vel_ms));
        }

        let out = self.mode.step(&self.params, input);

        let next = transition(self.mode.kind(), out.trigger);
        if next != self.mode.kind() {
            self.mode = NavMode::enter(next);
            self.mode_ticks = 0;
            info!("NavMgr mode change to: {}", self.mode);
        } else {
            self.mode_ticks += 1;
        }

        let send_pickup = self.update_pickup(input);

        // Hold position for as long as a pickup is outstanding, whatever the mode
        let dems = if input.picking_up || self.pickup_in_flight {
            DriveDems::brake(self.params.brake_set)
        } else {
            out.dems
        };

        let cmd = if send_pickup {
            info!("Requesting sample pickup");
            RoverCmd::Pickup
        } else {
            RoverCmd::Drive(dems.clamped(self.params.max_vel))
        };

        trace!("NavMgr {} ({:?}): {:?}", self.mode, out.trigger, cmd);

        Ok((
            cmd,
            NavTm {
                mode: self.mode.kind(),
                trigger: out.trigger,
                mode_ticks: self.mode_ticks,
                send_pickup,
                pickup_in_flight: self.pickup_in_flight,
            },
        ))
    }
}

impl NavInput {
    /// Summarise a perception output and the rover's state for navigation.
    pub fn from_per(per: &PerOutput, vel_ms: f64, near_sample: bool, picking_up: bool) -> Self {
        Self {
            nav_count: per.navigable.len(),
            nav_mean_angle_deg: per.navigable.mean_angle_deg(),
            clearance: per.clearance,
            sample_mean_angle_deg: per.sample.mean_angle_deg(),
            nearest_sample: per.sample.nearest().copied(),
            vel_ms,
            near_sample,
            picking_up,
        }
    }
}

impl StepOutput {
    pub fn new(trigger: Trigger, dems: DriveDems) -> Self {
        Self { trigger, dems }
    }
}

impl NavMode {
    /// Create the fresh state of a mode being entered.
    pub fn enter(kind: NavModeKind) -> Self {
        match kind {
            NavModeKind::Forward => NavMode::Forward(Forward::new()),
            NavModeKind::Stop => NavMode::Stop(Stop::new()),
            NavModeKind::Stuck => NavMode::Stuck(Stuck::new()),
            NavModeKind::Sampling => NavMode::Sampling(Sampling::new()),
        }
    }

    pub fn kind(&self) -> NavModeKind {
        match self {
            NavMode::Forward(_) => NavModeKind::Forward,
            NavMode::Stop(_) => NavModeKind::Stop,
            NavMode::Stuck(_) => NavModeKind::Stuck,
            NavMode::Sampling(_) => NavModeKind::Sampling,
        }
    }

    fn step(&mut self, params: &NavMgrParams, input: &NavInput) -> StepOutput {
        match self {
            NavMode::Forward(forward) => forward.step(params, input),
            NavMode::Stop(stop) => stop.step(params, input),
            NavMode::Stuck(stuck) => stuck.step(params, input),
            NavMode::Sampling(sampling) => sampling.step(params, input),
        }
    }
}

impl Display for NavMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NavMode::{}", self.kind())
    }
}

impl Display for NavModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavModeKind::Forward => write!(f, "Forward"),
            NavModeKind::Stop => write!(f, "Stop"),
            NavModeKind::Stuck => write!(f, "Stuck"),
            NavModeKind::Sampling => write!(f, "Sampling"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
