//! # Rover State
//!
//! Everything the executable knows about the rover, carried from one cycle to the next. A single
//! [`RoverState`] is created at startup and stepped once per telemetry sample by
//! [`RoverState::tick`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::{
    eqpt::telem::RoverTelem,
    tc::{DriveDems, RoverCmd},
};
use log::{info, warn};
use serde::Serialize;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
    time::duration_to_seconds,
};

use crate::auto::{
    loc::Pose,
    map::{GroundTruth, MapStats, WorldMap},
    nav_mgr::{NavInput, NavTm},
    per::PerOutput,
    NavMgr, PerMgr,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Global state of the rover executable.
pub struct RoverState {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Number of cycles whose telemetry was invalid and discarded
    pub invalid_telem_ticks: u64,

    /// Number of cycles on which the world map wasn't updated because the rover wasn't level
    pub map_skipped_ticks: u64,

    /// Timestamp of the first telemetry sample
    pub first_telem_time: Option<DateTime<Utc>>,

    /// Seconds between the first telemetry sample and the current one
    pub telem_time_s: f64,

    /// False if this cycle's telemetry was discarded
    pub telem_valid: bool,

    // Rover state
    pub pose: Pose,

    /// Speed of the rover.
    ///
    /// Units: meters/second
    pub vel_ms: f64,

    pub near_sample: bool,
    pub picking_up: bool,

    // Samples
    /// Number of samples in the world at the start of the session, `None` until the first
    /// telemetry sample.
    pub samples_to_find: Option<u32>,

    /// Number of samples picked up so far
    pub samples_collected: u32,

    /// Known positions of the samples, in world map cells
    pub samples_pos: Vec<[f64; 2]>,

    // Perception
    pub per_mgr: PerMgr,
    pub per_output: PerOutput,
    pub world_map: WorldMap,

    /// Navigable area of the world, used to score the world map
    pub ground_truth: Option<GroundTruth>,

    // Navigation
    pub nav_mgr: NavMgr,
    pub nav_input: NavInput,
    pub nav_tm: NavTm,

    /// Command sent to the simulator this cycle
    pub cmd: RoverCmd,

    archiver: Archiver,
}

/// One row of the cycle archive.
#[derive(Debug, Serialize)]
struct TickRecord {
    num_cycles: u64,
    telem_time_s: f64,
    valid: bool,
    x_m: f64,
    y_m: f64,
    yaw_deg: f64,
    vel_ms: f64,
    nav_count: usize,
    sample_count: usize,
    clearance: f64,
    mode: String,
    trigger: String,
    pickup: bool,
    throttle: f64,
    brake: f64,
    steer_deg: f64,
    samples_collected: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoverState {
    /// Create the state from initialised managers.
    pub fn new(per_mgr: PerMgr, nav_mgr: NavMgr) -> Self {
        let world_map = WorldMap::new(per_mgr.params.world_map.clone());

        Self {
            num_cycles: 0,
            invalid_telem_ticks: 0,
            map_skipped_ticks: 0,
            first_telem_time: None,
            telem_time_s: 0.0,
            telem_valid: false,
            pose: Pose::default(),
            vel_ms: 0.0,
            near_sample: false,
            picking_up: false,
            samples_to_find: None,
            samples_collected: 0,
            samples_pos: Vec::new(),
            per_mgr,
            per_output: PerOutput::default(),
            world_map,
            ground_truth: None,
            nav_mgr,
            nav_input: NavInput::default(),
            nav_tm: NavTm::default(),
            cmd: RoverCmd::Drive(DriveDems::default()),
            archiver: Archiver::default(),
        }
    }

    /// Archive each cycle into `rover_state.csv` in the session's archive directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.archiver = Archiver::from_path(session, "rover_state.csv")?;
        Ok(())
    }

    /// Process one telemetry sample and return the command to send back.
    ///
    /// If the telemetry is invalid perception and navigation are skipped, the world map is left
    /// untouched, and the rover is commanded to do nothing.
    pub fn tick(&mut self, telem: &RoverTelem) -> RoverCmd {
        self.num_cycles += 1;
        self.update_samples(telem);

        let first_time = *self.first_telem_time.get_or_insert(telem.timestamp);
        self.telem_time_s = duration_to_seconds(telem.timestamp - first_time).unwrap_or(0.0);

        self.telem_valid = telem.is_valid();
        if !self.telem_valid {
            warn!(
                "Invalid telemetry (speed {}), cycle {} skipped",
                telem.speed_ms, self.num_cycles
            );
            self.invalid_telem_ticks += 1;

            // Nothing was perceived or decided this cycle
            self.per_output = PerOutput::default();
            self.nav_input = NavInput::default();
            self.nav_tm = NavTm {
                mode: self.nav_mgr.mode_kind(),
                ..NavTm::default()
            };

            self.cmd = RoverCmd::Drive(DriveDems::default());
            return self.cmd;
        }

        self.pose = Pose::from_telem(telem);
        self.vel_ms = telem.speed_ms;
        self.near_sample = telem.near_sample;
        self.picking_up = telem.picking_up;

        // ---- PERCEPTION ----

        self.per_output = self.per_mgr.process(&telem.image);

        if !self.world_map.update(&self.per_output, &self.pose) {
            self.map_skipped_ticks += 1;
        }

        // ---- NAVIGATION ----

        self.nav_input = NavInput::from_per(
            &self.per_output,
            self.vel_ms,
            self.near_sample,
            self.picking_up,
        );

        self.cmd = match self.nav_mgr.proc(&self.nav_input) {
            Ok((cmd, tm)) => {
                self.nav_tm = tm;
                cmd
            }
            Err(e) => {
                warn!("Error during NavMgr processing: {}", e);
                RoverCmd::Drive(DriveDems::default())
            }
        };

        self.cmd
    }

    /// Latch the sample totals on the first sample, and count the samples collected since.
    fn update_samples(&mut self, telem: &RoverTelem) {
        let to_find = match self.samples_to_find {
            Some(n) => n,
            None => {
                self.samples_to_find = Some(telem.sample_count);
                // One world map cell per meter
                if let Some(ref pos) = telem.samples_pos_m {
                    self.samples_pos = pos.clone();
                }
                info!(
                    "{} samples to find, {} positions known",
                    telem.sample_count,
                    self.samples_pos.len()
                );
                telem.sample_count
            }
        };

        let collected = to_find.saturating_sub(telem.sample_count);
        if collected > self.samples_collected {
            info!("Sample collected, {} of {}", collected, to_find);
        }
        self.samples_collected = collected;
    }

    /// Statistics on the quality of the world map.
    pub fn map_stats(&self) -> MapStats {
        MapStats::compute(
            &self.world_map,
            self.ground_truth.as_ref(),
            &self.samples_pos,
        )
    }
}

impl Archived for RoverState {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let dems = match self.cmd {
            RoverCmd::Drive(d) => d,
            RoverCmd::Pickup => DriveDems::default(),
        };

        let record = TickRecord {
            num_cycles: self.num_cycles,
            telem_time_s: self.telem_time_s,
            valid: self.telem_valid,
            x_m: self.pose.position_m[0],
            y_m: self.pose.position_m[1],
            yaw_deg: self.pose.yaw_deg,
            vel_ms: self.vel_ms,
            nav_count: self.per_output.navigable.len(),
            sample_count: self.per_output.sample.len(),
            clearance: self.per_output.clearance,
            mode: self.nav_tm.mode.to_string(),
            trigger: format!("{:?}", self.nav_tm.trigger),
            pickup: self.cmd == RoverCmd::Pickup,
            throttle: dems.throttle,
            brake: dems.brake,
            steer_deg: dems.steer_deg,
            samples_collected: self.samples_collected,
        };

        self.archiver.serialise(record)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::{
        nav_mgr::{NavMgrParams, NavModeKind, Trigger},
        per::PerMgrParams,
    };
    use image::{Rgb, RgbImage};

    fn state() -> RoverState {
        RoverState::new(
            PerMgr::new(PerMgrParams::default()).unwrap(),
            NavMgr::new(NavMgrParams::default()),
        )
    }

    fn telem(image: RgbImage) -> RoverTelem {
        RoverTelem {
            timestamp: Utc::now(),
            image,
            speed_ms: 0.0,
            position_m: [100.0, 100.0],
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            throttle: 0.0,
            steer_deg: 0.0,
            near_sample: false,
            picking_up: false,
            sample_count: 6,
            samples_pos_m: Some(vec![[110.0, 100.0]]),
        }
    }

    fn open_ground() -> RgbImage {
        RgbImage::from_pixel(320, 160, Rgb([200, 200, 200]))
    }

    #[test]
    fn test_open_ground() {
        let mut state = state();

        let cmd = state.tick(&telem(open_ground()));

        match cmd {
            RoverCmd::Drive(d) => {
                assert!(d.throttle > 0.0);
                assert_eq!(d.brake, 0.0);
            }
            RoverCmd::Pickup => panic!("Unexpected pickup"),
        }
        assert_eq!(state.nav_mgr.mode_kind(), NavModeKind::Forward);
        assert!(state.map_stats().nav_cells > 0);
        assert_eq!(state.num_cycles, 1);
        assert_eq!(state.map_skipped_ticks, 0);
    }

    #[test]
    fn test_invalid_velocity() {
        let mut state = state();
        state.tick(&telem(open_ground()));
        let map_before = state.world_map.clone();
        let mode_before = state.nav_mgr.mode_kind();

        for &speed_ms in &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let cmd = state.tick(&RoverTelem {
                speed_ms,
                position_m: [50.0, 50.0],
                ..telem(open_ground())
            });

            assert_eq!(cmd, RoverCmd::Drive(DriveDems::default()));
            assert_eq!(state.world_map, map_before);
            assert_eq!(state.nav_mgr.mode_kind(), mode_before);
        }

        assert_eq!(state.invalid_telem_ticks, 3);
        assert_eq!(state.num_cycles, 4);
    }

    #[test]
    fn test_invalid_velocity_clears_outputs() {
        let mut state = state();
        state.tick(&telem(open_ground()));
        assert!(!state.per_output.navigable.is_empty());
        assert!(state.per_output.clearance > 0.0);

        state.tick(&RoverTelem {
            speed_ms: f64::NAN,
            ..telem(open_ground())
        });

        assert!(!state.telem_valid);
        assert!(state.per_output.navigable.is_empty());
        assert_eq!(state.per_output.clearance, 0.0);
        assert_eq!(state.nav_input, NavInput::default());
        assert_eq!(state.nav_tm.mode, state.nav_mgr.mode_kind());
        assert_eq!(state.nav_tm.trigger, Trigger::None);
        assert!(!state.nav_tm.send_pickup);
    }

    #[test]
    fn test_not_level() {
        let mut state = state();

        let cmd = state.tick(&RoverTelem {
            pitch_deg: 3.0,
            ..telem(open_ground())
        });

        // Navigation still runs on the momentary view
        assert!(matches!(cmd, RoverCmd::Drive(d) if d.throttle > 0.0));
        assert_eq!(state.map_skipped_ticks, 1);
        assert_eq!(state.map_stats().nav_cells, 0);
    }

    #[test]
    fn test_samples_collected() {
        let mut state = state();

        state.tick(&telem(open_ground()));
        assert_eq!(state.samples_to_find, Some(6));
        assert_eq!(state.samples_collected, 0);
        assert_eq!(state.samples_pos, vec![[110.0, 100.0]]);

        state.tick(&RoverTelem {
            sample_count: 4,
            samples_pos_m: None,
            ..telem(open_ground())
        });
        assert_eq!(state.samples_to_find, Some(6));
        assert_eq!(state.samples_collected, 2);
        assert_eq!(state.samples_pos, vec![[110.0, 100.0]]);
    }

    #[test]
    fn test_archive_not_init() {
        let mut state = state();
        state.tick(&telem(open_ground()));

        assert!(matches!(state.write(), Err(ArchiveError::NotInit)));
    }
}
