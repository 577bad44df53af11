//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telemetry acquisition
//!         - Perception:
//!             - Terrain classification of the camera frame
//!             - World map accumulation
//!         - Navigation mode processing
//!         - Command output
//!         - Archiving
//!
//! # Usage
//!
//! `rover_exec [DRIVE_LOG]`, if no drive log is given the one in `rover_exec.toml` is replayed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, trace, warn};
use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::tc::RoverCmd;
use rover_lib::{
    auto::{map::GroundTruth, NavMgr, PerMgr},
    params::RoverExecParams,
    replay_client::{ReplayClient, TelemSource},
    rover_state::RoverState,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "rover_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sample Return Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: RoverExecParams = util::params::load(
        "rover_exec.toml"
    ).wrap_err("Could not load exec params")?;

    params.validate().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TELEMETRY SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the drive log path
    let log_path = match args.len() {
        1 => sw_path(&params.replay_log_path)?,
        2 => PathBuf::from(&args[1]),
        _ => return Err(eyre!(
            "Expected either zero or one argument, found {}", args.len() - 1
        ))
    };

    info!("Replaying drive log from {:?}", log_path);

    let mut telem_source = ReplayClient::open(&log_path)
        .wrap_err("Failed to open the drive log")?;

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let per_mgr = PerMgr::init("per_mgr.toml")
        .wrap_err("Failed to initialise PerMgr")?;
    info!("PerMgr init complete");

    let mut nav_mgr = NavMgr::default();
    nav_mgr.init("nav_mgr.toml")
        .wrap_err("Failed to initialise NavMgr")?;
    info!("NavMgr init complete");

    let mut rs = RoverState::new(per_mgr, nav_mgr);

    rs.init_archive(&session)
        .wrap_err("Failed to initialise the RoverState archive")?;

    if let Some(ref path) = params.ground_truth_path {
        match GroundTruth::open(sw_path(path)?) {
            Ok(gt) => rs.ground_truth = Some(gt),
            Err(e) => warn!("Could not load the ground truth map, map fidelity will not be \
                computed: {}", e)
        }
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(params.cycle_period_s);
    let mut num_consec_cycle_overruns = 0u64;

    // Print a summary every 10 seconds
    let summary_cycles = ((10.0 / params.cycle_period_s) as u64).max(1);

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELEMETRY ----

        let telem = match telem_source.next_telem()
            .wrap_err("Failed to read telemetry")?
        {
            Some(t) => t,
            None => {
                info!("End of drive log reached");
                break;
            }
        };

        // ---- AUTONOMY PROCESSING ----

        let cmd = rs.tick(&telem);

        match cmd {
            RoverCmd::Pickup => info!(
                "Cycle {}: {} {}", rs.num_cycles, cmd.event_name(), cmd.payload()
            ),
            RoverCmd::Drive(_) => trace!(
                "Cycle {}: {} {}", rs.num_cycles, cmd.event_name(), cmd.payload()
            )
        }

        if rs.num_cycles % summary_cycles == 0 {
            info!(
                "Cycle {}: {}, {}, {} of {:?} samples collected",
                rs.num_cycles,
                rs.nav_tm.mode,
                rs.map_stats(),
                rs.samples_collected,
                rs.samples_to_find
            );
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = rs.write() {
            warn!("Could not archive the RoverState: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                num_consec_cycle_overruns += 1;
                warn!(
                    "Cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64(),
                    num_consec_cycle_overruns
                );
            }
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "{} cycles run, {} with invalid telemetry, {} without a map update",
        rs.num_cycles,
        rs.invalid_telem_ticks,
        rs.map_skipped_ticks
    );
    info!("Final map statistics: {}", rs.map_stats());

    let map_path = session.session_root.join("world_map.json");
    rs.world_map.save(&map_path)
        .wrap_err("Failed to save the world map")?;
    info!("World map saved to {:?}", map_path);

    info!("End of execution");

    Ok(())
}

/// Resolve a path relative to the software root, leaving absolute paths as they are.
fn sw_path(path: &str) -> Result<PathBuf, Report> {
    let path = PathBuf::from(path);

    if path.is_absolute() {
        Ok(path)
    }
    else {
        Ok(host::get_sw_root()
            .wrap_err("The software root environment variable is not set")?
            .join(path))
    }
}
