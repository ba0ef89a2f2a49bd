//! # Autonomy Executable
//!
//! Runs one scripted autonomous routine against the robot.
//!
//! Usage:
//!
//! ```text
//! auto_exec <path/to/routine.auto>
//! ```
//!
//! The executable:
//!     - Creates a session and initialises logging
//!     - Loads `auto_exec.toml` from the parameters directory
//!     - Parses the routine script
//!     - Resets the encoders and starts the autonomous period
//!     - Runs the routine until it's complete or the period expires
//!
//! A Ctrl+C doesn't kill the process, it ends the current move through the
//! normal teardown so every motor is left stopped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Result};
use log::{info, warn};
use std::env;
use std::rc::Rc;

// Internal
use auto_lib::{
    clock::{Clock, CycleClock, TimeSource, WallTime},
    gate::{PeriodGate, StopFlag},
    mover::{MoveOutcome, Mover},
    params::AutoExecParams,
    routine::{parse_script, RoutineExec, Step},
    sim::{SimClock, SimRig, SimTime},
    status::LogSink,
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::ScriptInterpreter,
    session::Session,
    time::seconds_to_duration,
};

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "auto_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Autonomy Executable\n");
    info!("Running on: {}", host::get_host_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: AutoExecParams = util::params::load("auto_exec.toml")
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOAD ROUTINE ----

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err(eyre!("Expected path to the routine script as only argument"));
    }

    info!("Loading routine from \"{}\"", &args[1]);

    let si = ScriptInterpreter::new(&args[1])
        .wrap_err("Failed to load script")?;
    let steps = parse_script(&si)
        .wrap_err("Failed to parse script")?;

    info!("Loaded routine contains {} steps\n", steps.len());

    // ---- RUN ----

    let cycle_period = seconds_to_duration(params.cycle_period_s);

    if params.sim.realtime {
        let time = WallTime::new();
        run(&session, &params, &steps, CycleClock::new(time, cycle_period), time)
    }
    else {
        let time = SimTime::new();
        run(&session, &params, &steps, SimClock::new(time.clone(), cycle_period), time)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the routine on the simulated robot, using the given clock to pace the
/// control loop.
fn run<C, T>(
    session: &Session,
    params: &AutoExecParams,
    steps: &[Step],
    clock: C,
    time: T
) -> Result<()>
where
    C: Clock,
    T: TimeSource + Clone + 'static,
{
    // ---- ROBOT INITIALISATION ----

    let rig = SimRig::new(params.sim, Rc::new(time.clone()));
    let mut robot = rig.robot();

    robot.reset_encoders()
        .wrap_err("Failed to reset the encoders")?;

    // ---- EXECUTIVE INITIALISATION ----

    let stop = StopFlag::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        warn!("Stop requested by the operator");
        handler_stop.request_stop();
    }).wrap_err("Failed to install the stop handler")?;

    let gate = PeriodGate::start(
        time,
        seconds_to_duration(params.period_s),
        stop.clone()
    );

    let mover = Mover::new(
        clock,
        gate,
        LogSink::new(params.mover.report_every_n_cycles)
    );

    let archiver = Archiver::from_path(session, "routine/moves.csv")
        .wrap_err("Failed to initialise the moves archive")?;

    let mut exec = RoutineExec::new(mover, params.drive, params.lift, params.mover)
        .with_archiver(archiver);

    info!("Initialisation complete, starting routine\n");

    // ---- ROUTINE ----

    let report = exec.run(&mut robot, steps)
        .wrap_err("Routine failed")?;

    info!(
        "Routine {} after {} of {} steps ({} moves timed out, {} cancelled)",
        if report.completed { "completed" } else { "stopped" },
        report.steps.len(),
        report.num_steps,
        report.num_moves_with(MoveOutcome::TimedOut),
        report.num_moves_with(MoveOutcome::Cancelled)
    );

    if stop.is_stop_requested() {
        warn!("Routine was stopped by the operator");
    }

    info!(
        "Executive ran for {:.3} s, {:.3} s of the period remaining",
        exec.mover().clock().now().as_secs_f64(),
        exec.mover().gate().remaining().as_secs_f64()
    );

    for (id, position) in robot.positions().wrap_err("Failed to read final positions")? {
        info!("{} final position: {} ticks", id, position);
    }

    Ok(())
}
