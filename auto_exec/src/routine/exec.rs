//! Routine executive, runs the steps of a routine in order

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::{Mechanism, Step};
use crate::clock::Clock;
use crate::gate::ActiveGate;
use crate::mover::{MoveError, MoveOutcome, MoveReport, Mover, MoverParams};
use crate::robot::{Robot, RobotError};
use crate::status::StatusSink;
use crate::units::UnitConverter;
use util::{archive::Archiver, time::seconds_to_duration};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs routines against a robot.
pub struct RoutineExec<C, G, S> {
    mover: Mover<C, G, S>,

    /// Converters each routine starts with
    default_conv: Converters,

    /// Converters in use by the current routine
    conv: Converters,

    /// Defaults for moves which don't override them
    params: MoverParams,

    /// Archive of every move's outcome
    arch_moves: Option<Archiver>,
}

/// Summary of a routine's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineReport {
    /// Steps which were executed, in order.
    pub steps: Vec<StepReport>,

    /// Number of steps in the routine.
    pub num_steps: usize,

    /// True if every step was executed and the routine was still active at
    /// the end.
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Index of the step in the routine
    pub index: usize,

    pub kind: &'static str,

    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Copy)]
struct Converters {
    /// Drivetrain wheels
    drive: UnitConverter,

    /// Lift drum
    lift: UnitConverter,
}

/// Flat record of one move, as archived.
#[derive(Debug, Serialize)]
struct MoveRecord {
    step: usize,
    kind: &'static str,
    outcome: MoveOutcome,
    elapsed_s: f64,
    num_axes: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Moved(MoveReport),
    ServoSet,
    PowerSet,
    UnitsSet,

    /// A sleep ended, `interrupted` is true if the routine stopped being
    /// active before the sleep was over.
    Slept { interrupted: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("Move of step {0} failed: {1}")]
    MoveError(usize, MoveError),

    #[error("Step {0} failed: {1}")]
    RobotError(usize, RobotError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, G, S> RoutineExec<C, G, S>
where
    C: Clock,
    G: ActiveGate,
    S: StatusSink,
{
    pub fn new(
        mover: Mover<C, G, S>,
        drive_conv: UnitConverter,
        lift_conv: UnitConverter,
        params: MoverParams
    ) -> Self {
        let default_conv = Converters {
            drive: drive_conv,
            lift: lift_conv,
        };

        Self {
            mover,
            default_conv,
            conv: default_conv,
            params,
            arch_moves: None,
        }
    }

    /// Archive every move's outcome with the given archiver.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.arch_moves = Some(archiver);
        self
    }

    pub fn mover(&self) -> &Mover<C, G, S> {
        &self.mover
    }

    /// Run a routine.
    ///
    /// Steps are executed in order until they are all done or the routine
    /// stops being active. Moves which time out or are cancelled don't stop
    /// the routine, but any hardware failure ends it with an error.
    ///
    /// Every routine starts with the executive's default converters, a units
    /// step only changes them until the end of its own routine.
    pub fn run(&mut self, robot: &mut Robot, steps: &[Step]) -> Result<RoutineReport, RoutineError> {
        let mut reports = Vec::with_capacity(steps.len());
        self.conv = self.default_conv;

        for (index, step) in steps.iter().enumerate() {
            if !self.mover.is_active() {
                info!(
                    "Routine no longer active, skipping the remaining {} steps",
                    steps.len() - index
                );
                break;
            }

            info!("Step {}: {}", index, step);

            let outcome = self.run_step(robot, index, step)?;

            reports.push(StepReport {
                index,
                kind: step.kind(),
                outcome,
            });
        }

        let completed = reports.len() == steps.len() && self.mover.is_active();

        if completed {
            info!("Routine complete");
        }
        else {
            warn!("Routine ended after {} of {} steps", reports.len(), steps.len());
        }

        Ok(RoutineReport {
            steps: reports,
            num_steps: steps.len(),
            completed,
        })
    }

    fn run_step(
        &mut self,
        robot: &mut Robot,
        index: usize,
        step: &Step
    ) -> Result<StepOutcome, RoutineError> {
        let report = match step {
            Step::Drive(d) => {
                let request = robot
                    .drive_request(
                        self.conv.drive,
                        d.intensity,
                        d.inches,
                        seconds_to_duration(d.timeout_s),
                    )
                    .with_policy(d.policy.unwrap_or(self.params.policy))
                    .with_restore_mode(d.restore_mode.unwrap_or(self.params.restore_mode));

                self.mover
                    .run(request)
                    .map_err(|e| RoutineError::MoveError(index, e))?
            }
            Step::Lift(l) => {
                let request = robot
                    .lift_request(
                        self.conv.lift,
                        l.intensity,
                        l.inches,
                        seconds_to_duration(l.timeout_s),
                    )
                    .with_policy(l.policy.unwrap_or(self.params.policy))
                    .with_restore_mode(l.restore_mode.unwrap_or(self.params.restore_mode));

                self.mover
                    .run(request)
                    .map_err(|e| RoutineError::MoveError(index, e))?
            }
            Step::Servo(s) => {
                robot
                    .set_servo(s.id, s.position)
                    .map_err(|e| RoutineError::RobotError(index, e))?;

                return Ok(StepOutcome::ServoSet);
            }
            Step::Power(p) => {
                robot
                    .set_power(p.id, p.intensity)
                    .map_err(|e| RoutineError::RobotError(index, e))?;

                return Ok(StepOutcome::PowerSet);
            }
            Step::Units(u) => {
                let conv = u.converter();
                match u.mechanism {
                    Mechanism::Drive => self.conv.drive = conv,
                    Mechanism::Lift => self.conv.lift = conv,
                }

                info!(
                    "{:?} distances now converted at {:.3} ticks/in",
                    u.mechanism,
                    conv.ticks_per_unit()
                );

                return Ok(StepOutcome::UnitsSet);
            }
            Step::Sleep(s) => {
                let interrupted = !self.mover.wait(seconds_to_duration(s.duration_s));

                return Ok(StepOutcome::Slept { interrupted });
            }
        };

        if report.outcome == MoveOutcome::TimedOut {
            warn!("Step {} timed out after {:.3} s", index, report.elapsed.as_secs_f64());
        }

        self.archive_move(index, step.kind(), &report);

        Ok(StepOutcome::Moved(report))
    }

    fn archive_move(&mut self, index: usize, kind: &'static str, report: &MoveReport) {
        if let Some(ref mut arch) = self.arch_moves {
            let record = MoveRecord {
                step: index,
                kind,
                outcome: report.outcome,
                elapsed_s: report.elapsed.as_secs_f64(),
                num_axes: report.axes.len(),
            };

            if let Err(e) = arch.serialise(record) {
                warn!("Could not archive the move of step {}: {}", index, e);
            }
        }
    }
}

impl RoutineReport {
    /// Number of moves which ended with the given outcome.
    pub fn num_moves_with(&self, outcome: MoveOutcome) -> usize {
        self.steps
            .iter()
            .filter(|s| match s.outcome {
                StepOutcome::Moved(ref r) => r.outcome == outcome,
                _ => false,
            })
            .count()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::TimeSource;
    use crate::gate::{PeriodGate, StopFlag};
    use crate::routine::parse_script;
    use crate::sim::{SimClock, SimParams, SimRig, SimTime};
    use crate::status::NullSink;
    use mech_if::{ActId, ActuatorError, RunMode, ServoId};
    use std::rc::Rc;
    use std::time::Duration;
    use util::script_interpreter::ScriptInterpreter;

    const PERIOD: Duration = Duration::from_millis(10);

    fn steps(script: &str) -> Vec<Step> {
        parse_script(&ScriptInterpreter::from_str(script).unwrap()).unwrap()
    }

    fn exec<G: ActiveGate>(time: &SimTime, gate: G) -> RoutineExec<SimClock, G, NullSink> {
        RoutineExec::new(
            Mover::new(SimClock::new(time.clone(), PERIOD), gate, NullSink),
            UnitConverter::default(),
            UnitConverter::default(),
            MoverParams::default(),
        )
    }

    #[test]
    fn test_run_routine() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();

        let routine = steps(
            r#"
lift: {"intensity": 1.0, "inches": 24, "timeout_s": 5.0};
servo: {"id": "Bucket", "position": 0.94};
sleep: {"duration_s": 0.2};
drive: {"intensity": 0.5, "inches": [-4, 4, 4, -4], "timeout_s": 3.0, "policy": "AllDone"};
"#,
        );

        let mut exec = exec(&time, || true);
        let report = exec.run(&mut robot, &routine).unwrap();

        assert!(report.completed);
        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.num_steps, 4);
        assert_eq!(report.num_moves_with(MoveOutcome::ReachedTarget), 2);
        assert_eq!(report.steps[2].outcome, StepOutcome::Slept { interrupted: false });

        assert!((rig.lift.position() - 2139).abs() <= 10);
        assert_eq!(rig.servo(ServoId::Bucket).and_then(|s| s.position()), Some(0.94));

        let expected = [-356, 356, 356, -356];
        for (act, target) in rig.drive.iter().zip(expected.iter()) {
            assert!((act.position() - target).abs() <= 10);
            assert_eq!(act.mode(), RunMode::FreeRunTracking);
            assert_eq!(act.intensity(), 0.0);
        }
    }

    #[test]
    fn test_timeout_continues() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();
        rig.lift.stall();

        let routine = steps(
            r#"
lift: {"intensity": 1.0, "inches": 24, "timeout_s": 1.0};
servo: {"id": "Door", "position": 0.1};
"#,
        );

        let report = exec(&time, || true).run(&mut robot, &routine).unwrap();

        assert!(report.completed);
        assert_eq!(report.num_moves_with(MoveOutcome::TimedOut), 1);
        assert_eq!(rig.servo(ServoId::Door).and_then(|s| s.position()), Some(0.1));
        assert_eq!(time.now(), Duration::from_secs(1));
    }

    #[test]
    fn test_actuator_failure_aborts() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();
        rig.drive[1].disconnect();

        let routine = steps(
            r#"
servo: {"id": "Bucket", "position": 0.75};
drive: {"intensity": 0.5, "inches": [12, 12, 12, 12], "timeout_s": 3.0};
servo: {"id": "Bucket", "position": 0.94};
"#,
        );

        match exec(&time, || true).run(&mut robot, &routine) {
            Err(RoutineError::MoveError(1, MoveError::ActuatorError(_))) => (),
            other => panic!("Expected a move error on step 1, got {:?}", other),
        }

        assert_eq!(rig.servo(ServoId::Bucket).and_then(|s| s.position()), Some(0.75));
        assert_eq!(rig.drive[0].intensity(), 0.0);
    }

    #[test]
    fn test_servo_failure_aborts() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();

        let routine = steps(r#"servo: {"id": "AngleL", "position": 1.5};"#);

        assert!(matches!(
            exec(&time, || true).run(&mut robot, &routine),
            Err(RoutineError::RobotError(0, RobotError::Servo(_)))
        ));
    }

    #[test]
    fn test_power_step() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();

        let routine = steps(
            r#"
power: {"id": "Lift", "intensity": -1.0};
sleep: {"duration_s": 1.0};
"#,
        );

        let report = exec(&time, || true).run(&mut robot, &routine).unwrap();

        assert!(report.completed);
        assert_eq!(report.steps[0].outcome, StepOutcome::PowerSet);
        assert_eq!(rig.lift.mode(), RunMode::FreeRunTracking);
        assert_eq!(rig.lift.intensity(), -1.0);
        assert_eq!(rig.lift.position(), -2800);

        // Out of range power ends the routine
        let routine = steps(
            r#"
sleep: {"duration_s": 0.1};
power: {"id": "DrvLF", "intensity": 1.5};
"#,
        );
        assert!(matches!(
            exec(&time, || true).run(&mut robot, &routine),
            Err(RoutineError::RobotError(
                1,
                RobotError::Actuator(ActuatorError::InvalidIntensity(ActId::DrvLF, _))
            ))
        ));
        assert_eq!(rig.drive[0].intensity(), 0.0);
    }

    #[test]
    fn test_units_step() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();

        let routine = steps(
            r#"
units: {"mechanism": "Drive", "ticks_per_rev": 1440, "gear_reduction": 2.0, "diameter_in": 4.0};
drive: {"intensity": 1.0, "inches": [8, 8, 8, 8], "timeout_s": 3.0, "policy": "AllDone"};
lift: {"intensity": 1.0, "inches": 4, "timeout_s": 3.0};
"#,
        );

        let mut exec = exec(&time, || true);
        let report = exec.run(&mut robot, &routine).unwrap();

        assert_eq!(report.steps[0].outcome, StepOutcome::UnitsSet);
        match report.steps[1].outcome {
            StepOutcome::Moved(ref m) => {
                assert!(m.axes.iter().all(|a| a.target_ticks == Some(1833)))
            }
            ref other => panic!("Expected a move, got {:?}", other),
        }
        for act in rig.drive.iter() {
            assert!((act.position() - 1833).abs() <= 10);
        }

        // The lift keeps its own converter
        assert!((rig.lift.position() - 356).abs() <= 10);

        // The next routine starts from the defaults again
        let routine = steps(
            r#"drive: {"intensity": 1.0, "inches": [8, 8, 8, 8], "timeout_s": 3.0, "policy": "AllDone"};"#,
        );
        exec.run(&mut robot, &routine).unwrap();
        for act in rig.drive.iter() {
            assert!((act.position() - (1833 + 713)).abs() <= 20);
        }
    }

    #[test]
    fn test_gate_drop_stops_routine() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();

        let routine = steps(
            r#"
servo: {"id": "Bucket", "position": 0.94};
sleep: {"duration_s": 4.0};
lift: {"intensity": 1.0, "inches": 24, "timeout_s": 5.0};
servo: {"id": "Bucket", "position": 0.75};
"#,
        );

        let gate_time = time.clone();
        let mut exec = exec(&time, move || gate_time.now() < Duration::from_secs(2));
        let report = exec.run(&mut robot, &routine).unwrap();

        assert!(!report.completed);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[1].outcome, StepOutcome::Slept { interrupted: true });

        // Nothing after the sleep was touched
        assert_eq!(rig.lift.num_writes(), 0);
        assert_eq!(rig.servo(ServoId::Bucket).and_then(|s| s.position()), Some(0.94));
    }

    #[test]
    fn test_operator_stop() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();
        rig.lift.stall();

        let routine = steps(
            r#"
lift: {"intensity": 1.0, "inches": 24, "timeout_s": 5.0};
servo: {"id": "Bucket", "position": 0.94};
"#,
        );

        // The operator hits stop one second into the lift move
        let stop = StopFlag::new();
        let operator = stop.clone();
        let period = PeriodGate::start(time.clone(), Duration::from_secs(30), stop.clone());
        let gate_time = time.clone();
        let gate = move || {
            if gate_time.now() >= Duration::from_secs(1) {
                operator.request_stop();
            }
            period.is_active()
        };

        let report = exec(&time, gate).run(&mut robot, &routine).unwrap();

        assert!(!report.completed);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.num_moves_with(MoveOutcome::Cancelled), 1);
        assert!(stop.is_stop_requested());
        assert_eq!(time.now(), Duration::from_secs(1));

        assert_eq!(rig.lift.intensity(), 0.0);
        assert_eq!(rig.lift.mode(), RunMode::FreeRunTracking);
        assert_eq!(rig.servo(ServoId::Bucket).and_then(|s| s.position()), None);
    }

    #[test]
    fn test_archive_moves() {
        let time = SimTime::new();
        let rig = SimRig::new(SimParams::default(), Rc::new(time.clone()));
        let mut robot = rig.robot();
        rig.drive[0].stall();

        let path = std::env::temp_dir()
            .join("auto_exec_routine_test")
            .join("moves.csv");
        let archiver = Archiver::from_file_path(&path).unwrap();

        let routine = steps(
            r#"
drive: {"intensity": 1.0, "inches": [8, 8, 8, 8], "timeout_s": 0.5, "policy": "AllDone"};
sleep: {"duration_s": 0.1};
lift: {"intensity": 1.0, "inches": 0, "timeout_s": 5.0};
"#,
        );

        let mut exec = exec(&time, || true).with_archiver(archiver);
        exec.run(&mut robot, &routine).unwrap();
        drop(exec);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "step,kind,outcome,elapsed_s,num_axes",
                "0,drive,TimedOut,0.5,4",
                "2,lift,ReachedTarget,0.0,1",
            ]
        );

        std::fs::remove_file(&path).ok();
        assert_eq!(rig.drive[0].position(), 0);
    }
}
