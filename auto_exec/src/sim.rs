//! # Simulated robot
//!
//! Simulated actuators and servos so that routines can be run and tested
//! without any hardware attached. Actuator positions are integrated lazily
//! from a [`TimeSource`] each time the actuator is accessed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use mech_if::{check_position, ActId, Actuator, ActuatorError, RunMode, Servo, ServoError, ServoId};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

// Internal
use crate::clock::{Clock, TimeSource};
use crate::robot::Robot;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated actuators.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Speed of an actuator at full intensity.
    ///
    /// Units: ticks/second
    pub max_rate_ticks_per_s: f64,

    /// Distance from the target within which an actuator stops being busy.
    ///
    /// Units: ticks
    pub tolerance_ticks: i32,

    /// If true the simulation runs against the wall clock, otherwise
    /// simulated time advances by one cycle period per cycle.
    pub realtime: bool,
}

/// Simulated time, shared between all its clones.
#[derive(Debug, Clone, Default)]
pub struct SimTime(Rc<Cell<Duration>>);

/// Clock advancing simulated time by one period per cycle.
#[derive(Debug, Clone)]
pub struct SimClock {
    time: SimTime,
    period: Duration,
}

/// Handle to a simulated actuator.
///
/// Clones share the same actuator, so tests can keep a handle to inspect an
/// actuator that has been given to a [`Robot`].
#[derive(Clone)]
pub struct SimActuator {
    inner: Rc<SimActuatorInner>,
}

struct SimActuatorInner {
    id: ActId,
    params: SimParams,
    time: Rc<dyn TimeSource>,
    state: RefCell<SimActuatorState>,
}

#[derive(Debug)]
struct SimActuatorState {
    /// Units: ticks
    position: f64,

    /// Units: ticks
    target: i32,

    mode: RunMode,
    intensity: f64,

    /// Time up to which the position has been integrated.
    last_update: Duration,

    stalled: bool,
    connected: bool,

    /// Number of successful setter calls
    num_writes: usize,
}

/// Handle to a simulated servo, clones share the same servo.
#[derive(Debug, Clone)]
pub struct SimServo {
    id: ServoId,
    position: Rc<Cell<Option<f64>>>,
    connected: Rc<Cell<bool>>,
}

/// Handles to every part of a simulated robot.
#[derive(Clone)]
pub struct SimRig {
    pub drive: [SimActuator; 4],
    pub lift: SimActuator,
    pub servos: Vec<SimServo>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            max_rate_ticks_per_s: 2800.0,
            tolerance_ticks: 10,
            realtime: false,
        }
    }
}

impl SimTime {
    /// Create a new time source starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, dur: Duration) {
        self.0.set(self.0.get() + dur)
    }
}

impl TimeSource for SimTime {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

impl SimClock {
    pub fn new(time: SimTime, period: Duration) -> Self {
        Self { time, period }
    }
}

impl TimeSource for SimClock {
    fn now(&self) -> Duration {
        self.time.now()
    }
}

impl Clock for SimClock {
    fn wait_cycle(&mut self) {
        self.time.advance(self.period)
    }

    fn period(&self) -> Duration {
        self.period
    }
}

impl SimActuator {
    /// Create a new actuator at position zero, in free-run tracking with no
    /// intensity.
    pub fn new(id: ActId, params: SimParams, time: Rc<dyn TimeSource>) -> Self {
        let last_update = time.now();

        Self {
            inner: Rc::new(SimActuatorInner {
                id,
                params,
                time,
                state: RefCell::new(SimActuatorState {
                    position: 0.0,
                    target: 0,
                    mode: RunMode::FreeRunTracking,
                    intensity: 0.0,
                    last_update,
                    stalled: false,
                    connected: true,
                    num_writes: 0,
                }),
            }),
        }
    }

    /// Stop the actuator from moving, whatever it is commanded to do.
    pub fn stall(&self) {
        self.inner.integrate();
        self.inner.state.borrow_mut().stalled = true;
    }

    pub fn unstall(&self) {
        self.inner.integrate();
        self.inner.state.borrow_mut().stalled = false;
    }

    /// Make every further call on the actuator fail.
    pub fn disconnect(&self) {
        self.inner.integrate();
        self.inner.state.borrow_mut().connected = false;
    }

    /// Move the actuator to a position instantly.
    pub fn set_position(&self, position: i32) {
        self.inner.integrate();
        self.inner.state.borrow_mut().position = position as f64;
    }

    pub fn position(&self) -> i32 {
        self.inner.integrate();
        self.inner.state.borrow().position.round() as i32
    }

    pub fn mode(&self) -> RunMode {
        self.inner.state.borrow().mode
    }

    pub fn intensity(&self) -> f64 {
        self.inner.state.borrow().intensity
    }

    pub fn target(&self) -> i32 {
        self.inner.state.borrow().target
    }

    pub fn num_writes(&self) -> usize {
        self.inner.state.borrow().num_writes
    }
}

impl SimActuatorInner {
    /// Bring the position up to date with the time source.
    fn integrate(&self) {
        let now = self.time.now();
        let mut state = self.state.borrow_mut();

        let dt = now.saturating_sub(state.last_update).as_secs_f64();
        state.last_update = now;

        if state.stalled || dt <= 0.0 {
            return;
        }

        match state.mode {
            RunMode::PositionTracking => {
                let err = state.target as f64 - state.position;
                let step = self.params.max_rate_ticks_per_s * state.intensity.abs() * dt;

                if err.abs() <= step {
                    state.position = state.target as f64;
                }
                else {
                    state.position += step.copysign(err);
                }
            }
            RunMode::FreeRunTracking => {
                state.position += self.params.max_rate_ticks_per_s * state.intensity * dt;
            }
            RunMode::StopAndReset => (),
        }
    }

    /// Integrate and check the actuator is still connected.
    fn connected(&self) -> Result<(), ActuatorError> {
        self.integrate();

        if self.state.borrow().connected {
            Ok(())
        }
        else {
            Err(ActuatorError::Unavailable(self.id))
        }
    }
}

impl Actuator for SimActuator {
    fn id(&self) -> ActId {
        self.inner.id
    }

    fn current_position(&self) -> Result<i32, ActuatorError> {
        self.inner.connected()?;
        Ok(self.inner.state.borrow().position.round() as i32)
    }

    fn set_target(&mut self, target_ticks: i32) -> Result<(), ActuatorError> {
        self.inner.connected()?;

        let mut state = self.inner.state.borrow_mut();
        state.target = target_ticks;
        state.num_writes += 1;

        Ok(())
    }

    fn set_mode(&mut self, mode: RunMode) -> Result<(), ActuatorError> {
        self.inner.connected()?;

        let mut state = self.inner.state.borrow_mut();
        if mode == RunMode::StopAndReset {
            state.position = 0.0;
            state.target = 0;
            state.intensity = 0.0;
        }
        state.mode = mode;
        state.num_writes += 1;

        trace!("{} mode set to {:?}", self.inner.id, mode);

        Ok(())
    }

    fn set_intensity(&mut self, intensity: f64) -> Result<(), ActuatorError> {
        self.inner.connected()?;

        if intensity.is_nan() || intensity.abs() > 1.0 {
            return Err(ActuatorError::InvalidIntensity(self.inner.id, intensity));
        }

        let mut state = self.inner.state.borrow_mut();
        state.intensity = intensity;
        state.num_writes += 1;

        Ok(())
    }

    fn is_busy(&self) -> Result<bool, ActuatorError> {
        self.inner.connected()?;

        let state = self.inner.state.borrow();
        let err = (state.target as f64 - state.position).abs();

        Ok(state.mode == RunMode::PositionTracking && err > self.inner.params.tolerance_ticks as f64)
    }
}

impl SimServo {
    pub fn new(id: ServoId) -> Self {
        Self {
            id,
            position: Rc::new(Cell::new(None)),
            connected: Rc::new(Cell::new(true)),
        }
    }

    /// The last position commanded, `None` if never commanded.
    pub fn position(&self) -> Option<f64> {
        self.position.get()
    }

    pub fn disconnect(&self) {
        self.connected.set(false)
    }
}

impl Servo for SimServo {
    fn id(&self) -> ServoId {
        self.id
    }

    fn set_position(&mut self, position: f64) -> Result<(), ServoError> {
        if !self.connected.get() {
            return Err(ServoError::Unavailable(self.id));
        }

        self.position.set(Some(check_position(position)?));

        Ok(())
    }
}

impl SimRig {
    /// Build the simulated drivetrain, lift, and every servo.
    pub fn new(params: SimParams, time: Rc<dyn TimeSource>) -> Self {
        let act = |id| SimActuator::new(id, params, time.clone());

        Self {
            drive: [
                act(ActId::DrvLF),
                act(ActId::DrvLR),
                act(ActId::DrvRF),
                act(ActId::DrvRR),
            ],
            lift: act(ActId::Lift),
            servos: [ServoId::Bucket, ServoId::Door, ServoId::AngleL, ServoId::AngleR]
                .iter()
                .map(|id| SimServo::new(*id))
                .collect(),
        }
    }

    /// Get the servo with the given ID.
    pub fn servo(&self, id: ServoId) -> Option<&SimServo> {
        self.servos.iter().find(|s| s.id == id)
    }

    /// Build a robot whose hardware is this rig.
    pub fn robot(&self) -> Robot {
        let [lf, lr, rf, rr] = self.drive.clone();

        let mut robot = Robot::new(
            [Box::new(lf), Box::new(lr), Box::new(rf), Box::new(rr)],
            Box::new(self.lift.clone()),
        );

        for servo in self.servos.iter() {
            robot = robot.with_servo(Box::new(servo.clone()));
        }

        robot
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
