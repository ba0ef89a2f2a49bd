//! # Robot hardware
//!
//! Holds the handles to every piece of hardware the autonomous routines use,
//! and builds the two shapes of move request: the four-wheel drive move and
//! the single actuator lift move.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use mech_if::{ActId, Actuator, ActuatorError, RunMode, Servo, ServoError, ServoId};
use std::collections::HashMap;
use std::time::Duration;

use crate::mover::MoveRequest;
use crate::units::UnitConverter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Robot {
    /// Drive actuators in the order left-front, left-rear, right-front,
    /// right-rear.
    drive: [Box<dyn Actuator>; 4],

    lift: Box<dyn Actuator>,

    servos: HashMap<ServoId, Box<dyn Servo>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("The robot has no servo {0:?}")]
    NoSuchServo(ServoId),

    #[error("The robot has no actuator {0}")]
    NoSuchActuator(ActId),

    #[error("Servo error: {0}")]
    Servo(#[from] ServoError),

    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Robot {
    /// Create a new robot from its drivetrain and lift.
    pub fn new(drive: [Box<dyn Actuator>; 4], lift: Box<dyn Actuator>) -> Self {
        Self {
            drive,
            lift,
            servos: HashMap::new(),
        }
    }

    /// Add a servo, replacing any servo with the same ID.
    pub fn with_servo(mut self, servo: Box<dyn Servo>) -> Self {
        self.servos.insert(servo.id(), servo);
        self
    }

    /// Zero every motor's encoder and leave it in free-run tracking.
    ///
    /// Only call this during initialisation, it destroys the position
    /// reference of every motor.
    pub fn reset_encoders(&mut self) -> Result<(), ActuatorError> {
        for act in self.drive.iter_mut().chain(std::iter::once(&mut self.lift)) {
            act.set_mode(RunMode::StopAndReset)?;
            act.set_mode(RunMode::FreeRunTracking)?;
        }

        info!("Encoders reset");

        Ok(())
    }

    /// Build a move of the four drive actuators.
    ///
    /// Distances are in the order left-front, left-rear, right-front,
    /// right-rear.
    pub fn drive_request(
        &mut self,
        converter: UnitConverter,
        intensity: f64,
        distances_in: [f64; 4],
        timeout: Duration
    ) -> MoveRequest<'_> {
        let mut request = MoveRequest::new(converter, intensity, timeout);

        for (act, d) in self.drive.iter_mut().zip(distances_in.iter()) {
            request = request.with_axis(&mut **act, *d);
        }

        request
    }

    /// Build a move of the lift actuator.
    pub fn lift_request(
        &mut self,
        converter: UnitConverter,
        intensity: f64,
        distance_in: f64,
        timeout: Duration
    ) -> MoveRequest<'_> {
        MoveRequest::new(converter, intensity, timeout).with_axis(self.lift.as_mut(), distance_in)
    }

    /// Command a servo to a position between 0.0 and 1.0.
    pub fn set_servo(&mut self, id: ServoId, position: f64) -> Result<(), RobotError> {
        let servo = self.servos.get_mut(&id).ok_or(RobotError::NoSuchServo(id))?;
        servo.set_position(position)?;

        debug!("Servo {:?} set to {:.3}", id, position);

        Ok(())
    }

    /// Run one motor open loop at the given signed intensity.
    ///
    /// The motor is switched to free-run tracking first and keeps running
    /// after this returns.
    pub fn set_power(&mut self, id: ActId, intensity: f64) -> Result<(), RobotError> {
        let act = self
            .drive
            .iter_mut()
            .chain(std::iter::once(&mut self.lift))
            .find(|act| act.id() == id)
            .ok_or(RobotError::NoSuchActuator(id))?;

        act.set_mode(RunMode::FreeRunTracking)?;
        act.set_intensity(intensity)?;

        debug!("{} powered at {:.3}", id, intensity);

        Ok(())
    }

    /// Read the position of every motor.
    pub fn positions(&self) -> Result<Vec<(ActId, i32)>, ActuatorError> {
        self.drive
            .iter()
            .chain(std::iter::once(&self.lift))
            .map(|act| act.current_position().map(|p| (act.id(), p)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
