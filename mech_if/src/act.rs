//! # Actuator interface
//!
//! An actuator is a motor with an encoder and an onboard controller. The controller can either
//! track an absolute target position or run freely at the commanded intensity.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A motor with position feedback, as consumed by the autonomy executive.
///
/// Implementors own the connection to the physical device. Every call may fail with
/// [`ActuatorError::Unavailable`] if the device has been disconnected.
pub trait Actuator {
    /// The identifier of this actuator.
    fn id(&self) -> ActId;

    /// Get the current absolute position.
    ///
    /// Units: encoder ticks
    fn current_position(&self) -> Result<i32, ActuatorError>;

    /// Set the absolute target position used in [`RunMode::PositionTracking`].
    ///
    /// Units: encoder ticks
    fn set_target(&mut self, target_ticks: i32) -> Result<(), ActuatorError>;

    /// Switch the controller's run mode.
    fn set_mode(&mut self, mode: RunMode) -> Result<(), ActuatorError>;

    /// Set the drive intensity, a fraction between -1.0 and 1.0.
    fn set_intensity(&mut self, intensity: f64) -> Result<(), ActuatorError>;

    /// Returns true while the controller is still driving towards its target.
    fn is_busy(&self) -> Result<bool, ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators available to the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    DrvLF,
    DrvLR,
    DrvRF,
    DrvRR,
    Lift,
    Slide,
    Flip,
    Intake,
}

/// Control modes of an actuator's onboard controller.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum RunMode {
    /// Drive towards the target position using closed-loop feedback. Intensity caps the speed.
    PositionTracking,

    /// Intensity directly drives the speed, no position target is tracked.
    FreeRunTracking,

    /// Stop the motor and zero the encoder count.
    ///
    /// This belongs to initialisation, it is destructive to the position reference.
    StopAndReset,
}

/// Errors reported by an actuator.
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("Actuator {0:?} is unavailable (disconnected or invalid handle)")]
    Unavailable(ActId),

    #[error("Actuator {0:?} rejected intensity {1}, must be between -1.0 and 1.0")]
    InvalidIntensity(ActId, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActId {
    /// The drivetrain actuators, in the order used by drive moves.
    pub const DRIVE: [ActId; 4] = [ActId::DrvLF, ActId::DrvLR, ActId::DrvRF, ActId::DrvRR];
}

impl fmt::Display for ActId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
