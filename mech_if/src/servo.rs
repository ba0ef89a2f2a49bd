//! # Servo interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for positional servos.
pub trait Servo {
    /// The identifier of this servo.
    fn id(&self) -> ServoId;

    /// Set the position of the servo.
    ///
    /// ## Arguments
    /// - `position` - The position to move to. Must be a value between 0.0 and 1.0, values
    ///   outside this range will be rejected.
    fn set_position(&mut self, position: f64) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all servos available to the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ServoId {
    Bucket,
    Door,
    AngleL,
    AngleR,
}

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("Servo {0:?} is unavailable")]
    Unavailable(ServoId),

    #[error("Servo position must be between 0.0 and 1.0, got {0}")]
    InvalidPosition(f64),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a servo position demand is within `[0.0, 1.0]`.
pub fn check_position(position: f64) -> Result<f64, ServoError> {
    if !(0.0..=1.0).contains(&position) {
        return Err(ServoError::InvalidPosition(position));
    }

    Ok(position)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_position() {
        assert_eq!(check_position(0.0).unwrap(), 0.0);
        assert_eq!(check_position(0.94).unwrap(), 0.94);
        assert_eq!(check_position(1.0).unwrap(), 1.0);
        assert!(check_position(-0.1).is_err());
        assert!(check_position(1.01).is_err());
        assert!(check_position(f64::NAN).is_err());
    }

    #[test]
    fn test_servo_id_from_json() {
        let id: ServoId = serde_json::from_str("\"Bucket\"").unwrap();
        assert_eq!(id, ServoId::Bucket);
        assert!(serde_json::from_str::<ServoId>("\"Claw\"").is_err());
    }
}
