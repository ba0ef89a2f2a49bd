//! Requests passed into the Mover

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use mech_if::{Actuator, RunMode};
use std::time::Duration;

use super::CompletionPolicy;
use crate::units::UnitConverter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One actuator taking part in a move.
pub struct MoveAxis<'a> {
    /// The actuator, borrowed for the duration of the move only.
    pub actuator: &'a mut dyn Actuator,

    /// Signed distance to move relative to the current position.
    ///
    /// Units: inches
    pub distance_in: f64,
}

/// A request to perform one bounded relative move.
///
/// The direction of motion comes only from the sign of each axis' distance,
/// the intensity's sign is ignored.
pub struct MoveRequest<'a> {
    pub axes: Vec<MoveAxis<'a>>,

    /// Drive intensity, the magnitude is used and capped at 1.0.
    pub intensity: f64,

    /// Time budget of the move. A zero timeout times out immediately.
    pub timeout: Duration,

    /// Converter from distances to ticks for every axis of the move.
    pub converter: UnitConverter,

    pub policy: CompletionPolicy,

    /// Mode the actuators are left in once the move ends.
    pub restore_mode: RunMode,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> MoveRequest<'a> {
    /// Create a request with no axes, the default completion policy, and
    /// free-run tracking as the restore mode.
    pub fn new(converter: UnitConverter, intensity: f64, timeout: Duration) -> Self {
        Self {
            axes: vec![],
            intensity,
            timeout,
            converter,
            policy: CompletionPolicy::default(),
            restore_mode: RunMode::FreeRunTracking,
        }
    }

    /// Add an actuator to the move.
    pub fn with_axis(mut self, actuator: &'a mut dyn Actuator, distance_in: f64) -> Self {
        self.axes.push(MoveAxis {
            actuator,
            distance_in,
        });
        self
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_restore_mode(mut self, restore_mode: RunMode) -> Self {
        self.restore_mode = restore_mode;
        self
    }
}
