//! # Bounded position mover
//!
//! A bounded move converts per-actuator distances into absolute encoder
//! targets, puts the actuators into position tracking, then polls until the
//! move completes, runs out of time, or the routine stops being active.
//! Whichever happens first, the actuators are always left stopped and in a
//! safe control mode.
//!
//! The move itself is the [`BoundedMove`] state machine:
//!
//! ```text
//! Idle -> TargetsSet -> Tracking -> Finished(outcome) -> Stopped
//! ```
//!
//! where any state may go straight to `Stopped` through the teardown. The
//! [`Mover`] drives the state machine against a [`Clock`](crate::clock::Clock)
//! and an [`ActiveGate`](crate::gate::ActiveGate).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod ctrl;
mod params;
mod request;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use ctrl::*;
pub use params::*;
pub use request::*;
pub use state::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use mech_if::ActuatorError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Decides when the actuators of a move count as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionPolicy {
    /// The move ends as soon as any actuator reaches its target, the others
    /// are stopped with it.
    AnyDone,

    /// The move ends once every actuator has reached its target.
    AllDone,
}

/// The reason a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    ReachedTarget,
    TimedOut,
    Cancelled,
}

/// Possible errors that can occur during a move.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("Actuator failure: {0}")]
    ActuatorError(#[from] ActuatorError),

    #[error("Cannot {1} while the move is in the {0:?} phase")]
    InvalidPhase(MovePhase, &'static str),
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        CompletionPolicy::AnyDone
    }
}
