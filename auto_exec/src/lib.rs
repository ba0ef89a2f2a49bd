//! # Autonomy library.
//!
//! Everything the autonomy executable needs to run scripted routines against
//! the robot, exposed as a library so it can be tested without hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Control cycle clocks
pub mod clock;

/// Active gate - whether the routine is still permitted to run
pub mod gate;

/// Bounded position mover - the move primitive underlying every routine
pub mod mover;

/// Parameters of the executable
pub mod params;

/// Robot hardware handles
pub mod robot;

/// Routine steps and the routine executive
pub mod routine;

/// Simulated robot hardware
pub mod sim;

/// Move progress reporting
pub mod status;

/// Distance to encoder tick conversion
pub mod units;
