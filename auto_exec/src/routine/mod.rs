//! # Autonomous routines
//!
//! A routine is a list of [`Step`]s, usually parsed from a script file, run
//! in order against the robot by the [`RoutineExec`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod exec;
mod step;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use exec::*;
pub use step::*;
