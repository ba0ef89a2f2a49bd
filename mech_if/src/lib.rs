//! # Mechanisms Interface
//!
//! This crate defines the interfaces through which the autonomy executive talks to the robot's
//! mechanisms. Hardware drivers (and the simulation) implement these traits, the executive only
//! ever borrows them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Encoder-equipped motor interface.
pub mod act;

/// Positional servo interface.
pub mod servo;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use act::*;
pub use servo::*;
