//! Parameters structure for the Mover

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use mech_if::RunMode;
use serde::Deserialize;

use super::CompletionPolicy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Defaults applied to moves which don't specify their own.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoverParams {
    /// Completion policy of moves.
    pub policy: CompletionPolicy,

    /// Mode the actuators are restored to at the end of a move.
    pub restore_mode: RunMode,

    /// Log move progress once every this many cycles.
    pub report_every_n_cycles: u64,
}

impl Default for MoverParams {
    fn default() -> Self {
        Self {
            policy: CompletionPolicy::AnyDone,
            restore_mode: RunMode::FreeRunTracking,
            report_every_n_cycles: 10,
        }
    }
}
