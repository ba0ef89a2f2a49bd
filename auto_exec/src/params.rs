//! # Autonomy Executable Parameters
//!
//! This module provides parameters for the autonomy executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::{mover::MoverParams, sim::SimParams, units::UnitConverter};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AutoExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Length of the autonomous period, after which the routine is stopped.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Geometry of the drivetrain wheels
    pub drive: UnitConverter,

    /// Geometry of the lift drum
    pub lift: UnitConverter,

    #[serde(default)]
    pub mover: MoverParams,

    #[serde(default)]
    pub sim: SimParams,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::mover::CompletionPolicy;
    use mech_if::RunMode;

    #[test]
    fn test_load_params() {
        let params: AutoExecParams = util::params::from_str(
            r#"
cycle_period_s = 0.02
period_s = 30.0

[drive]
ticks_per_rev = 1120.0
gear_reduction = 1.0
diameter_in = 4.0

[lift]
ticks_per_rev = 1120.0
gear_reduction = 1.0
diameter_in = 4.0

[mover]
policy = "AllDone"
"#,
        )
        .unwrap();

        assert_eq!(params.drive, UnitConverter::NEVEREST_40_4IN);
        assert_eq!(params.mover.policy, CompletionPolicy::AllDone);
        assert_eq!(params.mover.restore_mode, RunMode::FreeRunTracking);
        assert_eq!(params.sim.tolerance_ticks, 10);
        assert!(!params.sim.realtime);
    }

    #[test]
    fn test_shipped_params() {
        let params: AutoExecParams =
            util::params::from_str(include_str!("../../params/auto_exec.toml")).unwrap();

        assert_eq!(params.drive.distance_to_ticks(24.0), 2139);
        assert_eq!(params.mover, MoverParams::default());
        assert!(params.cycle_period_s > 0.0);
    }

    #[test]
    fn test_missing_converter() {
        let res: Result<AutoExecParams, _> =
            util::params::from_str("cycle_period_s = 0.02\nperiod_s = 30.0\n");
        assert!(res.is_err());
    }
}
