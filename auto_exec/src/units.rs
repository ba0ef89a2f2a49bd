//! # Unit conversion
//!
//! Converts physical distances travelled by a wheel or wound onto a drum into
//! encoder tick deltas.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::f64::consts::PI;

use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of one mechanism, used to convert distances to ticks.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UnitConverter {
    /// Encoder resolution at the motor output shaft.
    ///
    /// Units: ticks/revolution
    pub ticks_per_rev: f64,

    /// Gear reduction between the motor and the wheel (< 1.0 if geared up).
    pub gear_reduction: f64,

    /// Diameter of the wheel or drum.
    ///
    /// Units: inches
    pub diameter_in: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl UnitConverter {
    /// NeveRest 40 motor driving a 4 inch wheel directly.
    pub const NEVEREST_40_4IN: UnitConverter = UnitConverter {
        ticks_per_rev: 1120.0,
        gear_reduction: 1.0,
        diameter_in: 4.0,
    };

    /// Number of encoder ticks per inch travelled.
    pub fn ticks_per_unit(&self) -> f64 {
        (self.ticks_per_rev * self.gear_reduction) / (self.diameter_in * PI)
    }

    /// Convert a signed distance into a signed tick delta.
    ///
    /// The result is truncated towards zero, so the conversion is exact for
    /// zero and symmetric in sign. Distances beyond the range of the encoder
    /// saturate at `±i32::MAX`.
    pub fn distance_to_ticks(&self, distance_in: f64) -> i32 {
        let limit = i32::MAX as f64;
        clamp(&(distance_in * self.ticks_per_unit()), &-limit, &limit) as i32
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::NEVEREST_40_4IN
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
