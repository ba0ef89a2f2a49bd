//! Routine steps and their parsing from script entries

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use mech_if::{ActId, RunMode, ServoId};
use serde::{de::DeserializeOwned, Deserialize};
use std::fmt;

use crate::mover::CompletionPolicy;
use crate::units::UnitConverter;
use util::script_interpreter::{ScriptEntry, ScriptInterpreter};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Move all four drive actuators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriveStep {
    pub intensity: f64,

    /// Distance for each wheel, in the order left-front, left-rear,
    /// right-front, right-rear.
    ///
    /// Units: inches
    pub inches: [f64; 4],

    /// Units: seconds
    pub timeout_s: f64,

    /// Overrides the executive's default completion policy.
    pub policy: Option<CompletionPolicy>,

    /// Overrides the executive's default restore mode.
    pub restore_mode: Option<RunMode>,
}

/// Move the lift.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiftStep {
    pub intensity: f64,

    /// Units: inches
    pub inches: f64,

    /// Units: seconds
    pub timeout_s: f64,

    pub policy: Option<CompletionPolicy>,
    pub restore_mode: Option<RunMode>,
}

/// Command a servo to a position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoStep {
    pub id: ServoId,

    /// Position between 0.0 and 1.0
    pub position: f64,
}

/// Run one actuator open loop at a fixed intensity.
///
/// The actuator is left running in free-run tracking until another step
/// commands it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerStep {
    pub id: ActId,

    /// Signed intensity between -1.0 and 1.0
    pub intensity: f64,
}

/// Change the geometry used to convert the distances of later moves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitsStep {
    pub mechanism: Mechanism,

    /// Units: ticks/revolution
    pub ticks_per_rev: f64,

    pub gear_reduction: f64,

    /// Units: inches
    pub diameter_in: f64,
}

/// Wait for a while.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SleepStep {
    /// Units: seconds
    pub duration_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Mechanism whose moves share one unit converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Mechanism {
    Drive,
    Lift,
}

/// One step of an autonomous routine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Drive(DriveStep),
    Lift(LiftStep),
    Servo(ServoStep),
    Power(PowerStep),
    Units(UnitsStep),
    Sleep(SleepStep),
}

#[derive(Debug, thiserror::Error)]
pub enum StepParseError {
    #[error("Unknown step \"{keyword}\" on line {line}")]
    UnknownKeyword { line: usize, keyword: String },

    #[error("Invalid payload for \"{keyword}\" step on line {line}: {source}")]
    InvalidPayload {
        line: usize,
        keyword: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse every entry of a script into a step.
///
/// The first invalid entry is returned as an error, so a routine is never
/// started from a partially valid script.
pub fn parse_script(si: &ScriptInterpreter) -> Result<Vec<Step>, StepParseError> {
    si.entries().map(Step::from_entry).collect()
}

fn parse_payload<T: DeserializeOwned>(entry: &ScriptEntry) -> Result<T, StepParseError> {
    serde_json::from_str(&entry.payload).map_err(|source| StepParseError::InvalidPayload {
        line: entry.line,
        keyword: entry.keyword.clone(),
        source,
    })
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Step {
    pub fn from_entry(entry: &ScriptEntry) -> Result<Self, StepParseError> {
        match entry.keyword.as_str() {
            "drive" => parse_payload(entry).map(Step::Drive),
            "lift" => parse_payload(entry).map(Step::Lift),
            "servo" => parse_payload(entry).map(Step::Servo),
            "power" => parse_payload(entry).map(Step::Power),
            "units" => parse_payload(entry).map(Step::Units),
            "sleep" => parse_payload(entry).map(Step::Sleep),
            _ => Err(StepParseError::UnknownKeyword {
                line: entry.line,
                keyword: entry.keyword.clone(),
            }),
        }
    }

    /// The script keyword of this kind of step.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Drive(_) => "drive",
            Step::Lift(_) => "lift",
            Step::Servo(_) => "servo",
            Step::Power(_) => "power",
            Step::Units(_) => "units",
            Step::Sleep(_) => "sleep",
        }
    }
}

impl UnitsStep {
    pub fn converter(&self) -> UnitConverter {
        UnitConverter {
            ticks_per_rev: self.ticks_per_rev,
            gear_reduction: self.gear_reduction,
            diameter_in: self.diameter_in,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Drive(d) => write!(
                f,
                "drive {:?} in at {:.2} (timeout {:.1} s)",
                d.inches, d.intensity, d.timeout_s
            ),
            Step::Lift(l) => write!(
                f,
                "lift {} in at {:.2} (timeout {:.1} s)",
                l.inches, l.intensity, l.timeout_s
            ),
            Step::Servo(s) => write!(f, "servo {:?} to {:.2}", s.id, s.position),
            Step::Power(p) => write!(f, "power {:?} at {:.2}", p.id, p.intensity),
            Step::Units(u) => write!(
                f,
                "units {:?} at {:.1} ticks/in",
                u.mechanism,
                u.converter().ticks_per_unit()
            ),
            Step::Sleep(s) => write!(f, "sleep {:.3} s", s.duration_s),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
