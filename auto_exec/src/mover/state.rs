//! Implementation of the bounded move state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use mech_if::{ActId, Actuator, RunMode};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{CompletionPolicy, MoveError, MoveOutcome, MoveRequest};
use crate::status::{AxisProgress, MoveProgress};
use util::maths::clamp_magnitude;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum drive intensity magnitude.
pub const MAX_INTENSITY: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of one move.
///
/// Owns the borrows of the request's actuators, so no other code can touch
/// them until the move is dropped.
pub struct BoundedMove<'a> {
    axes: Vec<TrackedAxis<'a>>,

    /// Intensity magnitude applied while tracking.
    intensity: f64,

    timeout: Duration,
    policy: CompletionPolicy,
    restore_mode: RunMode,

    phase: MovePhase,
}

/// An actuator taking part in a move along with its computed target.
struct TrackedAxis<'a> {
    actuator: &'a mut dyn Actuator,

    /// Units: encoder ticks
    delta_ticks: i32,

    /// Position when the targets were set, `None` before that.
    ///
    /// Units: encoder ticks
    start_ticks: Option<i32>,

    /// Units: encoder ticks
    target_ticks: Option<i32>,
}

/// Summary of a finished move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub outcome: MoveOutcome,

    /// Time spent tracking.
    pub elapsed: Duration,

    pub axes: Vec<AxisReport>,
}

/// Summary of one actuator's part in a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisReport {
    pub id: ActId,

    /// Units: encoder ticks
    pub start_ticks: Option<i32>,

    /// Units: encoder ticks
    pub target_ticks: Option<i32>,

    /// Position after the teardown, `None` if it couldn't be read.
    ///
    /// Units: encoder ticks
    pub end_ticks: Option<i32>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phases of a bounded move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    /// Nothing has been written to the actuators.
    Idle,

    /// Absolute targets have been written.
    TargetsSet,

    /// Actuators are in position tracking mode, the move is in progress.
    Tracking,

    /// The end condition has been detected but the actuators have not been
    /// stopped yet.
    Finished(MoveOutcome),

    /// The actuators have been stopped and restored.
    Stopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> BoundedMove<'a> {
    /// Create a new move from a request.
    ///
    /// Distances are converted to tick deltas here, nothing is written to the
    /// actuators until [`BoundedMove::set_targets`].
    pub fn new(request: MoveRequest<'a>) -> Self {
        let converter = request.converter;

        let intensity = if request.intensity.is_nan() {
            warn!("Move requested with a NaN intensity, using 0.0");
            0.0
        }
        else {
            clamp_magnitude(&request.intensity, &MAX_INTENSITY)
        };

        let axes = request
            .axes
            .into_iter()
            .map(|axis| TrackedAxis {
                delta_ticks: converter.distance_to_ticks(axis.distance_in),
                actuator: axis.actuator,
                start_ticks: None,
                target_ticks: None,
            })
            .collect();

        Self {
            axes,
            intensity,
            timeout: request.timeout,
            policy: request.policy,
            restore_mode: request.restore_mode,
            phase: MovePhase::Idle,
        }
    }

    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    /// The intensity magnitude which will be applied while tracking.
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Compute each actuator's absolute target from its current position and
    /// write it to the actuator.
    pub fn set_targets(&mut self) -> Result<(), MoveError> {
        self.expect_phase(MovePhase::Idle, "set targets")?;

        for axis in self.axes.iter_mut() {
            let start = axis.actuator.current_position()?;
            let target = start.saturating_add(axis.delta_ticks);

            axis.actuator.set_target(target)?;

            axis.start_ticks = Some(start);
            axis.target_ticks = Some(target);

            trace!(
                "{} target set to {} ({:+} ticks)",
                axis.actuator.id(),
                target,
                axis.delta_ticks
            );
        }

        self.phase = MovePhase::TargetsSet;

        Ok(())
    }

    /// Switch every actuator into position tracking.
    pub fn engage(&mut self) -> Result<(), MoveError> {
        self.expect_phase(MovePhase::TargetsSet, "engage")?;

        for axis in self.axes.iter_mut() {
            axis.actuator.set_mode(RunMode::PositionTracking)?;
        }

        self.phase = MovePhase::Tracking;

        Ok(())
    }

    /// Apply the move's intensity to every actuator, starting the motion.
    pub fn apply_intensity(&mut self) -> Result<(), MoveError> {
        self.expect_phase(MovePhase::Tracking, "apply intensity")?;

        let intensity = self.intensity;
        for axis in self.axes.iter_mut() {
            axis.actuator.set_intensity(intensity)?;
        }

        Ok(())
    }

    /// Evaluate the end conditions of the move.
    ///
    /// Returns `Some(outcome)` if the move should end. The conditions are
    /// checked in order: the gate, then the timeout, then whether the
    /// actuators are done according to the completion policy. This only reads
    /// from the actuators.
    pub fn check(
        &mut self,
        active: bool,
        elapsed: Duration
    ) -> Result<Option<MoveOutcome>, MoveError> {
        self.expect_phase(MovePhase::Tracking, "check for completion")?;

        let outcome = if !active {
            Some(MoveOutcome::Cancelled)
        }
        else if elapsed >= self.timeout {
            Some(MoveOutcome::TimedOut)
        }
        else if !self.keep_tracking()? {
            Some(MoveOutcome::ReachedTarget)
        }
        else {
            None
        };

        if let Some(o) = outcome {
            self.phase = MovePhase::Finished(o);
        }

        Ok(outcome)
    }

    /// Read the current progress of every actuator.
    pub fn progress(&self, elapsed: Duration) -> Result<MoveProgress, MoveError> {
        let mut axes = Vec::with_capacity(self.axes.len());

        for axis in self.axes.iter() {
            axes.push(AxisProgress {
                id: axis.actuator.id(),
                target_ticks: axis.target_ticks.unwrap_or_default(),
                current_ticks: axis.actuator.current_position()?,
            });
        }

        Ok(MoveProgress { elapsed, axes })
    }

    /// Stop every actuator and restore its control mode.
    ///
    /// Every actuator gets zero intensity first, then the restore mode. All
    /// actuators are attempted even if some fail, the first failure is
    /// returned.
    pub fn teardown(&mut self) -> Result<(), MoveError> {
        let mut first_err = None;

        for axis in self.axes.iter_mut() {
            if let Err(e) = axis.actuator.set_intensity(0.0) {
                warn!("Could not stop {}: {}", axis.actuator.id(), e);
                first_err.get_or_insert(e);
            }
        }

        let restore_mode = self.restore_mode;
        for axis in self.axes.iter_mut() {
            if let Err(e) = axis.actuator.set_mode(restore_mode) {
                warn!("Could not restore {} to {:?}: {}", axis.actuator.id(), restore_mode, e);
                first_err.get_or_insert(e);
            }
        }

        self.phase = MovePhase::Stopped;

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(())
        }
    }

    /// Build the report of this move.
    ///
    /// The end positions are read from the actuators, so this should be
    /// called after the teardown.
    pub fn report(&self, outcome: MoveOutcome, elapsed: Duration) -> MoveReport {
        let axes = self
            .axes
            .iter()
            .map(|axis| AxisReport {
                id: axis.actuator.id(),
                start_ticks: axis.start_ticks,
                target_ticks: axis.target_ticks,
                end_ticks: axis.actuator.current_position().ok(),
            })
            .collect();

        MoveReport {
            outcome,
            elapsed,
            axes,
        }
    }

    /// Determine if the move should keep tracking according to the
    /// completion policy.
    fn keep_tracking(&self) -> Result<bool, MoveError> {
        if self.axes.is_empty() {
            return Ok(false);
        }

        let mut num_busy = 0;
        for axis in self.axes.iter() {
            if axis.actuator.is_busy()? {
                num_busy += 1;
            }
        }

        Ok(match self.policy {
            CompletionPolicy::AnyDone => num_busy == self.axes.len(),
            CompletionPolicy::AllDone => num_busy > 0,
        })
    }

    fn expect_phase(&self, expected: MovePhase, action: &'static str) -> Result<(), MoveError> {
        if self.phase != expected {
            return Err(MoveError::InvalidPhase(self.phase, action));
        }

        Ok(())
    }
}

impl MoveReport {
    /// Report for a move which never touched its actuators.
    pub fn untouched(outcome: MoveOutcome) -> Self {
        Self {
            outcome,
            elapsed: Duration::from_secs(0),
            axes: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimActuator, SimParams, SimTime};
    use crate::units::UnitConverter;
    use std::rc::Rc;

    fn actuator(id: ActId, time: &SimTime) -> SimActuator {
        SimActuator::new(id, SimParams::default(), Rc::new(time.clone()))
    }

    #[test]
    fn test_phase_order_enforced() {
        let time = SimTime::new();
        let mut lift = actuator(ActId::Lift, &time);

        let req = MoveRequest::new(UnitConverter::default(), 1.0, Duration::from_secs(5))
            .with_axis(&mut lift, 24.0);
        let mut mv = BoundedMove::new(req);

        assert_eq!(mv.phase(), MovePhase::Idle);
        assert!(matches!(mv.engage(), Err(MoveError::InvalidPhase(MovePhase::Idle, _))));
        assert!(matches!(
            mv.check(true, Duration::from_secs(0)),
            Err(MoveError::InvalidPhase(MovePhase::Idle, _))
        ));

        mv.set_targets().unwrap();
        assert_eq!(mv.phase(), MovePhase::TargetsSet);
        assert!(mv.set_targets().is_err());

        mv.engage().unwrap();
        assert_eq!(mv.phase(), MovePhase::Tracking);
        mv.apply_intensity().unwrap();

        assert_eq!(mv.check(true, Duration::from_secs(0)).unwrap(), None);
        assert_eq!(
            mv.check(false, Duration::from_secs(0)).unwrap(),
            Some(MoveOutcome::Cancelled)
        );
        assert_eq!(mv.phase(), MovePhase::Finished(MoveOutcome::Cancelled));

        mv.teardown().unwrap();
        assert_eq!(mv.phase(), MovePhase::Stopped);
        drop(mv);

        assert_eq!(lift.intensity(), 0.0);
        assert_eq!(lift.mode(), RunMode::FreeRunTracking);
    }

    #[test]
    fn test_intensity_magnitude() {
        let time = SimTime::new();
        let mut lift = actuator(ActId::Lift, &time);

        let cases = [(-0.5, 0.5), (0.3, 0.3), (3.0, 1.0), (-3.0, 1.0), (f64::NAN, 0.0)];
        for (requested, expected) in cases.iter() {
            let req = MoveRequest::new(UnitConverter::default(), *requested, Duration::from_secs(1))
                .with_axis(&mut lift, 1.0);
            assert_eq!(BoundedMove::new(req).intensity(), *expected);
        }
    }

    #[test]
    fn test_check_order() {
        let time = SimTime::new();
        let mut lift = actuator(ActId::Lift, &time);

        let req = MoveRequest::new(UnitConverter::default(), 1.0, Duration::from_secs(1))
            .with_axis(&mut lift, 24.0);
        let mut mv = BoundedMove::new(req);
        mv.set_targets().unwrap();
        mv.engage().unwrap();

        // An inactive gate wins over an expired timeout
        assert_eq!(
            mv.check(false, Duration::from_secs(2)).unwrap(),
            Some(MoveOutcome::Cancelled)
        );

        let mut lift = actuator(ActId::Lift, &time);
        let req = MoveRequest::new(UnitConverter::default(), 1.0, Duration::from_secs(1))
            .with_axis(&mut lift, 0.0);
        let mut mv = BoundedMove::new(req);
        mv.set_targets().unwrap();
        mv.engage().unwrap();

        // The timeout wins over the actuator being done
        assert_eq!(
            mv.check(true, Duration::from_secs(1)).unwrap(),
            Some(MoveOutcome::TimedOut)
        );
    }
}
