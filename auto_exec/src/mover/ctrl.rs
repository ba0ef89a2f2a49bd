//! Implementation of the mover, which drives bounded moves against a clock

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::time::Duration;

// Internal
use super::{BoundedMove, MoveError, MoveOutcome, MoveReport, MoveRequest};
use crate::clock::Clock;
use crate::gate::ActiveGate;
use crate::status::StatusSink;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executes bounded moves one at a time.
///
/// The mover owns the cycle clock, the active gate and the status sink, the
/// actuators are only borrowed for the duration of each move.
pub struct Mover<C, G, S> {
    clock: C,
    gate: G,
    sink: S,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, G, S> Mover<C, G, S>
where
    C: Clock,
    G: ActiveGate,
    S: StatusSink,
{
    pub fn new(clock: C, gate: G, sink: S) -> Self {
        Self { clock, gate, sink }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns true if the routine is still permitted to run.
    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    /// Perform one bounded move.
    ///
    /// Whatever ends the move, every actuator in the request has zero
    /// intensity and is in the request's restore mode when this returns. If
    /// the gate is inactive on entry no actuator is touched at all and the
    /// move is reported as a no-op `ReachedTarget`.
    ///
    /// An actuator failure ends the move early. The teardown is still
    /// attempted on every actuator and the failure which ended the move is
    /// returned.
    pub fn run(&mut self, request: MoveRequest<'_>) -> Result<MoveReport, MoveError> {
        if request.axes.is_empty() {
            debug!("Move requested with no actuators, nothing to do");
            return Ok(MoveReport::untouched(MoveOutcome::ReachedTarget));
        }

        if !self.gate.is_active() {
            info!("Routine inactive, move not started");
            return Ok(MoveReport::untouched(MoveOutcome::ReachedTarget));
        }

        let mut mv = BoundedMove::new(request);

        let tracked = self.track(&mut mv);
        let torn_down = mv.teardown();

        match (tracked, torn_down) {
            (Ok((outcome, elapsed)), Ok(())) => {
                let report = mv.report(outcome, elapsed);
                info!(
                    "Move ended with {:?} after {:.3} s",
                    report.outcome,
                    report.elapsed.as_secs_f64()
                );
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(te)) => {
                warn!("Teardown after a failed move also failed: {}", te);
                Err(e)
            }
        }
    }

    /// Wait for the given duration, yielding every cycle.
    ///
    /// Returns false if the gate dropped before the wait was over.
    pub fn wait(&mut self, duration: Duration) -> bool {
        let start = self.clock.now();

        loop {
            if !self.gate.is_active() {
                return false;
            }

            if self.clock.now().saturating_sub(start) >= duration {
                return true;
            }

            self.clock.wait_cycle();
        }
    }

    /// Run the move up to the point where it should be torn down.
    fn track(&mut self, mv: &mut BoundedMove) -> Result<(MoveOutcome, Duration), MoveError> {
        mv.set_targets()?;
        mv.engage()?;

        let start = self.clock.now();
        mv.apply_intensity()?;

        loop {
            let elapsed = self.clock.now().saturating_sub(start);

            if let Some(outcome) = mv.check(self.gate.is_active(), elapsed)? {
                return Ok((outcome, elapsed));
            }

            // Progress is informational only, a failed read doesn't end the move
            match mv.progress(elapsed) {
                Ok(progress) => self.sink.report(&progress),
                Err(e) => debug!("Could not read move progress: {}", e),
            }

            self.clock.wait_cycle();
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
