//! # Move status reporting
//!
//! While a move is tracking, a progress observation is emitted every cycle.
//! Sinks are purely observational, nothing they do can affect the move.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use mech_if::ActId;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Consumer of per-cycle progress observations.
pub trait StatusSink {
    fn report(&mut self, progress: &MoveProgress);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of a move in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveProgress {
    /// Time since the move started tracking.
    pub elapsed: Duration,

    pub axes: Vec<AxisProgress>,
}

/// Progress of one actuator towards its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProgress {
    pub id: ActId,

    /// Units: encoder ticks
    pub target_ticks: i32,

    /// Units: encoder ticks
    pub current_ticks: i32,
}

/// Sink discarding all observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

/// Sink writing observations to the log.
///
/// Only one observation in every `every_n_cycles` is logged to keep the log
/// readable at high cycle rates.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    every_n_cycles: u64,
    num_cycles: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusSink for NullSink {
    fn report(&mut self, _progress: &MoveProgress) {}
}

impl StatusSink for Vec<MoveProgress> {
    fn report(&mut self, progress: &MoveProgress) {
        self.push(progress.clone())
    }
}

impl LogSink {
    pub fn new(every_n_cycles: u64) -> Self {
        Self {
            every_n_cycles: every_n_cycles.max(1),
            num_cycles: 0,
        }
    }
}

impl StatusSink for LogSink {
    fn report(&mut self, progress: &MoveProgress) {
        if self.num_cycles % self.every_n_cycles == 0 {
            let targets: Vec<i32> = progress.axes.iter().map(|a| a.target_ticks).collect();
            let currents: Vec<i32> = progress.axes.iter().map(|a| a.current_ticks).collect();

            debug!(
                "[{:6.3} s] Running to {:?} at {:?}",
                progress.elapsed.as_secs_f64(),
                targets,
                currents
            );
        }

        self.num_cycles = self.num_cycles.wrapping_add(1);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_log_sink_decimation() {
        let progress = MoveProgress {
            elapsed: Duration::from_millis(10),
            axes: vec![AxisProgress {
                id: ActId::Lift,
                target_ticks: 2139,
                current_ticks: 20,
            }],
        };

        let mut sink = LogSink::new(0);
        assert_eq!(sink.every_n_cycles, 1);

        let mut sink_5 = LogSink::new(5);
        for _ in 0..7 {
            sink.report(&progress);
            sink_5.report(&progress);
        }
        assert_eq!(sink.num_cycles, 7);
        assert_eq!(sink_5.num_cycles, 7);
    }

    #[test]
    fn test_recording_sink() {
        let mut rec: Vec<MoveProgress> = vec![];
        let progress = MoveProgress {
            elapsed: Duration::from_millis(0),
            axes: vec![],
        };

        rec.report(&progress);
        assert_eq!(rec, vec![progress]);
    }
}
