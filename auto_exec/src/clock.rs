//! # Control cycle clock
//!
//! The executive runs a single cooperative control loop. Anything that polls
//! hardware yields once per iteration through [`Clock::wait_cycle`], which is
//! where the loop is paced to the control cycle period.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic time source.
pub trait TimeSource {
    /// Time elapsed since an arbitrary, fixed epoch.
    fn now(&self) -> Duration;
}

/// A time source which paces the control loop.
pub trait Clock: TimeSource {
    /// Yield until the start of the next control cycle.
    fn wait_cycle(&mut self);

    /// The nominal length of one control cycle.
    fn period(&self) -> Duration;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock time since the instant it was created.
#[derive(Debug, Clone, Copy)]
pub struct WallTime {
    epoch: Instant
}

/// Clock for running against real hardware.
///
/// Each call to `wait_cycle` sleeps for whatever is left of the current
/// cycle. Overruns are logged and the next cycle starts immediately.
#[derive(Debug)]
pub struct CycleClock {
    time: WallTime,
    period: Duration,
    cycle_start: Instant,

    /// Number of consecutive cycle overruns
    num_consec_overruns: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WallTime {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now()
        }
    }
}

impl Default for WallTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallTime {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

impl CycleClock {
    /// Create a new clock sharing the epoch of `time`.
    pub fn new(time: WallTime, period: Duration) -> Self {
        Self {
            time,
            period,
            cycle_start: Instant::now(),
            num_consec_overruns: 0
        }
    }

    /// Number of consecutive cycles which have overrun the period.
    pub fn num_consec_overruns(&self) -> u64 {
        self.num_consec_overruns
    }
}

impl TimeSource for CycleClock {
    fn now(&self) -> Duration {
        self.time.now()
    }
}

impl Clock for CycleClock {
    fn wait_cycle(&mut self) {
        let cycle_dur = self.cycle_start.elapsed();

        // Get sleep duration
        match self.period.checked_sub(cycle_dur) {
            Some(d) => {
                self.num_consec_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s", 
                    (cycle_dur - self.period).as_secs_f64()
                );
                self.num_consec_overruns += 1;
            }
        }

        self.cycle_start = Instant::now();
    }

    fn period(&self) -> Duration {
        self.period
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
