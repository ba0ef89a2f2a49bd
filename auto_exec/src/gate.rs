//! # Active gate
//!
//! The active gate tells the executive whether the routine is still permitted
//! to run. It is the only cancellation channel: moves poll it every cycle and
//! stop as soon as it drops.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use crate::clock::TimeSource;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of the "routine may run" signal.
///
/// Implementations must not block.
pub trait ActiveGate {
    fn is_active(&self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A flag with which an operator (possibly on another thread) can request the
/// routine stops.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

/// Gate which is active from the start of the competition period until
/// either the period expires or a stop is requested.
#[derive(Debug, Clone)]
pub struct PeriodGate<T: TimeSource> {
    time: T,
    start: Duration,
    period: Duration,
    stop: StopFlag,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<F> ActiveGate for F
where
    F: Fn() -> bool,
{
    fn is_active(&self) -> bool {
        self()
    }
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the routine stops.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl ActiveGate for StopFlag {
    fn is_active(&self) -> bool {
        !self.is_stop_requested()
    }
}

impl<T: TimeSource> PeriodGate<T> {
    /// Start the period now.
    pub fn start(time: T, period: Duration, stop: StopFlag) -> Self {
        let start = time.now();

        Self {
            time,
            start,
            period,
            stop,
        }
    }

    /// Time left in the period, zero once it has expired.
    pub fn remaining(&self) -> Duration {
        self.period
            .checked_sub(self.time.now().saturating_sub(self.start))
            .unwrap_or_default()
    }
}

impl<T: TimeSource> ActiveGate for PeriodGate<T> {
    fn is_active(&self) -> bool {
        !self.stop.is_stop_requested() && self.remaining() > Duration::from_secs(0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
