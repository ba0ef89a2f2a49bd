//! General time utility functions

use chrono;
use std::time::Duration;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a chrono duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of seconds into a `Duration`.
///
/// Negative and NaN values give a zero duration, infinite values saturate.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        Duration::from_secs(0)
    }
    else if seconds >= u64::MAX as f64 {
        Duration::from_secs(u64::MAX)
    }
    else {
        Duration::from_secs_f64(seconds)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(seconds_to_duration(1.5), Duration::from_millis(1500));
        assert_eq!(seconds_to_duration(0.0), Duration::from_secs(0));
        assert_eq!(seconds_to_duration(-3.0), Duration::from_secs(0));
        assert_eq!(seconds_to_duration(f64::NAN), Duration::from_secs(0));
        assert_eq!(seconds_to_duration(f64::INFINITY), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(250)),
            Some(0.25)
        );
    }
}
