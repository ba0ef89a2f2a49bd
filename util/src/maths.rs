//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into `[min, max]`.
///
/// NaN values are passed through unchanged, callers that care must check.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Clamp the magnitude of a value into `[0, max]`, discarding its sign.
pub fn clamp_magnitude<T>(value: &T, max: &T) -> T
where
    T: Float
{
    clamp(&value.abs(), &T::zero(), max)
}
