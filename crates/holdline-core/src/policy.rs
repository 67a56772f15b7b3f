//! Per-value-type strategies for filling and splitting runs
//!
//! Streams are parameterized by two injected strategies instead of
//! compile-time mixins: an empty policy that manufactures filler when a
//! commit outruns the buffered timeline, and a split policy that cuts a
//! run's value at a non-aligned time boundary.

use crate::time::Duration;
use crate::tuple::Tuple;

/// Supplies filler runs when a commit outruns the buffered timeline.
pub trait EmptyPolicy<T>: Send {
    fn fill(&self) -> Tuple<T>;
}

/// Cuts a run's value at a non-aligned time boundary.
///
/// `head` and `tail` are the durations of the two halves after the cut;
/// implementations decide how the value distributes across them.
pub trait SplitPolicy<T>: Send {
    fn split(&self, value: T, head: Duration, tail: Duration) -> (T, T);
}

/// Fills with the value type's default, holding forever.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFill;

impl<T: Default> EmptyPolicy<T> for DefaultFill {
    fn fill(&self) -> Tuple<T> {
        Tuple::hold(T::default())
    }
}

/// Both halves keep the original value (sample-and-hold signals).
#[derive(Clone, Copy, Debug, Default)]
pub struct HoldSplit;

impl<T: Clone> SplitPolicy<T> for HoldSplit {
    fn split(&self, value: T, _head: Duration, _tail: Duration) -> (T, T) {
        (value.clone(), value)
    }
}

/// Distributes an amount-over-time value proportionally to the cut.
///
/// Holds on both sides when either half is infinite, since no finite
/// ratio exists there.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScaledSplit;

impl SplitPolicy<f64> for ScaledSplit {
    fn split(&self, value: f64, head: Duration, tail: Duration) -> (f64, f64) {
        let total = head + tail;
        if total.is_infinite() || total.is_zero() {
            return (value, value);
        }
        let ratio = head.as_micros() as f64 / total.as_micros() as f64;
        (value * ratio, value * (1.0 - ratio))
    }
}
