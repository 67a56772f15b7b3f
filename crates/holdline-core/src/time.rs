//! Time primitives for piecewise-constant timelines
//!
//! Two newtypes share a microsecond scale:
//! - `Duration`: a span of timeline, finite or the INFINITE sentinel
//! - `StreamTime`: a participant's local clock value, always finite

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use crate::error::{report_fatal, Fault};

/// A span of timeline in microseconds, or INFINITE ("holds forever").
///
/// Total order with INFINITE maximal. Addition saturates to INFINITE
/// whenever either operand is infinite; subtraction that would go
/// negative, or that asks a finite remainder of INFINITE, is a caller
/// bug and faults.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u64);

impl Duration {
    pub const ZERO: Duration = Duration(0);
    /// "Holds forever" sentinel. Maximal in the duration order.
    pub const INFINITE: Duration = Duration(u64::MAX);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        Duration(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Duration(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Duration(secs.saturating_mul(1_000_000))
    }

    /// Finite magnitude in microseconds. Faults on INFINITE.
    #[inline]
    pub fn as_micros(self) -> u64 {
        if self.is_infinite() {
            report_fatal(Fault::contract("as_micros on an infinite duration"));
        }
        self.0
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self.0 == u64::MAX
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction without the fault path. `None` when the result would
    /// go negative or when either operand is INFINITE.
    #[inline]
    pub fn checked_sub(self, rhs: Duration) -> Option<Duration> {
        if self.is_infinite() || rhs.is_infinite() {
            return None;
        }
        self.0.checked_sub(rhs.0).map(Duration)
    }

    /// Span left of a run of this duration after consuming `cut` from its
    /// front. Infinite runs keep an infinite remainder; cutting more than
    /// a finite run holds faults.
    #[inline]
    pub fn remaining_after(self, cut: Duration) -> Duration {
        if self.is_infinite() {
            return Duration::INFINITE;
        }
        match self.checked_sub(cut) {
            Some(rest) => rest,
            None => report_fatal(Fault::contract("cut exceeds run duration")),
        }
    }
}

impl Add for Duration {
    type Output = Duration;

    #[inline]
    fn add(self, rhs: Duration) -> Duration {
        if self.is_infinite() || rhs.is_infinite() {
            Duration::INFINITE
        } else {
            Duration(self.0.saturating_add(rhs.0))
        }
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Duration) -> Duration {
        match self.checked_sub(rhs) {
            Some(diff) => diff,
            None => report_fatal(Fault::contract("duration subtraction out of range")),
        }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "∞")
        } else {
            write!(f, "{}us", self.0)
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A participant's local clock value, microseconds since stream epoch.
///
/// INVARIANT: monotonically non-decreasing, mutated only through commit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamTime(u64);

impl StreamTime {
    pub const ZERO: StreamTime = StreamTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        StreamTime(micros)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for StreamTime {
    type Output = StreamTime;

    #[inline]
    fn add(self, rhs: Duration) -> StreamTime {
        if rhs.is_infinite() {
            report_fatal(Fault::contract("advancing a clock by an infinite duration"));
        }
        StreamTime(self.0.saturating_add(rhs.0))
    }
}

impl Sub for StreamTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: StreamTime) -> Duration {
        match self.0.checked_sub(rhs.0) {
            Some(diff) => Duration::from_micros(diff),
            None => report_fatal(Fault::contract("stream time subtraction went negative")),
        }
    }
}

impl fmt::Debug for StreamTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}us", self.0)
    }
}

impl fmt::Display for StreamTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
