//! Participant time bases: local clocks advanced only through commit
//!
//! Each attached reader or writer carries a [`TimeBase`]. The clock is
//! idle between operations and moves only while a commit resolves; sync
//! suspends the participant until the host scheduler's next coordinated
//! advancement point.

use holdline_core::{report_fatal, Duration, Fault, Named, StreamResult, StreamTime};

/// Per-participant local clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeBase {
    time: StreamTime,
}

impl TimeBase {
    pub fn new() -> Self {
        TimeBase {
            time: StreamTime::ZERO,
        }
    }

    pub fn at(start: StreamTime) -> Self {
        TimeBase { time: start }
    }

    #[inline]
    pub fn local_time(&self) -> StreamTime {
        self.time
    }

    /// Advance by a finite span, returning the new local time.
    pub(crate) fn advance(&mut self, by: Duration) -> StreamTime {
        self.time = self.time + by;
        self.time
    }

    /// Jump forward to `at`; backwards jumps leave the clock untouched.
    pub(crate) fn fast_forward(&mut self, at: StreamTime) -> StreamTime {
        if at > self.time {
            self.time = at;
        }
        self.time
    }
}

/// Host-scheduler collaborator: resolves the next coordinated
/// synchronization point for a suspending participant.
pub trait SyncScheduler: Send {
    /// Resolve the next joint advancement point, at least `delay` ahead
    /// when one is given.
    fn resolve_next_sync(&mut self, delay: Option<Duration>) -> StreamTime;
}

/// Commit/sync surface shared by readers and writers.
///
/// Commit operations return the resolved local time or an explicit
/// failure; sync operations return the resolved local time and fault
/// when no concrete suspension hook is wired in.
pub trait Timed: Named {
    fn time_base(&self) -> &TimeBase;
    fn time_base_mut(&mut self) -> &mut TimeBase;

    fn local_time(&self) -> StreamTime {
        self.time_base().local_time()
    }

    /// Buffer-drain hook behind [`Timed::commit_for`]; returns the span
    /// the local clock actually advances. Pass-through by default.
    fn do_commit(&mut self, duration: Duration) -> StreamResult<Duration> {
        Ok(duration)
    }

    /// Suspension hook behind the sync family. Abstract at this layer; a
    /// concrete override must ultimately resolve through
    /// [`SyncScheduler::resolve_next_sync`].
    fn do_sync(&mut self, _delay: Option<Duration>) -> StreamTime {
        report_fatal(Fault::not_implemented(self.name(), "sync"));
    }

    /// Zero-length commit: a synchronization tick that moves no data.
    fn commit(&mut self) -> StreamResult<StreamTime> {
        self.commit_for(Duration::ZERO)
    }

    /// Commit `duration` of timeline, advancing the local clock by the
    /// resolved span.
    fn commit_for(&mut self, duration: Duration) -> StreamResult<StreamTime> {
        let advanced = self.do_commit(duration)?;
        Ok(self.time_base_mut().advance(advanced))
    }

    /// Commit up to an absolute point. A target at or behind the local
    /// clock is the backwards-commit anomaly: observable, recoverable,
    /// degrades to a zero-length commit.
    fn commit_until(&mut self, until: StreamTime) -> StreamResult<StreamTime> {
        let now = self.local_time();
        if until > now {
            self.commit_for(until - now)
        } else {
            tracing::warn!(
                participant = self.name(),
                %until,
                %now,
                "backwards commit degraded to zero-length commit"
            );
            self.commit()
        }
    }

    /// Suspend until the next coordinated synchronization point.
    fn sync(&mut self) -> StreamTime {
        let at = self.do_sync(None);
        self.time_base_mut().fast_forward(at)
    }

    /// Suspend for at least `duration`.
    fn sync_for(&mut self, duration: Duration) -> StreamTime {
        let at = self.do_sync(Some(duration));
        self.time_base_mut().fast_forward(at)
    }

    /// Suspend until an absolute point; always delegates to
    /// [`Timed::sync_for`] over the remaining span.
    fn sync_until(&mut self, until: StreamTime) -> StreamTime {
        self.sync_for(until - self.local_time())
    }
}
