//! Round-based cooperative scheduler for tests
//!
//! Stands in for the host scheduler: every suspension resolves to the
//! next quantum boundary at or after the requested delay, so all
//! participants sharing one scheduler advance through the same joint
//! points.

use std::sync::Arc;

use parking_lot::Mutex;

use holdline_core::{Duration, StreamTime};
use holdline_stream::SyncScheduler;

struct SchedulerState {
    now: StreamTime,
    quantum: Duration,
}

/// Shared round scheduler. Hand one [`RoundScheduler::handle`] to each
/// participant.
pub struct RoundScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl RoundScheduler {
    pub fn new(quantum: Duration) -> Self {
        assert!(!quantum.is_zero() && !quantum.is_infinite());
        RoundScheduler {
            state: Arc::new(Mutex::new(SchedulerState {
                now: StreamTime::ZERO,
                quantum,
            })),
        }
    }

    /// Current joint time.
    pub fn now(&self) -> StreamTime {
        self.state.lock().now
    }

    /// A handle suitable for [`holdline_stream::Reader::set_scheduler`]
    /// and the writer equivalent.
    pub fn handle(&self) -> Box<dyn SyncScheduler> {
        Box::new(SchedulerHandle {
            state: Arc::clone(&self.state),
        })
    }
}

struct SchedulerHandle {
    state: Arc<Mutex<SchedulerState>>,
}

impl SyncScheduler for SchedulerHandle {
    fn resolve_next_sync(&mut self, delay: Option<Duration>) -> StreamTime {
        let mut st = self.state.lock();
        let target = match delay {
            Some(d) if !d.is_zero() => st.now + d,
            _ => st.now + st.quantum,
        };
        let quantum = st.quantum.as_micros();
        let rounded = target.as_micros().div_ceil(quantum) * quantum;
        st.now = StreamTime::from_micros(rounded);
        st.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(micros: u64) -> Duration {
        Duration::from_micros(micros)
    }

    #[test]
    fn test_bare_sync_advances_one_quantum() {
        let sched = RoundScheduler::new(us(10));
        let mut h = sched.handle();
        assert_eq!(h.resolve_next_sync(None), StreamTime::from_micros(10));
        assert_eq!(h.resolve_next_sync(None), StreamTime::from_micros(20));
    }

    #[test]
    fn test_delay_rounds_up_to_quantum() {
        let sched = RoundScheduler::new(us(10));
        let mut h = sched.handle();
        assert_eq!(h.resolve_next_sync(Some(us(13))), StreamTime::from_micros(20));
        assert_eq!(sched.now(), StreamTime::from_micros(20));
    }

    #[test]
    fn test_handles_share_the_joint_clock() {
        let sched = RoundScheduler::new(us(5));
        let mut a = sched.handle();
        let mut b = sched.handle();
        a.resolve_next_sync(None);
        assert_eq!(b.resolve_next_sync(None), StreamTime::from_micros(10));
    }
}
