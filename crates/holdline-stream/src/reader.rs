//! Stream readers: consume the committed timeline against a local clock

use std::sync::Arc;

use holdline_core::{
    report_fatal, Duration, Fault, Named, Role, StreamResult, StreamTime, Tuple,
};

use crate::sequence::Sequence;
use crate::stream::{ReaderId, StreamInner};
use crate::timebase::{SyncScheduler, TimeBase, Timed};

/// Consumer attached to a [`crate::stream::Stream`].
///
/// Commits drain the shared committed buffer into a private sequence;
/// the local clock advances by exactly the committed span. Dropping the
/// reader detaches it, so its frontier stops pinning history.
pub struct Reader<T> {
    name: String,
    base: TimeBase,
    stream: Arc<StreamInner<T>>,
    id: ReaderId,
    buf: Sequence<T>,
    scheduler: Option<Box<dyn SyncScheduler>>,
}

impl<T> Reader<T> {
    pub(crate) fn attach(
        name: String,
        stream: Arc<StreamInner<T>>,
        id: ReaderId,
        start: StreamTime,
    ) -> Self {
        Reader {
            name,
            base: TimeBase::at(start),
            stream,
            id,
            buf: Sequence::new(),
            scheduler: None,
        }
    }

    pub fn role(&self) -> Role {
        Role::Reader
    }

    /// Wire in the host scheduler so the sync family resolves instead of
    /// faulting.
    pub fn set_scheduler(&mut self, scheduler: Box<dyn SyncScheduler>) {
        self.scheduler = Some(scheduler);
    }

    /// Duration delivered locally and not yet popped.
    pub fn buffered(&self) -> Duration {
        self.buf.duration()
    }

    /// First run of the local buffer.
    pub fn front(&self) -> Option<&Tuple<T>> {
        self.buf.front()
    }

    /// Consume the first run of the local buffer.
    pub fn pop(&mut self) -> Option<Tuple<T>> {
        self.buf.pop_front()
    }

    /// The local buffer as a sequence.
    pub fn local_buffer(&self) -> &Sequence<T> {
        &self.buf
    }
}

impl<T: Clone + PartialEq> Reader<T> {
    fn commit_impl(&mut self, duration: Duration, last: bool) -> StreamResult<Duration> {
        let delivered = self.stream.commit_reader(self.id, duration, last)?;
        for run in delivered {
            self.buf.push(run);
        }
        Ok(duration)
    }

    /// Terminal commit of a coordinated round: besides the regular
    /// drain, history consumed by every attached reader is released.
    pub fn commit_last(&mut self, duration: Duration) -> StreamResult<StreamTime> {
        let advanced = self.commit_impl(duration, true)?;
        Ok(self.time_base_mut().advance(advanced))
    }

    /// Duration committed upstream and not yet consumed by this reader.
    pub fn available(&self) -> Duration {
        self.stream.available_for(self.id)
    }
}

impl<T> Named for Reader<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "reader"
    }
}

impl<T: Clone + PartialEq> Timed for Reader<T> {
    fn time_base(&self) -> &TimeBase {
        &self.base
    }

    fn time_base_mut(&mut self) -> &mut TimeBase {
        &mut self.base
    }

    fn do_commit(&mut self, duration: Duration) -> StreamResult<Duration> {
        self.commit_impl(duration, false)
    }

    fn do_sync(&mut self, delay: Option<Duration>) -> StreamTime {
        match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.resolve_next_sync(delay),
            None => report_fatal(Fault::not_implemented(&self.name, "sync")),
        }
    }
}

impl<T> Drop for Reader<T> {
    fn drop(&mut self) {
        self.stream.detach_reader(self.id);
    }
}
