//! Stream writers: produce timeline into the shared buffers

use std::sync::Arc;

use holdline_core::{
    report_fatal, Duration, Fault, Named, Role, StreamTime, Tuple,
};

use crate::stream::StreamInner;
use crate::timebase::{SyncScheduler, TimeBase, Timed};

/// Producer attached to a [`crate::stream::Stream`].
///
/// Pushes append directly to the committed buffer; offset pushes build
/// look-ahead in the future buffer. The local clock tracks how much
/// timeline the writer has committed; the default drain is pass-through.
pub struct Writer<T> {
    name: String,
    base: TimeBase,
    stream: Arc<StreamInner<T>>,
    scheduler: Option<Box<dyn SyncScheduler>>,
}

impl<T> Writer<T> {
    pub(crate) fn attach(name: String, stream: Arc<StreamInner<T>>) -> Self {
        Writer {
            name,
            base: TimeBase::new(),
            stream,
            scheduler: None,
        }
    }

    pub fn role(&self) -> Role {
        Role::Writer
    }

    /// Wire in the host scheduler so the sync family resolves instead of
    /// faulting.
    pub fn set_scheduler(&mut self, scheduler: Box<dyn SyncScheduler>) {
        self.scheduler = Some(scheduler);
    }
}

impl<T: Clone + PartialEq> Writer<T> {
    /// Terminal hold: the value holds forever, until a commit cuts it.
    pub fn push(&mut self, value: T) {
        self.stream.push_tuple(Tuple::hold(value));
    }

    /// Push one run.
    pub fn push_for(&mut self, value: T, duration: Duration) {
        self.stream.push_tuple(Tuple::new(value, duration));
    }

    /// Push one run as a tuple.
    pub fn push_tuple(&mut self, tuple: Tuple<T>) {
        self.stream.push_tuple(tuple);
    }

    /// Push a run `offset` past the committed end. Zero offsets append
    /// directly; non-zero offsets build contiguous look-ahead.
    pub fn push_at(&mut self, offset: Duration, tuple: Tuple<T>) {
        self.stream.push_at(offset, tuple);
    }
}

impl<T> Named for Writer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "writer"
    }
}

impl<T> Timed for Writer<T> {
    fn time_base(&self) -> &TimeBase {
        &self.base
    }

    fn time_base_mut(&mut self) -> &mut TimeBase {
        &mut self.base
    }

    fn do_sync(&mut self, delay: Option<Duration>) -> StreamTime {
        match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.resolve_next_sync(delay),
            None => report_fatal(Fault::not_implemented(&self.name, "sync")),
        }
    }
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        self.stream.detach_writer();
    }
}
