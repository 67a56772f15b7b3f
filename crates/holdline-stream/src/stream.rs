//! Shared timed value streams: committed and look-ahead buffers
//!
//! A stream owns two sequences. The committed buffer is what readers
//! consume; the future buffer holds producer look-ahead that matures
//! into the committed buffer as commits reach it. All mutation funnels
//! through the stream so readers never touch the shared timeline
//! directly.

use std::sync::Arc;

use parking_lot::Mutex;

use holdline_core::{
    report_fatal, DefaultFill, Duration, EmptyPolicy, Fault, HoldSplit, Named, SplitPolicy,
    StreamError, StreamResult, StreamTime, Tuple,
};

use crate::reader::Reader;
use crate::sequence::Sequence;
use crate::writer::Writer;

pub(crate) type ReaderId = u64;

struct ReaderSlot {
    id: ReaderId,
    /// Absolute stream time up to which this reader has consumed.
    frontier: StreamTime,
}

pub(crate) struct StreamState<T> {
    committed: Sequence<T>,
    future: Sequence<T>,
    /// Span between the committed end and the first look-ahead run.
    future_gap: Duration,
    /// Absolute time of the committed buffer's first run.
    head_time: StreamTime,
    empty: Option<Box<dyn EmptyPolicy<T>>>,
    split: Box<dyn SplitPolicy<T>>,
    writer_attached: bool,
    next_reader: ReaderId,
    readers: Vec<ReaderSlot>,
}

pub(crate) struct StreamInner<T> {
    name: String,
    state: Mutex<StreamState<T>>,
}

/// Append filler runs until the committed buffer covers `target`,
/// cutting the last filler to the exact shortfall.
fn fill_committed<T: Clone + PartialEq>(
    st: &mut StreamState<T>,
    target: Duration,
) -> StreamResult<()> {
    while st.committed.duration() < target {
        let available = st.committed.duration();
        let missing = target - available;
        let Some(policy) = st.empty.as_ref() else {
            return Err(StreamError::Underrun {
                requested: target,
                available,
            });
        };
        let filler = policy.fill();
        if filler.is_empty() {
            // a zero-length fill can never make progress
            return Err(StreamError::Underrun {
                requested: target,
                available,
            });
        }
        if filler.duration() > missing {
            let tail_duration = filler.duration().remaining_after(missing);
            let (head_value, _) = st.split.split(filler.into_value(), missing, tail_duration);
            st.committed.push(Tuple::new(head_value, missing));
        } else {
            st.committed.push(filler);
        }
    }
    Ok(())
}

/// Mature look-ahead data into the committed buffer until it covers
/// `needed`; the gap ahead of the look-ahead is manufactured by the
/// empty policy.
fn merge_future<T: Clone + PartialEq>(
    st: &mut StreamState<T>,
    needed: Duration,
) -> StreamResult<()> {
    if st.future.is_empty() || st.committed.duration() >= needed {
        return Ok(());
    }
    if !st.future_gap.is_zero() {
        let gap_end = st.committed.duration() + st.future_gap;
        fill_committed(st, gap_end)?;
        st.future_gap = Duration::ZERO;
    }
    while st.committed.duration() < needed {
        match st.future.pop_front() {
            Some(run) => st.committed.push(run),
            None => break,
        }
    }
    Ok(())
}

fn release_consumed<T: Clone + PartialEq>(name: &str, st: &mut StreamState<T>) {
    let Some(min) = st.readers.iter().map(|slot| slot.frontier).min() else {
        return;
    };
    if min <= st.head_time {
        return;
    }
    let span = min - st.head_time;
    st.committed.align_boundary(span, &*st.split);
    st.committed.drop_front(span);
    st.head_time = min;
    tracing::debug!(stream = name, released = %span, "released consumed history");
}

impl<T: Clone + PartialEq> StreamInner<T> {
    pub(crate) fn push_tuple(&self, tuple: Tuple<T>) {
        let mut st = self.state.lock();
        if !st.future.is_empty() {
            if tuple.duration() > st.future_gap {
                report_fatal(Fault::contract("push overlaps buffered look-ahead data"));
            }
            st.future_gap = st.future_gap - tuple.duration();
        }
        st.committed.push(tuple);
    }

    pub(crate) fn push_at(&self, offset: Duration, tuple: Tuple<T>) {
        if offset.is_zero() {
            return self.push_tuple(tuple);
        }
        if offset.is_infinite() {
            report_fatal(Fault::contract("look-ahead offset must be finite"));
        }
        let mut st = self.state.lock();
        if st.committed.duration().is_infinite() {
            report_fatal(Fault::contract("look-ahead after an infinite committed tail"));
        }
        if st.future.is_empty() {
            st.future_gap = offset;
            st.future.push(tuple);
        } else if offset == st.future_gap + st.future.duration() {
            st.future.push(tuple);
        } else {
            report_fatal(Fault::contract("look-ahead pushes must be contiguous"));
        }
    }

    /// Consumer-side commit: make `[frontier, frontier + requested)`
    /// available, deliver it, advance the frontier. `last` marks the
    /// terminal commit of a coordinated round and releases history every
    /// attached reader has consumed.
    pub(crate) fn commit_reader(
        &self,
        id: ReaderId,
        requested: Duration,
        last: bool,
    ) -> StreamResult<Vec<Tuple<T>>> {
        if requested.is_infinite() {
            report_fatal(Fault::contract("commit duration must be finite"));
        }
        let mut guard = self.state.lock();
        let st = &mut *guard;
        let frontier = match st.readers.iter().find(|slot| slot.id == id) {
            Some(slot) => slot.frontier,
            None => report_fatal(Fault::contract("commit from a detached reader")),
        };
        let start = frontier - st.head_time;
        let until = start + requested;

        merge_future(st, until)?;
        fill_committed(st, until)?;
        // boundaries at both window edges, so the covering view is exact
        // and later drops stay aligned
        st.committed.align_boundary(start, &*st.split);
        st.committed.align_boundary(until, &*st.split);

        let delivered: Vec<Tuple<T>> = st
            .committed
            .covering_range(start, until)
            .iter()
            .cloned()
            .collect();

        if let Some(slot) = st.readers.iter_mut().find(|slot| slot.id == id) {
            slot.frontier = frontier + requested;
        }
        if last {
            release_consumed(&self.name, st);
        }
        Ok(delivered)
    }

    /// Duration committed upstream and not yet consumed by `id`.
    pub(crate) fn available_for(&self, id: ReaderId) -> Duration {
        let st = self.state.lock();
        let frontier = match st.readers.iter().find(|slot| slot.id == id) {
            Some(slot) => slot.frontier,
            None => return Duration::ZERO,
        };
        st.committed.duration().remaining_after(frontier - st.head_time)
    }
}

impl<T> StreamInner<T> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn attach_writer(&self) {
        let mut st = self.state.lock();
        if st.writer_attached {
            report_fatal(Fault::configuration(format!(
                "stream '{}' already has a writer",
                self.name
            )));
        }
        st.writer_attached = true;
    }

    pub(crate) fn detach_writer(&self) {
        self.state.lock().writer_attached = false;
    }

    pub(crate) fn attach_reader(&self) -> (ReaderId, StreamTime) {
        let mut st = self.state.lock();
        let id = st.next_reader;
        st.next_reader += 1;
        let frontier = st.head_time;
        st.readers.push(ReaderSlot { id, frontier });
        (id, frontier)
    }

    pub(crate) fn detach_reader(&self, id: ReaderId) {
        self.state.lock().readers.retain(|slot| slot.id != id);
    }

    pub(crate) fn clear(&self) {
        let mut st = self.state.lock();
        st.committed.clear();
        st.future.clear();
        st.future_gap = Duration::ZERO;
        let resume = st
            .readers
            .iter()
            .map(|slot| slot.frontier)
            .max()
            .unwrap_or(st.head_time)
            .max(st.head_time);
        st.head_time = resume;
        for slot in &mut st.readers {
            slot.frontier = resume;
        }
    }

    pub(crate) fn duration(&self) -> Duration {
        self.state.lock().committed.duration()
    }
}

/// Shared handle to a timed value stream.
///
/// Cloning the handle shares the underlying buffers; participants are
/// attached through [`Stream::writer`] and [`Stream::reader`].
pub struct Stream<T> {
    inner: Arc<StreamInner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + PartialEq + 'static> Stream<T> {
    /// Stream with the stock policies: default-value filler and
    /// hold-on-split.
    pub fn new(name: impl Into<String>) -> Self {
        Stream::with_policies(name, Box::new(HoldSplit), Some(Box::new(DefaultFill)))
    }
}

impl<T> Stream<T> {
    /// Stream with injected policies. Passing no empty policy makes
    /// over-long commits fail with [`StreamError::Underrun`] instead of
    /// filling.
    pub fn with_policies(
        name: impl Into<String>,
        split: Box<dyn SplitPolicy<T>>,
        empty: Option<Box<dyn EmptyPolicy<T>>>,
    ) -> Self {
        Stream {
            inner: Arc::new(StreamInner {
                name: name.into(),
                state: Mutex::new(StreamState {
                    committed: Sequence::new(),
                    future: Sequence::new(),
                    future_gap: Duration::ZERO,
                    head_time: StreamTime::ZERO,
                    empty,
                    split,
                    writer_attached: false,
                    next_reader: 0,
                    readers: Vec::new(),
                }),
            }),
        }
    }

    /// Attach the producer. At most one writer per stream; a second
    /// attach is a fatal configuration fault, raised here and never at
    /// data-access time.
    pub fn writer(&self, name: impl Into<String>) -> Writer<T> {
        self.inner.attach_writer();
        Writer::attach(name.into(), Arc::clone(&self.inner))
    }

    /// Attach a consumer. New readers start at the oldest retained point
    /// of the committed buffer.
    pub fn reader(&self, name: impl Into<String>) -> Reader<T> {
        let (id, start) = self.inner.attach_reader();
        Reader::attach(name.into(), Arc::clone(&self.inner), id, start)
    }

    /// Committed buffer duration.
    pub fn duration(&self) -> Duration {
        self.inner.duration()
    }

    /// Discard all buffered data. Every reader resumes at the same
    /// empty-buffer point.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl<T: Clone + PartialEq> Stream<T> {
    /// Clone of the committed buffer, for diagnostics and tests.
    pub fn snapshot(&self) -> Sequence<T> {
        let st = self.inner.state.lock();
        st.committed.iter().cloned().collect()
    }
}

impl<T> Named for Stream<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> &'static str {
        "stream"
    }
}
