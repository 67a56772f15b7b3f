//! End-to-end producer/consumer harness
//!
//! Drives one writer and a set of readers through coordinated commit
//! rounds, in the shape a host scheduler would: the writer produces,
//! every reader commits the round span, the final reader's commit is
//! terminal and releases consumed history.

use holdline_core::{Duration, StreamResult, StreamTime};
use holdline_stream::{Reader, Stream, Timed, Writer};

use crate::scheduler::RoundScheduler;

pub struct StreamHarness {
    pub stream: Stream<u32>,
    writer: Writer<u32>,
    readers: Vec<Reader<u32>>,
    scheduler: RoundScheduler,
}

impl StreamHarness {
    pub fn new(reader_count: usize, quantum: Duration) -> Self {
        let stream: Stream<u32> = Stream::new("harness");
        let scheduler = RoundScheduler::new(quantum);
        let mut writer = stream.writer("producer");
        writer.set_scheduler(scheduler.handle());
        let readers = (0..reader_count)
            .map(|i| {
                let mut reader = stream.reader(format!("consumer-{i}"));
                reader.set_scheduler(scheduler.handle());
                reader
            })
            .collect();
        StreamHarness {
            stream,
            writer,
            readers,
            scheduler,
        }
    }

    /// Produce one run and commit the writer over its span.
    pub fn produce(&mut self, value: u32, duration: Duration) -> StreamResult<StreamTime> {
        self.writer.push_for(value, duration);
        self.writer.commit_for(duration)
    }

    /// One coordinated round: every reader commits `span`; the final
    /// commit is terminal.
    pub fn round(&mut self, span: Duration) -> StreamResult<StreamTime> {
        let mut resolved = StreamTime::ZERO;
        let last = self.readers.len().saturating_sub(1);
        for (index, reader) in self.readers.iter_mut().enumerate() {
            resolved = if index == last {
                reader.commit_last(span)?
            } else {
                reader.commit_for(span)?
            };
        }
        Ok(resolved)
    }

    pub fn writer_mut(&mut self) -> &mut Writer<u32> {
        &mut self.writer
    }

    pub fn reader(&self, index: usize) -> &Reader<u32> {
        &self.readers[index]
    }

    pub fn reader_mut(&mut self, index: usize) -> &mut Reader<u32> {
        &mut self.readers[index]
    }

    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }
}
