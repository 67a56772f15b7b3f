//! Benchmarks for the stream commit path

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use holdline_core::Duration;
use holdline_stream::{Stream, Timed};

fn us(micros: u64) -> Duration {
    Duration::from_micros(micros)
}

fn bench_commit_round(c: &mut Criterion) {
    c.bench_function("commit_round_two_readers", |b| {
        b.iter_batched(
            || {
                let stream: Stream<u64> = Stream::new("bench");
                let mut writer = stream.writer("w");
                let first = stream.reader("a");
                let second = stream.reader("b");
                for i in 0..64u64 {
                    writer.push_for(i, us(4));
                }
                (stream, writer, first, second)
            },
            |(_stream, _writer, mut first, mut second)| {
                for _ in 0..16 {
                    first.commit_for(us(16)).unwrap();
                    second.commit_last(us(16)).unwrap();
                }
                black_box(first.local_time())
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_produce_consume_cycle(c: &mut Criterion) {
    c.bench_function("produce_consume_cycle", |b| {
        b.iter_batched(
            || {
                let stream: Stream<u64> = Stream::new("bench");
                let writer = stream.writer("w");
                let reader = stream.reader("r");
                (stream, writer, reader)
            },
            |(_stream, mut writer, mut reader)| {
                for i in 0..128u64 {
                    writer.push_for(i, us(2));
                    reader.commit_last(us(2)).unwrap();
                }
                black_box(reader.buffered())
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_commit_round, bench_produce_consume_cycle);
criterion_main!(benches);
