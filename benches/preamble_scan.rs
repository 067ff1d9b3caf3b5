//! Benchmarks for preamble search and stream synchronization
//!
//! Covers:
//! - Raw `find_all` throughput over a synthetic capture window
//! - Full synchronizer throughput at several chunk sizes
//! - Cost of enabling sub-byte alignment search
//!
//! Platform: Cross-platform (synthetic captures, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use streamdaq::bits::PreambleMatcher;
use streamdaq::capture::StreamSynchronizer;
use streamdaq::test_utils::SyntheticCapture;
use streamdaq::{DecoderConfig, FrameShape, TransformMode};

fn capture_config() -> DecoderConfig {
    DecoderConfig::new(FrameShape { width: 200, height: 200 })
}

fn synthetic_capture(buffers: usize, shift: u8) -> Vec<u8> {
    SyntheticCapture::new(&capture_config())
        .junk(123)
        .buffers(buffers)
        .shifted(shift, 1)
        .into_bytes()
}

fn bench_find_all(c: &mut Criterion) {
    let data = synthetic_capture(64, 0);
    let mut group = c.benchmark_group("find_all");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for max_bit_shift in [0u8, 1, 7] {
        let matcher = PreambleMatcher::new(0x1234_5678, &TransformMode::ALL, max_bit_shift)
            .expect("valid matcher");
        group.bench_with_input(
            BenchmarkId::new("max_bit_shift", max_bit_shift),
            &data,
            |b, data| b.iter(|| black_box(matcher.find_all(black_box(data)))),
        );
    }
    group.finish();
}

fn bench_synchronizer(c: &mut Criterion) {
    let data = synthetic_capture(64, 1);
    let mut group = c.benchmark_group("synchronizer");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for chunk_size in [512usize, 4096, 65536] {
        let mut config = capture_config();
        config.chunk_size = chunk_size;
        group.bench_with_input(BenchmarkId::new("chunk_size", chunk_size), &data, |b, data| {
            b.iter(|| {
                let sync = StreamSynchronizer::from_bytes(data.clone(), &config)
                    .expect("valid configuration");
                black_box(sync.filter_map(Result::ok).count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_all, bench_synchronizer);
criterion_main!(benches);
