//! Range marker benchmarks.

use chaincache_bench::fragmented_marker;
use chaincache_core::{RangeMarker, Selection};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

/// Benchmark marking sequential heights, the pattern of a cache fill.
fn bench_mark_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("mark");

    for count in [1_000u64, 100_000] {
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter(|| {
                let mut marker = RangeMarker::new();
                for i in 0..count {
                    marker.mark(i).unwrap();
                }
                black_box(marker.range_count());
            });
        });
    }

    group.bench_function("scattered_set", |b| {
        let indices: Vec<u64> = (0..10_000).map(|i| i * 3).collect();
        b.iter(|| {
            let mut marker = RangeMarker::new();
            marker.mark(Selection::Set(indices.clone())).unwrap();
            black_box(marker.range_count());
        });
    });

    group.bench_function("bridge_runs", |b| {
        b.iter_batched(
            || fragmented_marker(10_000, 4),
            |mut marker| {
                marker.mark(0..=50_000).unwrap();
                black_box(marker.range_count());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark queries against a fragmented marker.
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for runs in [100u64, 10_000] {
        let marker = fragmented_marker(runs, 8);
        let last = runs * 9;

        group.bench_with_input(BenchmarkId::new("is_marked_index", runs), &marker, |b, m| {
            b.iter(|| black_box(m.is_marked(black_box(last / 2)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("is_marked_range", runs), &marker, |b, m| {
            b.iter(|| black_box(m.is_marked(black_box(0..=last)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("get_first_unmarked", runs), &marker, |b, m| {
            b.iter(|| black_box(m.get_first(false, black_box(last / 2), None).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mark_sequential, bench_queries);
criterion_main!(benches);
