//! Criterion benchmarks for the accumulators and the row store.
//!
//! Run with: cargo bench --bench accumulators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sensor_clean::average::{Average, Mean, Median, RollingMean};
use sensor_clean::data::store::RowStore;

fn samples(n: usize) -> Vec<f64> {
    // Deterministic, unsorted input
    (0..n).map(|i| ((i * 7919) % 1000) as f64 / 10.0).collect()
}

/// Add then average once per sample, as a per-sample smoothing filter would.
fn accumulator_add_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator_add_average");
    let input = samples(10_000);
    group.throughput(Throughput::Elements(input.len() as u64));

    group.bench_function("mean", |b| {
        b.iter(|| {
            let mut mean = Mean::new();
            for &v in &input {
                mean.add(v).unwrap();
                black_box(mean.average().unwrap());
            }
        })
    });

    for window in [5usize, 25, 101] {
        group.bench_with_input(BenchmarkId::new("median", window), &window, |b, &w| {
            b.iter(|| {
                let mut median = Median::new(w);
                for &v in &input {
                    median.add(v).unwrap();
                    black_box(median.average().unwrap());
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("rolling_mean", window), &window, |b, &w| {
            b.iter(|| {
                let mut rolling = RollingMean::new(w);
                for &v in &input {
                    rolling.add(v).unwrap();
                    black_box(rolling.average().unwrap());
                }
            })
        });
    }
    group.finish();
}

/// Append and sequential read throughput of the memory-mapped store.
fn row_store_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_store");
    let rows = 100_000usize;
    group.throughput(Throughput::Elements(rows as u64));

    group.bench_function("push_kinematic", |b| {
        b.iter(|| {
            let mut store = RowStore::with_capacity(rows).unwrap();
            for i in 0..rows {
                store
                    .push_kinematic("2020-01-01 00:00:00.000", i as f64, 0.5, -0.5)
                    .unwrap();
            }
            black_box(store.len())
        })
    });

    let mut store = RowStore::with_capacity(rows).unwrap();
    for i in 0..rows {
        store
            .push_kinematic("2020-01-01 00:00:00.000", i as f64, 0.5, -0.5)
            .unwrap();
    }
    group.bench_function("column", |b| {
        b.iter(|| black_box(store.column(0).unwrap().len()))
    });
    group.bench_function("iter", |b| b.iter(|| black_box(store.iter().count())));
    group.finish();
}

criterion_group!(benches, accumulator_add_average, row_store_throughput);
criterion_main!(benches);
