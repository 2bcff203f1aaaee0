//! Index benchmarks.
//!
//! Every page access goes to the file, so these measure the on-disk cost of
//! inserts and scans rather than an in-memory fast path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use secidx::{Attribute, IndexFile, Key, Rid};
use tempfile::{tempdir, TempDir};

fn fresh_index() -> (TempDir, IndexFile) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.idx");
    IndexFile::create(&path).unwrap();
    let index = IndexFile::open(&path).unwrap();
    (dir, index)
}

/// Deterministic permutation of `0..count`.
fn shuffled(count: i32) -> Vec<i32> {
    let mut keys: Vec<i32> = (0..count).collect();
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for i in (1..keys.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        keys.swap(i, (state % (i as u64 + 1)) as usize);
    }
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_insert");
    let attr = Attribute::int("k");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, &count| {
            b.iter_with_setup(fresh_index, |(dir, mut index)| {
                for v in 0..count {
                    index.insert_entry(&attr, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
                }
                (dir, index)
            });
        });

        group.bench_with_input(BenchmarkId::new("random", count), count, |b, &count| {
            b.iter_with_setup(
                || (fresh_index(), shuffled(count)),
                |((dir, mut index), keys)| {
                    for v in keys {
                        index.insert_entry(&attr, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
                    }
                    (dir, index)
                },
            );
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_scan");
    let attr = Attribute::int("k");
    let count = 20_000;

    let (_dir, mut index) = fresh_index();
    for v in shuffled(count) {
        index.insert_entry(&attr, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
    }

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("full", |b| {
        b.iter(|| {
            let scan = index.scan(&attr, None, None, true, true).unwrap();
            black_box(scan.count())
        });
    });

    for width in [10, 1_000].iter() {
        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("range", width), width, |b, &width| {
            let low = Key::Int(count / 2);
            let high = Key::Int(count / 2 + width - 1);
            b.iter(|| {
                let scan = index.scan(&attr, Some(&low), Some(&high), true, true).unwrap();
                black_box(scan.count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan);
criterion_main!(benches);
