//! KSUID codec, sequence and compressed set benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ksuid::{CompressedSet, Ksuid, Sequence};

/// Create `n` random ids.
fn random_ids(n: usize) -> Vec<Ksuid> {
    (0..n).map(|_| Ksuid::new()).collect()
}

/// Create `n` ids drawn round-robin from ten sequences.
fn sequence_ids(n: usize) -> Vec<Ksuid> {
    let sequences: Vec<Sequence> = (0..10).map(|_| Sequence::new(Ksuid::new())).collect();
    (0..n)
        .map(|i| sequences[i % sequences.len()].next().unwrap())
        .collect()
}

/// Benchmark generation and the string codec.
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let id = Ksuid::new();
    let text = id.to_string();

    group.bench_function("new", |b| b.iter(|| black_box(Ksuid::new())));
    group.bench_function("encode", |b| b.iter(|| black_box(black_box(&id).encode())));
    group.bench_function("parse", |b| {
        b.iter(|| black_box(Ksuid::parse(black_box(&text)).unwrap()))
    });
    group.bench_function("sequence_next", |b| {
        b.iter_batched(
            || Sequence::new(id),
            |seq| black_box(seq.next().unwrap()),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Benchmark sorting and set compression.
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");

    for size in [100, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        let random = random_ids(size);
        group.bench_with_input(BenchmarkId::new("sort", size), &random, |b, ids| {
            b.iter_batched(
                || ids.clone(),
                |mut ids| {
                    ksuid::sort(&mut ids);
                    black_box(ids)
                },
                criterion::BatchSize::SmallInput,
            )
        });

        for (name, ids) in [("random", random), ("sequence", sequence_ids(size))] {
            group.bench_with_input(
                BenchmarkId::new(format!("compress_{}", name), size),
                &ids,
                |b, ids| b.iter(|| black_box(CompressedSet::compress(black_box(ids)))),
            );

            let set = CompressedSet::compress(&ids);
            group.bench_with_input(
                BenchmarkId::new(format!("iterate_{}", name), size),
                &set,
                |b, set| b.iter(|| black_box(set.iter().count())),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_set);
criterion_main!(benches);
