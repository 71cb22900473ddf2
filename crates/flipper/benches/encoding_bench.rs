//! Criterion benchmarks for encodings.
//!
//! Composes random words on the twice-punctured torus and applies them to a
//! key curve, for growing word lengths; the weights grow exponentially for
//! most words, so this mostly measures big-integer arithmetic.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use flipper::api::{s_1_2, Surface};
use num_bigint::BigInt;

fn bench_compose(c: &mut Criterion) {
    let surface: Surface = s_1_2().expect("S_1_2 builds");
    let mut group = c.benchmark_group("encoding_compose");
    for &len in &[4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &n| {
            b.iter_batched(
                || surface.random_word(n, 17 + n as u64),
                |word| {
                    let _ = black_box(surface.mapping_class(&word).unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let surface = s_1_2().expect("S_1_2 builds");
    let curve: Vec<BigInt> = surface.triangulation().key_curves()[0]
        .iter()
        .map(|&w| BigInt::from(w))
        .collect();
    let mut group = c.benchmark_group("encoding_apply");
    for &len in &[4usize, 16, 64] {
        let f = surface
            .mapping_class(&surface.random_word(len, 29 + len as u64))
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &f, |b, f| {
            b.iter(|| black_box(f.apply(&curve).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compose, bench_apply);
criterion_main!(benches);
