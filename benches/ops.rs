use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fastrand::Rng;

use kleene::random::{random_dfa, random_nfa};

fn determinization(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinize");
    let mut rng = Rng::with_seed(1);
    for size in [4, 8, 12] {
        let nfa = random_nfa(&mut rng, 2, size, 0.2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &nfa, |b, nfa| {
            b.iter(|| black_box(nfa.determinize()))
        });
    }
    group.finish();
}

fn minimization(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize");
    let mut rng = Rng::with_seed(2);
    for size in [16, 64, 256] {
        let dfa = random_dfa(&mut rng, 3, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &dfa, |b, dfa| {
            b.iter(|| black_box(dfa.minimize()))
        });
    }
    group.finish();
}

fn regex_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex");
    for input in ["(a|b)*ab", "(ab+ba)*(a+ε)b*", "((a|b)(a|b))*a(b|c)*"] {
        group.bench_with_input(BenchmarkId::new("thompson", input), input, |b, input| {
            b.iter(|| black_box(kleene::regex::thompson(input)))
        });
        group.bench_with_input(BenchmarkId::new("glushkov", input), input, |b, input| {
            b.iter(|| black_box(kleene::regex::glushkov(input)))
        });
        if let Ok(nfa) = kleene::regex::thompson(input) {
            group.bench_with_input(BenchmarkId::new("to_regex", input), &nfa, |b, nfa| {
                b.iter(|| black_box(nfa.to_regex()))
            });
        }
    }
    group.finish();
}

fn products(c: &mut Criterion) {
    let mut rng = Rng::with_seed(3);
    let left = random_dfa(&mut rng, 2, 32);
    let right = random_dfa(&mut rng, 2, 32);
    c.bench_function("intersection 32x32", |b| {
        b.iter(|| black_box(left.intersection(&right)))
    });
    c.bench_function("equivalent 32", |b| {
        b.iter(|| black_box(left.equivalent(&right)))
    });
}

criterion_group!(
    benches,
    determinization,
    minimization,
    regex_roundtrip,
    products
);
criterion_main!(benches);
