use RustedSymCalc::calculator::service::{
    SubstitutionMap, calculate, derivative, integrate, series_expansion, simplify,
};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_derivative(c: &mut Criterion) {
    c.bench_function("derivative", |b| {
        b.iter(|| derivative(black_box("exp(sin(x))*x**2/(x + 2)"), black_box("x")))
    });
}

fn bench_calculate(c: &mut Criterion) {
    let values = SubstitutionMap::from([("x".to_string(), 0.7), ("y".to_string(), 1.3)]);
    c.bench_function("calculate", |b| {
        b.iter(|| calculate(black_box("sin(x)*exp(y) + log(x + y)"), Some(&values)))
    });
}

fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate");
    group.bench_function("by parts", |b| {
        b.iter(|| integrate(black_box("x**2*exp(x)"), "x", None, None))
    });
    group.bench_function("rational", |b| {
        b.iter(|| integrate(black_box("(x + 3)/(x**2 + 2*x + 5)"), "x", None, None))
    });
    group.bench_function("definite", |b| {
        b.iter(|| integrate(black_box("x*cos(x)"), "x", Some("0"), Some("pi")))
    });
    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    c.bench_function("simplify", |b| {
        b.iter(|| simplify(black_box("(x**2 - 1)/(x - 1) + sin(x)**2 + cos(x)**2")))
    });
}

fn bench_series(c: &mut Criterion) {
    c.bench_function("series exp order 10", |b| {
        b.iter(|| series_expansion(black_box("exp(x)*cos(x)"), "x", 10, "0"))
    });
}

criterion_group!(
    benches,
    bench_derivative,
    bench_calculate,
    bench_integrate,
    bench_simplify,
    bench_series
);
criterion_main!(benches);
