//! Criterion benchmarks for u-assign.
//!
//! Uses seeded synthetic traces to measure state-layer and search overhead.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_assign::anneal::{AnnealRunner, Neighbor, TemperatureSchedule};
use u_assign::mutation::{
    AssignAnyRandomRoute, EjectionChain, FillGreedy, MutationNeighbor, NegatedScore, Randomize,
    RecallRandom,
};
use u_assign::state::{collapse, StateArena};
use u_assign::trace::Trace;

// ===========================================================================
// Synthetic traces
// ===========================================================================

/// `candidates` candidates, each scoring up to four of `candidates * 2`
/// routes; every route claims one to three of `candidates` customers.
fn synthetic_trace(candidates: usize, seed: u64) -> Trace {
    let routes = candidates * 2;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = Trace::builder();
    for r in 0..routes {
        let customers: Vec<String> = (0..rng.random_range(1..=3))
            .map(|_| format!("c{}", rng.random_range(0..candidates)))
            .collect();
        builder = builder.route(format!("r{r}"), customers);
    }
    for c in 0..candidates {
        let mut options: Vec<(String, f64)> = Vec::new();
        for _ in 0..4 {
            let route = format!("r{}", rng.random_range(0..routes));
            if options.iter().all(|(name, _)| *name != route) {
                options.push((route, rng.random_range(1.0..1000.0)));
            }
        }
        builder = builder.candidate(format!("p{c}"), options);
    }
    builder.build().expect("synthetic trace is valid")
}

fn operators() -> Randomize {
    Randomize::uniform(
        vec![
            Box::new(RecallRandom),
            Box::new(AssignAnyRandomRoute),
            Box::new(FillGreedy),
            Box::new(EjectionChain::with_limit(4)),
        ],
        2,
    )
    .expect("operators are non-empty")
}

// ===========================================================================
// State layers
// ===========================================================================

fn bench_diff_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_chain");

    for &n in &[100, 1000] {
        let trace = Arc::new(synthetic_trace(n, 42));
        group.bench_with_input(BenchmarkId::from_parameter(n), &trace, |b, trace| {
            b.iter(|| {
                let mut arena = StateArena::new(Arc::clone(trace));
                let mut rng = StdRng::seed_from_u64(1);
                let mut state = arena.empty_solution();
                let neighbor = MutationNeighbor::new(FillGreedy);
                for epoch in 0..20 {
                    state = neighbor.propose(&mut arena, state, epoch, &mut rng);
                }
                black_box(arena.state(state).score())
            })
        });
    }
    group.finish();
}

fn bench_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse");

    for &depth in &[10, 100] {
        let trace = Arc::new(synthetic_trace(200, 7));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &trace, |b, trace| {
            b.iter(|| {
                let mut arena = StateArena::new(Arc::clone(trace));
                let mut state = arena.empty_solution();
                for _ in 0..depth {
                    state = arena.diff(state);
                }
                black_box(collapse(&mut arena, &[state]))
            })
        });
    }
    group.finish();
}

// ===========================================================================
// Search
// ===========================================================================

fn bench_anneal(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal");
    group.sample_size(10);

    for &n in &[100, 500] {
        let trace = Arc::new(synthetic_trace(n, 3));
        let temperatures = TemperatureSchedule::linear(500.0).temperatures(500);
        let neighbor = MutationNeighbor::new(operators());
        group.bench_with_input(BenchmarkId::from_parameter(n), &trace, |b, trace| {
            b.iter(|| {
                let mut arena = StateArena::new(Arc::clone(trace));
                let root = arena.empty_solution();
                let mut rng = StdRng::seed_from_u64(42);
                let result = AnnealRunner::run(
                    &mut arena,
                    root,
                    &temperatures,
                    &NegatedScore,
                    &neighbor,
                    &mut rng,
                );
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_beam(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_search");
    group.sample_size(10);

    for &size in &[2, 4] {
        let trace = Arc::new(synthetic_trace(200, 5));
        let temperatures = TemperatureSchedule::exponential(500.0, 1.01).temperatures(200);
        let neighbor = MutationNeighbor::new(operators());
        group.bench_with_input(BenchmarkId::from_parameter(size), &trace, |b, trace| {
            b.iter(|| {
                let mut arena = StateArena::new(Arc::clone(trace));
                let root = arena.empty_solution();
                let mut rng = StdRng::seed_from_u64(42);
                let result = AnnealRunner::run_beam(
                    &mut arena,
                    root,
                    &temperatures,
                    &NegatedScore,
                    &neighbor,
                    size,
                    &mut rng,
                );
                black_box(result)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_diff_chain, bench_collapse, bench_anneal, bench_beam);
criterion_main!(benches);
