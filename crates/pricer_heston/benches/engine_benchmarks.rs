//! Criterion benchmarks for the Heston Monte Carlo engine.
//!
//! Benchmarks cover:
//! - Correlated variate generation
//! - Variance path simulation
//! - Full block-parallel pricing with varying path counts
//! - Parallel vs sequential block scheduling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_heston::mc::{
    accumulate_log_returns, simulate, simulate_variance, ExecutionMode, LogPriceIntegrator,
    PathMatrix, SimulationConfigBuilder, VariatePair, VarianceScheme,
};
use pricer_heston::rng::PricerRng;

/// Benchmark filling one block's correlated variate pair.
fn bench_variates(c: &mut Criterion) {
    let mut group = c.benchmark_group("variates");
    let n_steps = 200;

    for n_paths in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("fill_pair", n_paths),
            &n_paths,
            |b, &n| {
                let mut rng = PricerRng::from_seed(42);
                let mut pair = VariatePair::zeros(n_steps, n);
                b.iter(|| {
                    pair.fill(&mut rng, -0.8).unwrap();
                    black_box(pair.x2.as_slice()[0])
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the variance recurrence and log-price accumulation on fixed
/// variates.
fn bench_path_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_kernels");
    let (n_steps, n_paths) = (200, 10_000);
    let dt = 1.0 / n_steps as f64;

    let mut rng = PricerRng::from_seed(7);
    let mut pair = VariatePair::zeros(n_steps, n_paths);
    pair.fill(&mut rng, -0.8).unwrap();
    let scheme = VarianceScheme::new(3.0, 0.1, 0.25, dt);
    let integrator = LogPriceIntegrator::new(0.02, dt);
    let mut variance = PathMatrix::zeros(n_steps + 1, n_paths);

    group.bench_function("variance_path", |b| {
        b.iter(|| black_box(simulate_variance(&scheme, 0.08, &pair.x2, &mut variance)))
    });

    simulate_variance(&scheme, 0.08, &pair.x2, &mut variance);
    let mut log_returns = vec![0.0; n_paths];
    group.bench_function("log_returns", |b| {
        b.iter(|| {
            accumulate_log_returns(&integrator, &variance, &pair.x1, &mut log_returns);
            black_box(log_returns[0])
        })
    });

    group.finish();
}

/// Benchmark end-to-end pricing with varying path counts.
fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    group.sample_size(10);

    for n_paths in [1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("sample_20_blocks", n_paths),
            &n_paths,
            |b, &n| {
                let config = SimulationConfigBuilder::sample()
                    .n_paths(n)
                    .seed(42)
                    .build()
                    .unwrap();
                b.iter(|| black_box(simulate(&config).unwrap().aggregate))
            },
        );
    }

    group.finish();
}

/// Benchmark block scheduling modes at equal work.
fn bench_execution_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution_mode");
    group.sample_size(10);

    for (label, mode) in [
        ("parallel", ExecutionMode::Parallel),
        ("sequential", ExecutionMode::Sequential),
    ] {
        let config = SimulationConfigBuilder::sample()
            .n_paths(5_000)
            .n_steps(100)
            .seed(42)
            .execution(mode)
            .build()
            .unwrap();
        group.bench_function(label, |b| {
            b.iter(|| black_box(simulate(&config).unwrap().aggregate))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_variates,
    bench_path_kernels,
    bench_simulate,
    bench_execution_modes,
);

criterion_main!(benches);
