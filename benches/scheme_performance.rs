//! Performance benchmarks for the finite-difference schemes
//!
//! # What We're Measuring
//!
//! 1. **Grid refinement** of the one-dimensional schemes. The explicit scheme
//!    needs `τ ∝ h²`, so its cost grows as `N³`; the implicit and mixed schemes
//!    keep `τ ∝ h` and grow as `N²`.
//! 2. **Radiative coupling**: one conduction solve against the same solve with
//!    the non-scattering and discrete ordinates RTE solvers.
//! 3. **ADI** on the two-dimensional grid.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench scheme_performance
//!
//! # Only the grid refinement group
//! cargo bench --bench scheme_performance refinement
//! ```

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use pulse_rs::physics::{Dimension, Problem, ProblemKind};
use pulse_rs::rte::{RteConfiguration, RteSolverKind};
use pulse_rs::solver::{CancellationToken, Scheme, SchemeConfiguration, SchemeKind, Solver};

fn problem(kind: ProblemKind, dimension: Dimension) -> Problem {
    let mut problem = Problem::new(kind, dimension);
    problem.curve_mut().set_num_points(100);
    problem
}

fn benchmark_grid_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid refinement");
    let problem = problem(ProblemKind::Linearised, Dimension::One);
    let cancel = CancellationToken::new();

    for kind in [SchemeKind::Explicit, SchemeKind::Implicit, SchemeKind::Mixed] {
        for density in [20, 40, 80] {
            let config = SchemeConfiguration::new(kind).with_grid_density(density);
            group.bench_with_input(BenchmarkId::new(kind.to_string(), density), &config, |b, config| {
                let mut scheme = Scheme::from_configuration(config.clone()).unwrap();
                b.iter(|| scheme.solve(black_box(&problem), &cancel).unwrap());
            });
        }
    }

    group.finish();
}

fn benchmark_radiative_coupling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Radiative coupling");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));
    let cancel = CancellationToken::new();

    let conduction = problem(ProblemKind::Linearised, Dimension::One);
    group.bench_function("Conduction only", |b| {
        let mut scheme = Scheme::from_configuration(SchemeConfiguration::new(SchemeKind::Mixed)).unwrap();
        b.iter(|| scheme.solve(black_box(&conduction), &cancel).unwrap());
    });

    let medium = problem(ProblemKind::ParticipatingMedium, Dimension::One);
    for solver in [RteSolverKind::Nonscattering, RteSolverKind::DiscreteOrdinates] {
        let rte = RteConfiguration { solver, ..Default::default() };
        let config = SchemeConfiguration::new(SchemeKind::MixedCoupled).with_rte(rte);
        group.bench_function(format!("{:?}", solver), |b| {
            let mut scheme = Scheme::from_configuration(config.clone()).unwrap();
            b.iter(|| scheme.solve(black_box(&medium), &cancel).unwrap());
        });
    }

    group.finish();
}

fn benchmark_adi(c: &mut Criterion) {
    let mut group = c.benchmark_group("ADI");
    group.sample_size(20);
    let problem = problem(ProblemKind::Linearised, Dimension::Two);
    let cancel = CancellationToken::new();

    for density in [10, 20, 30] {
        let config = SchemeConfiguration::new(SchemeKind::Adi).with_grid_density(density);
        group.bench_with_input(BenchmarkId::from_parameter(density), &config, |b, config| {
            let mut scheme = Scheme::from_configuration(config.clone()).unwrap();
            b.iter(|| scheme.solve(black_box(&problem), &cancel).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_grid_refinement, benchmark_radiative_coupling, benchmark_adi);
criterion_main!(benches);
