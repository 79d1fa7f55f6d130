//! Cross-scheme consistency tests
//!
//! The one-dimensional schemes must agree with the adiabatic series solution and
//! with each other; every scheme honours the sampling contract of the heating
//! curve.

use pulse_rs::physics::{Dimension, NumericPropertyKeyword as K, ProblemKind};
use pulse_rs::rte::{RteConfiguration, RteSolverKind};
use pulse_rs::solver::{SchemeConfiguration, SchemeKind};

mod common;
use common::{parker, problem, solve};

const ONE_DIMENSIONAL: [SchemeKind; 3] = [SchemeKind::Explicit, SchemeKind::Implicit, SchemeKind::Mixed];

#[test]
fn test_one_dimensional_schemes_follow_parker_solution() {
    let mut problem = problem(ProblemKind::Linearised, Dimension::One, 100);
    problem.set_value(K::PulseWidth, 1e-3).unwrap();
    let time_factor = problem.time_factor();

    for kind in ONE_DIMENSIONAL {
        let config = SchemeConfiguration::new(kind).with_grid_density(40);
        let curve = solve(&problem, config);
        let worst = curve
            .times()
            .iter()
            .zip(curve.temperatures())
            .skip(10)
            .map(|(&t, &theta)| (theta / problem.max_temp() - parker(t / time_factor)).abs())
            .fold(0.0, f64::max);
        assert!(worst < 2e-2, "{} scheme deviates by {}", kind, worst);
    }
}

#[test]
fn test_sampling_contract_for_every_scheme() {
    let rte = RteConfiguration { solver: RteSolverKind::Nonscattering, ..Default::default() };
    let cases = [
        (ProblemKind::Linearised, Dimension::One, SchemeConfiguration::new(SchemeKind::Explicit)),
        (ProblemKind::Linearised, Dimension::One, SchemeConfiguration::new(SchemeKind::Implicit)),
        (ProblemKind::Nonlinear, Dimension::One, SchemeConfiguration::new(SchemeKind::Implicit)),
        (ProblemKind::Linearised, Dimension::One, SchemeConfiguration::new(SchemeKind::Mixed)),
        (
            ProblemKind::Linearised,
            Dimension::Two,
            SchemeConfiguration::new(SchemeKind::Adi).with_grid_density(16),
        ),
        (
            ProblemKind::ParticipatingMedium,
            Dimension::One,
            SchemeConfiguration::new(SchemeKind::MixedCoupled).with_rte(rte),
        ),
    ];

    for (kind, dimension, config) in cases {
        let scheme = config.kind;
        let problem = problem(kind, dimension, 40);
        let curve = solve(&problem, config);
        assert_eq!(curve.len(), 40, "{}", scheme);
        assert!(curve.times().windows(2).all(|w| w[1] > w[0]), "{}", scheme);
        assert!(curve.temperatures().iter().all(|t| t.is_finite()), "{}", scheme);
    }
}

#[test]
fn test_zero_energy_stays_at_zero() {
    for kind in ONE_DIMENSIONAL {
        for density in [10, 30] {
            let mut problem = problem(ProblemKind::Linearised, Dimension::One, 30);
            problem.set_value(K::LaserEnergy, 0.0).unwrap();
            let curve = solve(&problem, SchemeConfiguration::new(kind).with_grid_density(density));
            assert!(curve.temperatures().iter().all(|&t| t == 0.0), "{} at N = {}", kind, density);
        }
    }
}

#[test]
fn test_repeated_solves_are_identical() {
    let mut problem = problem(ProblemKind::Linearised, Dimension::One, 80);
    problem.set_value(K::HeatLoss, 0.1).unwrap();

    for kind in ONE_DIMENSIONAL {
        let config = SchemeConfiguration::new(kind);
        let first = solve(&problem, config.clone());
        let second = solve(&problem, config);
        assert_eq!(first, second, "{}", kind);
    }
}

#[test]
fn test_only_explicit_scheme_is_unstable_past_unit_ratio() {
    let problem = problem(ProblemKind::Linearised, Dimension::One, 200);

    let explicit = solve(
        &problem,
        SchemeConfiguration::new(SchemeKind::Explicit)
            .with_grid_density(30)
            .with_tau_factor(1.5),
    );
    assert!(explicit.temperatures().iter().any(|t| !t.is_finite() || t.abs() > 10.0));

    for kind in [SchemeKind::Implicit, SchemeKind::Mixed] {
        let curve = solve(
            &problem,
            SchemeConfiguration::new(kind).with_grid_density(30).with_tau_factor(1.5),
        );
        assert!(
            curve
                .temperatures()
                .iter()
                .all(|&t| t.is_finite() && t >= -0.05 * problem.max_temp()),
            "{}",
            kind
        );
    }
}

#[test]
fn test_rear_face_reaches_maximum_temperature() {
    let mut problem = problem(ProblemKind::Linearised, Dimension::One, 100);
    problem.set_value(K::PulseWidth, 5e-3).unwrap();
    problem.set_value(K::HeatLoss, 0.0).unwrap();

    let curve = solve(
        &problem,
        SchemeConfiguration::new(SchemeKind::Implicit)
            .with_grid_density(30)
            .with_tau_factor(0.25),
    );
    let last = *curve.temperatures().last().unwrap();
    assert!((last - problem.max_temp()).abs() < 1e-9);
}

#[test]
fn test_heat_losses_agree_between_schemes() {
    let mut problem = problem(ProblemKind::Linearised, Dimension::One, 60);
    problem.set_value(K::HeatLoss, 0.3).unwrap();

    let reference = solve(
        &problem,
        SchemeConfiguration::new(SchemeKind::Implicit)
            .with_grid_density(60)
            .with_tau_factor(0.05),
    );
    for kind in ONE_DIMENSIONAL {
        let curve = solve(&problem, SchemeConfiguration::new(kind));
        for (&t, &theta) in curve.times().iter().zip(curve.temperatures()).skip(5) {
            assert!(
                (theta - reference.temperature_at(t)).abs() < 2e-2,
                "{} at t = {}: {} vs {}",
                kind,
                t,
                theta,
                reference.temperature_at(t)
            );
        }
    }
}
