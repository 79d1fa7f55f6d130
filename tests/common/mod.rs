//! Common utilities for integration tests

#![allow(dead_code)]

use pulse_rs::input::ExperimentalData;
use pulse_rs::physics::{Dimension, HeatingCurve, Problem, ProblemKind};
use pulse_rs::solver::{CancellationToken, Scheme, SchemeConfiguration, Solver};

/// Problem with `num_points` curve samples and default properties
pub fn problem(kind: ProblemKind, dimension: Dimension, num_points: usize) -> Problem {
    let mut problem = Problem::new(kind, dimension);
    problem.curve_mut().set_num_points(num_points);
    problem
}

/// Solve `problem` with a scheme built from `config`
pub fn solve(problem: &Problem, config: SchemeConfiguration) -> HeatingCurve {
    let mut scheme = Scheme::from_configuration(config).unwrap();
    scheme.solve(problem, &CancellationToken::new()).unwrap()
}

/// Adiabatic rear-face solution `θ = 1 + 2Σ(−1)ⁿ·exp(−n²π²Fo)` of an instantaneous pulse
pub fn parker(fourier: f64) -> f64 {
    let pi2 = std::f64::consts::PI.powi(2);
    1.0 + 2.0
        * (1..=60)
            .map(|n| {
                let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
                sign * (-((n * n) as f64) * pi2 * fourier).exp()
            })
            .sum::<f64>()
}

/// Measurement sampled from `curve` every `step` seconds, with a pre-pulse
/// baseline from `-pre` to zero
pub fn measurement(curve: &HeatingCurve, baseline: f64, step: f64, pre: f64) -> ExperimentalData {
    let last = curve.last_time().unwrap();
    let first = -(pre / step).round() as i64;
    let count = (last / step).floor() as i64;
    let time: Vec<f64> = (first..=count).map(|i| i as f64 * step).collect();
    let signal = time
        .iter()
        .map(|&t| baseline + if t > 0.0 { curve.temperature_at(t) } else { 0.0 })
        .collect();
    ExperimentalData::new(time, signal).unwrap()
}

/// Render a measurement as a two-column text file, time in milliseconds
pub fn as_text(data: &ExperimentalData) -> String {
    let mut text = String::from("# synthetic laser flash shot\nTime_ms\tSignal\n");
    for (t, s) in data.time().iter().zip(data.signal()) {
        text.push_str(&format!("{:.6}\t{:.9}\n", t * 1e3, s));
    }
    text
}

pub fn relative_error(value: f64, reference: f64) -> f64 {
    ((value - reference) / reference).abs()
}
