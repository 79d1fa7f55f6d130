//! Weighted (Crank–Nicolson family) scheme
//!
//! # Mathematical Background
//!
//! The spatial operator is split between the two time levels with the weight `σ`:
//!
//! ```text
//! (V[i] − U[i])/τ = σ·Λ V[i] + (1 − σ)·Λ U[i],   Λ y[i] = (y[i+1] − 2y[i] + y[i−1])/hx²
//! ```
//!
//! `σ = 1` recovers the implicit scheme and `σ = 1/2` is Crank–Nicolson. The
//! default `σ = 1/2 − hx²/(12τ)` cancels the leading truncation term and gives
//! fourth order in space. A non-positive value falls back to `1/2`.
//!
//! # Characteristics
//!
//! - **Order**: `O(τ² + hx⁴)` with the automatic weight
//! - **Stability**: unconditional for `σ ≥ 1/2 − hx²/(4τ)`
//! - **Cost**: one tridiagonal sweep per step

use crate::physics::{Dimension, HeatingCurve, Problem, ProblemKind};
use crate::solver::grid::Grid;
use crate::solver::methods::{march, EPS};
use crate::solver::pulse::DiscretePulse;
use crate::solver::sweep::Sweep;
use crate::solver::traits::{unsupported, CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// Configured weight, or `1/2 − hx²/(12τ)` when none is set
pub(crate) fn scheme_weight(configured: Option<f64>, grid: &Grid) -> f64 {
    configured.unwrap_or_else(|| {
        let sigma = 0.5 - grid.hx() * grid.hx() / (12.0 * grid.tau());
        if sigma > 0.0 { sigma } else { 0.5 }
    })
}

/// Weighted scheme for the linearised 1D problem
#[derive(Debug, Clone, PartialEq)]
pub struct MixedScheme {
    config: SchemeConfiguration,
}

impl Default for MixedScheme {
    fn default() -> Self {
        Self::new(SchemeConfiguration::new(SchemeKind::Mixed))
    }
}

impl MixedScheme {
    pub fn new(config: SchemeConfiguration) -> Self {
        Self { config }
    }

    pub fn configuration(&self) -> &SchemeConfiguration {
        &self.config
    }

    pub fn configuration_mut(&mut self) -> &mut SchemeConfiguration {
        &mut self.config
    }
}

impl Solver for MixedScheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        if !self.supports(problem) {
            return Err(unsupported(self.name(), problem));
        }

        // ====== Setup ======

        let grid = Grid::new(self.config.grid_density, self.config.tau_factor);
        let pulse = DiscretePulse::new(problem, &grid);
        let sigma = scheme_weight(self.config.weight, &grid);

        let n = grid.density();
        let hx = grid.hx();
        let tau = grid.tau();
        let hx2 = hx * hx;
        let hx2_2tau = hx2 / (2.0 * tau);
        let one_minus_sigma = 1.0 - sigma;
        let front = 1.0 + hx * problem.heat_loss_front();
        let rear = 1.0 + hx * problem.heat_loss_rear();

        let a = sigma / hx2;
        let b = 1.0 / tau + 2.0 * sigma / hx2;
        let alpha1 = 1.0 / (hx2 / (2.0 * tau * sigma) + front);
        let beta1_factor = 1.0 / (hx2 + 2.0 * tau * sigma * front);
        let mut sweep = Sweep::new(n, a, b, a, alpha1);

        let mut u = vec![0.0; n + 1];
        let mut v = vec![0.0; n + 1];

        // ====== Time marching ======

        march(problem, &grid, self.config.time_limit, cancel, |steps| {
            for m in steps {
                let t = m as f64;
                let pls = pulse.evaluate_at((t - 1.0 + EPS) * tau) * one_minus_sigma
                    + pulse.evaluate_at((t - EPS) * tau) * sigma;

                let beta1 = (2.0 * tau * hx * pls
                    + hx2 * u[0]
                    + 2.0 * tau * one_minus_sigma * (u[1] - u[0] * front))
                    * beta1_factor;
                sweep.eliminate(beta1, |i| {
                    u[i] / tau + one_minus_sigma * (u[i + 1] - 2.0 * u[i] + u[i - 1]) / hx2
                });

                v[n] = (sigma * sweep.beta(n)
                    + hx2_2tau * u[n]
                    + one_minus_sigma * (u[n - 1] - u[n] * rear))
                    / (hx2_2tau + sigma * (rear - sweep.alpha(n)));
                sweep.substitute(&mut v);

                u.copy_from_slice(&v);
            }
            Ok(u[n])
        })
    }

    fn name(&self) -> &'static str {
        "mixed"
    }

    fn supports(&self, problem: &Problem) -> bool {
        problem.kind() == ProblemKind::Linearised && problem.dimension() == Dimension::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NumericPropertyKeyword;
    use crate::solver::methods::ImplicitScheme;
    use approx::assert_relative_eq;

    fn problem(points: usize) -> Problem {
        let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        problem.curve_mut().set_num_points(points);
        problem
    }

    #[test]
    fn test_automatic_weight() {
        let grid = Grid::new(30, 1.0);
        assert_relative_eq!(scheme_weight(None, &grid), 0.5 - 1.0 / 12.0, epsilon = 1e-12);
        // τ_F < 1/6 would give a negative weight
        assert_eq!(scheme_weight(None, &Grid::new(30, 0.1)), 0.5);
        assert_eq!(scheme_weight(Some(0.7), &grid), 0.7);
    }

    #[test]
    fn test_unit_weight_is_implicit() {
        let mut problem = problem(80);
        problem.set_value(NumericPropertyKeyword::HeatLossFront, 0.1).unwrap();
        problem.set_value(NumericPropertyKeyword::HeatLossRear, 0.3).unwrap();
        let config = SchemeConfiguration::new(SchemeKind::Mixed)
            .with_tau_factor(0.5)
            .with_weight(1.0);
        let implicit = SchemeConfiguration { kind: SchemeKind::Implicit, weight: None, ..config.clone() };

        let token = CancellationToken::new();
        let mixed = MixedScheme::new(config).solve(&problem, &token).unwrap();
        let reference = ImplicitScheme::new(implicit).solve(&problem, &token).unwrap();
        for (x, y) in mixed.temperatures().iter().zip(reference.temperatures()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_agrees_with_fine_implicit_solution() {
        let problem = problem(100);
        let token = CancellationToken::new();
        let mixed = MixedScheme::default().solve(&problem, &token).unwrap();

        let fine = SchemeConfiguration::new(SchemeKind::Implicit)
            .with_grid_density(80)
            .with_tau_factor(0.1);
        let reference = ImplicitScheme::new(fine).solve(&problem, &token).unwrap();

        for (&t, &theta) in mixed.times().iter().zip(mixed.temperatures()).skip(5) {
            assert!((theta - reference.temperature_at(t)).abs() < 1e-2);
        }
    }

    #[test]
    fn test_zero_flux_stays_zero() {
        let mut problem = problem(50);
        problem.set_value(NumericPropertyKeyword::LaserEnergy, 0.0).unwrap();
        let curve = MixedScheme::default().solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().all(|&t| t == 0.0));
    }
}
