//! Implicit (backward-difference) scheme
//!
//! # Mathematical Background
//!
//! The heat equation is discretised at the new time level:
//!
//! ```text
//! −a·V[i−1] + b·V[i] − c·V[i+1] = U[i]/τ,   a = c = 1/hx², b = 1/τ + 2/hx²
//! ```
//!
//! The boundary conditions are approximated to second order by eliminating the
//! ghost node with the heat equation itself, which gives the sweep closures
//!
//! ```text
//! α₁ = 1 / (1 + hx·Bi₁ + hx²/(2τ))
//! β₁ = (hx·Φ + hx²/(2τ)·U[0]) · α₁
//! V[N] = (β[N] + hx²/(2τ)·U[N]) / (1 + hx·Bi₂ + hx²/(2τ) − α[N])
//! ```
//!
//! # Nonlinear Heat Losses
//!
//! For a [`ProblemKind::Nonlinear`] problem the boundary losses are radiative,
//! `f(θ) = Bi·((1 + δθ)⁴ − 1)/(4δ)`, with `δ = ΔT_max/T₀`. They are linearised
//! around the latest iterate `θ*`:
//!
//! ```text
//! f(θ) ≈ f(θ*) + f'(θ*)·(θ − θ*),   f'(θ) = Bi·(1 + δθ)³
//! ```
//!
//! and the step is repeated until both boundary temperatures change by less
//! than the nonlinear precision.
//!
//! # Characteristics
//!
//! - **Order**: first in time, second in space
//! - **Stability**: unconditional
//! - **Cost**: one tridiagonal sweep per step (per iteration when nonlinear)

use crate::physics::{Dimension, HeatingCurve, Problem, ProblemKind};
use crate::solver::grid::Grid;
use crate::solver::methods::{march, EPS};
use crate::solver::pulse::DiscretePulse;
use crate::solver::sweep::Sweep;
use crate::solver::traits::{unsupported, CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// Iterations allowed per step before the nonlinear solve gives up
const MAX_NONLINEAR_ITERATIONS: usize = 100;

/// Radiative heat loss `Bi·((1 + δθ)⁴ − 1)/(4δ)` and its derivative
#[derive(Debug, Clone, Copy)]
struct RadiativeLoss {
    biot: f64,
    delta: f64,
}

impl RadiativeLoss {
    fn value(&self, theta: f64) -> f64 {
        self.biot * ((1.0 + self.delta * theta).powi(4) - 1.0) / (4.0 * self.delta)
    }

    fn derivative(&self, theta: f64) -> f64 {
        self.biot * (1.0 + self.delta * theta).powi(3)
    }
}

/// Backward-difference scheme for the 1D problem, linear or nonlinear losses
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitScheme {
    config: SchemeConfiguration,
}

impl Default for ImplicitScheme {
    fn default() -> Self {
        Self::new(SchemeConfiguration::new(SchemeKind::Implicit))
    }
}

impl ImplicitScheme {
    pub fn new(config: SchemeConfiguration) -> Self {
        Self { config }
    }

    pub fn configuration(&self) -> &SchemeConfiguration {
        &self.config
    }

    pub fn configuration_mut(&mut self) -> &mut SchemeConfiguration {
        &mut self.config
    }

    fn solve_linear(
        &self,
        problem: &Problem,
        grid: &Grid,
        cancel: &CancellationToken,
    ) -> Result<HeatingCurve, SolverError> {
        let pulse = DiscretePulse::new(problem, grid);

        let n = grid.density();
        let hx = grid.hx();
        let tau = grid.tau();
        let hx2 = hx * hx;
        let hx2_2tau = hx2 / (2.0 * tau);
        let bi1 = problem.heat_loss_front();
        let bi2 = problem.heat_loss_rear();

        let alpha1 = 1.0 / (1.0 + hx * bi1 + hx2_2tau);
        let mut sweep = Sweep::new(n, 1.0 / hx2, 1.0 / tau + 2.0 / hx2, 1.0 / hx2, alpha1);

        let mut u = vec![0.0; n + 1];
        let mut v = vec![0.0; n + 1];

        march(problem, grid, self.config.time_limit, cancel, |steps| {
            for m in steps {
                let pls = pulse.evaluate_at((m as f64 - EPS) * tau);
                let beta1 = (hx * pls + hx2_2tau * u[0]) * alpha1;
                sweep.eliminate(beta1, |i| u[i] / tau);

                v[n] = (sweep.beta(n) + hx2_2tau * u[n]) / (1.0 + hx * bi2 + hx2_2tau - sweep.alpha(n));
                sweep.substitute(&mut v);

                u.copy_from_slice(&v);
            }
            Ok(u[n])
        })
    }

    fn solve_nonlinear(
        &self,
        problem: &Problem,
        grid: &Grid,
        cancel: &CancellationToken,
    ) -> Result<HeatingCurve, SolverError> {
        let pulse = DiscretePulse::new(problem, grid);

        let n = grid.density();
        let hx = grid.hx();
        let tau = grid.tau();
        let hx2 = hx * hx;
        let hx2_2tau = hx2 / (2.0 * tau);
        let delta = problem.nonlinearity();
        let front = RadiativeLoss { biot: problem.heat_loss_front(), delta };
        let rear = RadiativeLoss { biot: problem.heat_loss_rear(), delta };
        let precision = self.config.nonlinear_precision;

        let mut sweep = Sweep::new(n, 1.0 / hx2, 1.0 / tau + 2.0 / hx2, 1.0 / hx2, 1.0);

        let mut u = vec![0.0; n + 1];
        let mut v = vec![0.0; n + 1];

        march(problem, grid, self.config.time_limit, cancel, |steps| {
            for m in steps {
                let pls = pulse.evaluate_at((m as f64 - EPS) * tau);
                v.copy_from_slice(&u);

                let mut converged = false;
                for _ in 0..MAX_NONLINEAR_ITERATIONS {
                    let (theta0, theta_n) = (v[0], v[n]);

                    // ====== Linearised front closure ======
                    let f1 = front.value(theta0);
                    let df1 = front.derivative(theta0);
                    let alpha1 = 1.0 / (1.0 + hx * df1 + hx2_2tau);
                    sweep.set_alpha1(alpha1);
                    let beta1 = (hx * pls + hx2_2tau * u[0] - hx * (f1 - df1 * theta0)) * alpha1;
                    sweep.eliminate(beta1, |i| u[i] / tau);

                    // ====== Linearised rear closure ======
                    let f2 = rear.value(theta_n);
                    let df2 = rear.derivative(theta_n);
                    v[n] = (sweep.beta(n) + hx2_2tau * u[n] - hx * (f2 - df2 * theta_n))
                        / (1.0 + hx * df2 + hx2_2tau - sweep.alpha(n));
                    sweep.substitute(&mut v);

                    if !(v[0].is_finite() && v[n].is_finite()) {
                        return Err(SolverError::NonFinite(if v[0].is_finite() { n } else { 0 }));
                    }
                    if (v[0] - theta0).abs() < precision && (v[n] - theta_n).abs() < precision {
                        converged = true;
                        break;
                    }
                }
                if !converged {
                    return Err(SolverError::NotConverged { step: m });
                }

                u.copy_from_slice(&v);
            }
            Ok(u[n])
        })
    }
}

impl Solver for ImplicitScheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        if !self.supports(problem) {
            return Err(unsupported(self.name(), problem));
        }
        let grid = Grid::new(self.config.grid_density, self.config.tau_factor);
        match problem.kind() {
            ProblemKind::Nonlinear => self.solve_nonlinear(problem, &grid, cancel),
            _ => self.solve_linear(problem, &grid, cancel),
        }
    }

    fn name(&self) -> &'static str {
        "implicit"
    }

    fn supports(&self, problem: &Problem) -> bool {
        matches!(problem.kind(), ProblemKind::Linearised | ProblemKind::Nonlinear)
            && problem.dimension() == Dimension::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NumericPropertyKeyword;
    use approx::assert_relative_eq;

    fn problem(kind: ProblemKind, points: usize) -> Problem {
        let mut problem = Problem::new(kind, Dimension::One);
        problem.curve_mut().set_num_points(points);
        problem
    }

    /// Adiabatic solution `θ(1, t) = 1 + 2Σ(−1)ⁿ·exp(−n²π²t)` for an instantaneous pulse
    fn parker(t: f64) -> f64 {
        let pi2 = std::f64::consts::PI.powi(2);
        1.0 + 2.0 * (1..=50)
            .map(|n| {
                let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
                sign * (-((n * n) as f64) * pi2 * t).exp()
            })
            .sum::<f64>()
    }

    #[test]
    fn test_last_point_equals_max_temperature() {
        let problem = problem(ProblemKind::Linearised, 200);
        let curve = ImplicitScheme::default().solve(&problem, &CancellationToken::new()).unwrap();
        assert_eq!(curve.len(), 200);
        assert_relative_eq!(*curve.temperatures().last().unwrap(), problem.max_temp(), epsilon = 1e-9);
    }

    #[test]
    fn test_matches_adiabatic_solution() {
        let mut problem = problem(ProblemKind::Linearised, 100);
        // Short pulse: 0.1% of l²/a
        problem.set_value(NumericPropertyKeyword::PulseWidth, 1e-3).unwrap();
        let config = SchemeConfiguration::new(SchemeKind::Implicit).with_grid_density(60);
        let curve = ImplicitScheme::new(config).solve(&problem, &CancellationToken::new()).unwrap();

        for (&t, &theta) in curve.times().iter().zip(curve.temperatures()).skip(10) {
            assert!((theta - parker(t)).abs() < 2e-2, "t = {}: {} vs {}", t, theta, parker(t));
        }
    }

    #[test]
    fn test_stable_beyond_explicit_limit() {
        let problem = problem(ProblemKind::Linearised, 200);
        let config = SchemeConfiguration::new(SchemeKind::Implicit).with_tau_factor(1.5);
        let curve = ImplicitScheme::new(config).solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().all(|t| t.is_finite() && *t >= 0.0));
    }

    #[test]
    fn test_nonlinear_reduces_to_linear_for_small_delta() {
        let mut linear = problem(ProblemKind::Linearised, 100);
        let mut nonlinear = problem(ProblemKind::Nonlinear, 100);
        for p in [&mut linear, &mut nonlinear] {
            p.set_value(NumericPropertyKeyword::HeatLoss, 0.2).unwrap();
            p.set_value(NumericPropertyKeyword::MaxTemp, 1e-3).unwrap();
        }
        let token = CancellationToken::new();
        let a = ImplicitScheme::default().solve(&linear, &token).unwrap();
        let b = ImplicitScheme::default().solve(&nonlinear, &token).unwrap();
        for (x, y) in a.temperatures().iter().zip(b.temperatures()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_nonlinear_losses_grow_with_temperature() {
        let mut cold = problem(ProblemKind::Nonlinear, 100);
        let mut hot = problem(ProblemKind::Nonlinear, 100);
        for p in [&mut cold, &mut hot] {
            p.set_value(NumericPropertyKeyword::HeatLoss, 0.2).unwrap();
        }
        cold.set_value(NumericPropertyKeyword::MaxTemp, 1.0).unwrap();
        hot.set_value(NumericPropertyKeyword::MaxTemp, 200.0).unwrap();

        let token = CancellationToken::new();
        let cold = ImplicitScheme::default().solve(&cold, &token).unwrap();
        let hot = ImplicitScheme::default().solve(&hot, &token).unwrap();

        // Normalised by the peak, the hotter sample cools faster
        let last = |c: &HeatingCurve| c.temperatures().last().copied().unwrap_or_default() / c.apparent_maximum();
        assert!(last(&hot) < last(&cold));
    }

    #[test]
    fn test_nonlinear_needs_iterations() {
        let mut problem = problem(ProblemKind::Nonlinear, 20);
        problem.set_value(NumericPropertyKeyword::HeatLoss, 1.0).unwrap();
        problem.set_value(NumericPropertyKeyword::MaxTemp, 500.0).unwrap();
        let config = SchemeConfiguration::new(SchemeKind::Implicit).with_nonlinear_precision(1e-9);
        let curve = ImplicitScheme::new(config).solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().all(|t| t.is_finite()));
    }

    #[test]
    fn test_radiative_loss_derivative() {
        let loss = RadiativeLoss { biot: 0.3, delta: 0.5 };
        let h = 1e-6;
        let numeric = (loss.value(0.4 + h) - loss.value(0.4 - h)) / (2.0 * h);
        assert_relative_eq!(loss.derivative(0.4), numeric, epsilon = 1e-8);
        assert_relative_eq!(loss.value(0.0), 0.0);
    }
}
