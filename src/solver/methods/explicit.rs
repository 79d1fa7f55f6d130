//! Explicit (forward-difference) scheme
//!
//! # Mathematical Background
//!
//! The interior nodes are advanced with the forward-time, centred-space template
//!
//! ```text
//! V[i] = U[i] + τ/hx²·(U[i+1] − 2U[i] + U[i−1]),   i = 1..N−1
//! ```
//!
//! and the boundary nodes follow from one-sided differences of the flux
//! conditions, using the freshly computed neighbours:
//!
//! ```text
//! V[0] = (V[1] + hx·Φ(t)) / (1 + Bi₁·hx)
//! V[N] = V[N−1] / (1 + Bi₂·hx)
//! ```
//!
//! # Characteristics
//!
//! - **Order**: first in time, first at the boundaries
//! - **Stability**: conditionally stable, `τ/hx² ≤ 0.5`
//! - **Cost**: no linear system, `O(N)` per step
//!
//! Past the stability limit the solution oscillates and blows up. This is not
//! guarded: the scheme exists to validate the others on small grids.

use crate::physics::{Dimension, HeatingCurve, Problem, ProblemKind};
use crate::solver::grid::Grid;
use crate::solver::methods::{march, EPS};
use crate::solver::pulse::DiscretePulse;
use crate::solver::traits::{unsupported, CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// Forward-difference scheme for the linearised 1D problem
///
/// # Example
///
/// ```rust
/// use pulse_rs::physics::{Dimension, Problem, ProblemKind};
/// use pulse_rs::solver::{CancellationToken, ExplicitScheme, Solver};
///
/// let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
/// problem.curve_mut().set_num_points(50);
///
/// let mut scheme = ExplicitScheme::default();
/// let curve = scheme.solve(&problem, &CancellationToken::new()).unwrap();
/// assert_eq!(curve.len(), 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitScheme {
    config: SchemeConfiguration,
}

impl Default for ExplicitScheme {
    fn default() -> Self {
        Self::new(SchemeConfiguration::new(SchemeKind::Explicit))
    }
}

impl ExplicitScheme {
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

impl Solver for ExplicitScheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        if !self.supports(problem) {
            return Err(unsupported(self.name(), problem));
        }

        // ====== Setup ======

        let grid = Grid::new(self.config.grid_density, self.config.tau_factor);
        let pulse = DiscretePulse::new(problem, &grid);

        let n = grid.density();
        let hx = grid.hx();
        let tau = grid.tau();
        let ratio = tau / (hx * hx);
        let front = 1.0 + problem.heat_loss_front() * hx;
        let rear = 1.0 + problem.heat_loss_rear() * hx;

        let mut u = vec![0.0; n + 1];
        let mut v = vec![0.0; n + 1];

        // ====== Time marching ======

        march(problem, &grid, self.config.time_limit, cancel, |steps| {
            for m in steps {
                for i in 1..n {
                    v[i] = u[i] + ratio * (u[i + 1] - 2.0 * u[i] + u[i - 1]);
                }

                let pls = pulse.evaluate_at((m as f64 - EPS) * tau);
                v[0] = (v[1] + hx * pls) / front;
                v[n] = v[n - 1] / rear;

                std::mem::swap(&mut u, &mut v);
            }
            Ok(u[n])
        })
    }

    fn name(&self) -> &'static str {
        "explicit"
    }

    fn supports(&self, problem: &Problem) -> bool {
        problem.kind() == ProblemKind::Linearised && problem.dimension() == Dimension::One
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NumericPropertyKeyword;
    use approx::assert_relative_eq;

    fn problem(points: usize) -> Problem {
        let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        problem.curve_mut().set_num_points(points);
        problem
    }

    #[test]
    fn test_curve_shape() {
        let problem = problem(100);
        let mut scheme = ExplicitScheme::new(
            SchemeConfiguration::new(SchemeKind::Explicit).with_grid_density(30),
        );
        let curve = scheme.solve(&problem, &CancellationToken::new()).unwrap();

        assert_eq!(curve.len(), 100);
        assert_eq!(curve.temperatures()[0], 0.0);
        // Adiabatic sample: the rear temperature rises monotonically
        assert!(curve.temperatures().windows(2).all(|w| w[1] >= w[0] - 1e-12));
        assert_relative_eq!(*curve.temperatures().last().unwrap(), problem.max_temp(), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_energy_gives_zero_curve() {
        let mut problem = problem(60);
        problem.set_value(NumericPropertyKeyword::LaserEnergy, 0.0).unwrap();
        let curve = ExplicitScheme::default().solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn test_unstable_time_step_diverges() {
        let problem = problem(200);
        let config = SchemeConfiguration::new(SchemeKind::Explicit)
            .with_grid_density(30)
            .with_tau_factor(1.5);
        let curve = ExplicitScheme::new(config).solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().any(|t| !t.is_finite()));
    }

    #[test]
    fn test_heat_losses_lower_the_plateau() {
        let mut lossy = problem(100);
        lossy.set_value(NumericPropertyKeyword::HeatLoss, 0.5).unwrap();
        let config = SchemeConfiguration::new(SchemeKind::Explicit).with_grid_density(30);

        let curve = ExplicitScheme::new(config).solve(&lossy, &CancellationToken::new()).unwrap();
        let peak = curve.apparent_maximum();
        // The signal decays after the peak
        assert!(*curve.temperatures().last().unwrap() < 0.9 * peak);
    }

    #[test]
    fn test_rejects_two_dimensional_problems() {
        let problem = Problem::new(ProblemKind::Linearised, Dimension::Two);
        let err = ExplicitScheme::default().solve(&problem, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, SolverError::Unsupported { scheme: "explicit", .. }));
    }
}
