//! Finite-difference schemes for the heat equation
//!
//! This module contains the concrete implementations of the
//! [`Solver`](crate::solver::Solver) trait. Every scheme works on the
//! dimensionless domain `x ∈ [0, 1]` (thickness) and, for the 2D scheme, the
//! radius `r ∈ [0, 1]`:
//!
//! ```text
//! ∂θ/∂t = ∂²θ/∂x²                                   (1D)
//! −∂θ/∂x = Φ(t) − Bi₁·θ        at x = 0
//!  ∂θ/∂x = −Bi₂·θ              at x = 1
//! ```
//!
//! # Available Schemes
//!
//! - **[`ExplicitScheme`]**: forward differences, conditionally stable
//!   (`τ_F ≤ 0.5`), kept for validation
//! - **[`ImplicitScheme`]**: backward differences with a tridiagonal sweep;
//!   also handles the nonlinear radiative heat losses
//! - **[`MixedScheme`]**: weighted (Crank–Nicolson family) template with
//!   `σ = 0.5 − hx²/(12τ)` by default
//! - **[`AdiScheme`]**: alternating directions on the `(r, x)` cylinder with
//!   side heat losses
//! - **[`CoupledScheme`]**: the mixed template iterated against a radiative
//!   transfer solve at every step
//!
//! # Time Sampling
//!
//! All 1D-style schemes share [`march`]: the number of steps between two
//! output points is fixed once, the cancellation token is checked once per
//! output point, and the curve is scaled to the problem's maximum temperature
//! at the end.

mod adi;
mod coupled;
mod explicit;
mod implicit;
mod mixed;

pub use adi::AdiScheme;
pub use coupled::CoupledScheme;
pub use explicit::ExplicitScheme;
pub use implicit::ImplicitScheme;
pub use mixed::MixedScheme;

use std::ops::Range;

use crate::physics::{HeatingCurve, Problem};
use crate::solver::grid::Grid;
use crate::solver::traits::{CancellationToken, SolverError};

/// Offset keeping pulse evaluations off the step boundaries
pub(crate) const EPS: f64 = 1e-7;

/// Offset used by the 2D scheme
pub(crate) const EPS_2D: f64 = 1e-8;

/// Run the output loop of a time-marching scheme
///
/// `advance` receives the steps between two output points (1-based, the step
/// `m` ends at time `m·τ`) and returns the signal to record after the last one.
pub(crate) fn march(
    problem: &Problem,
    grid: &Grid,
    time_limit: f64,
    cancel: &CancellationToken,
    mut advance: impl FnMut(Range<usize>) -> Result<f64, SolverError>,
) -> Result<HeatingCurve, SolverError> {
    let mut curve = problem.curve().blank();
    curve.reset();

    let counts = curve.num_points();
    let interval = grid.time_interval(time_limit, counts);
    let w_factor = interval as f64 * grid.tau() * problem.time_factor();

    for w in 1..counts {
        cancel.check()?;
        let signal = advance((w - 1) * interval + 1..w * interval + 1)?;
        curve.add_point(w as f64 * w_factor, signal);
    }

    curve.scale_to(problem.max_temp());
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Dimension, ProblemKind};
    use approx::assert_relative_eq;

    #[test]
    fn test_march_visits_every_step_once() {
        let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        problem.curve_mut().set_num_points(11);
        let grid = Grid::new(10, 1.0);

        let mut visited = Vec::new();
        let curve = march(&problem, &grid, 1.0, &CancellationToken::new(), |steps| {
            visited.extend(steps.clone());
            Ok(steps.end as f64)
        })
        .unwrap();

        assert_eq!(curve.len(), 11);
        assert_eq!(visited, (1..=100).collect::<Vec<_>>());
        assert!(curve.times().windows(2).all(|w| w[1] > w[0]));
        assert_relative_eq!(curve.temperatures()[10], problem.max_temp(), epsilon = 1e-12);
    }

    #[test]
    fn test_march_stops_on_cancellation() {
        let problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        let token = CancellationToken::new();
        token.cancel();
        let result = march(&problem, &Grid::new(10, 1.0), 1.0, &token, |_| Ok(0.0));
        assert_eq!(result.unwrap_err(), SolverError::Cancelled);
    }

    #[test]
    fn test_march_propagates_step_errors() {
        let problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        let result = march(&problem, &Grid::new(10, 1.0), 1.0, &CancellationToken::new(), |steps| {
            Err(SolverError::NonFinite(steps.start))
        });
        assert_eq!(result.unwrap_err(), SolverError::NonFinite(1));
    }
}
