//! Alternating-direction implicit scheme for the 2D problem
//!
//! # Mathematical Background
//!
//! In a cylinder of thickness `l` and diameter `d`, with the radius scaled by
//! `d/2` and the thickness by `l`, the heat equation reads
//!
//! ```text
//! ∂θ/∂t = Ω²·(1/r)·∂/∂r(r·∂θ/∂r) + ∂²θ/∂y²,   Ω = 2l/d
//! ```
//!
//! Each time step is split into two half-steps (Peaceman–Rachford):
//!
//! 1. implicit in `r`, explicit in `y`: one sweep per axial column
//! 2. implicit in `y`, explicit in `r`: one sweep per radial row
//!
//! The explicit terms need the field one node outside the domain. Both half-steps
//! therefore read an extended copy of the field padded with ghost nodes built
//! from the flux conditions (front pulse and `Bi₁`, rear `Bi₂`, side `Bi₃`), so
//! the inner loops carry no boundary branches.
//!
//! The recorded signal is the rear-face temperature averaged over the
//! pyrometer's field of view `[d_fov,in, d_fov]`.
//!
//! # Characteristics
//!
//! - **Order**: `O(τ² + hx² + hy²)`
//! - **Stability**: unconditional
//! - **Cost**: `2(N + 1)` tridiagonal sweeps per step

use nalgebra::DMatrix;

use crate::physics::{Dimension, HeatingCurve, Problem, ProblemKind};
use crate::solver::grid::Grid2D;
use crate::solver::methods::{march, EPS_2D};
use crate::solver::pulse::DiscretePulse2D;
use crate::solver::sweep::eliminate_variable;
use crate::solver::traits::{unsupported, CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// ADI scheme for the linearised 2D problem
#[derive(Debug, Clone, PartialEq)]
pub struct AdiScheme {
    config: SchemeConfiguration,
}

impl Default for AdiScheme {
    fn default() -> Self {
        Self::new(SchemeConfiguration::new(SchemeKind::Adi))
    }
}

impl AdiScheme {
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

/// Rear-face nodes inside the field of view, `first..=last`
fn field_of_view(problem: &Problem, grid: &Grid2D) -> (usize, usize) {
    let n = grid.density();
    let last = ((problem.fov_outer() / problem.diameter() / grid.hx()) as usize).min(n);
    let first = ((problem.fov_inner() / problem.diameter() / grid.hx()) as usize).min(last);
    (first, last)
}

impl Solver for AdiScheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        if !self.supports(problem) {
            return Err(unsupported(self.name(), problem));
        }

        // ====== Setup ======

        let grid = Grid2D::new(self.config.grid_density, self.config.tau_factor);
        let pulse = DiscretePulse2D::new(problem, &grid);

        let n = grid.density();
        let hx = grid.hx();
        let hy = grid.hy();
        let tau = grid.tau();
        let hx2 = hx * hx;
        let hy2 = hy * hy;

        let bi1 = problem.heat_loss_front();
        let bi2 = problem.heat_loss_rear();
        let bi3 = problem.heat_loss_side();

        let omega = 2.0 * problem.thickness() / problem.diameter();
        let omega2 = omega * omega;

        // Radial operator: a1[i]·θ[i−1] − b1·θ[i] + c1[i]·θ[i+1]
        let a1: Vec<f64> = (0..=n)
            .map(|i| if i == 0 { 0.0 } else { omega2 * (i as f64 - 0.5) / hx2 / i as f64 })
            .collect();
        let c1: Vec<f64> = (0..=n)
            .map(|i| if i == 0 { 0.0 } else { omega2 * (i as f64 + 0.5) / hx2 / i as f64 })
            .collect();
        let b1 = 2.0 / tau + 2.0 * omega2 / hx2;

        // Axial operator
        let a2 = 1.0 / hy2;
        let b2 = 2.0 / hy2 + 2.0 / tau;

        // Closures on the axis (radial sweep) and at the front face (axial sweep)
        let axis_alpha = 1.0 / (1.0 + hx2 / (omega2 * tau));
        let axis_beta = 0.5 * tau / (1.0 + omega2 * tau / hx2);
        let front_alpha = 1.0 / (1.0 + bi1 * hy + hy2 / tau);
        let front_beta = 1.0 / ((1.0 + hy * bi1) * tau + hy2);
        let radial_weight = 0.5 * hy2 * tau * omega2 / hx2;
        let front_radial = radial_weight * front_beta;

        let (first, last) = field_of_view(problem, &grid);

        let mut u1 = DMatrix::<f64>::zeros(n + 1, n + 1);
        let mut u2 = DMatrix::<f64>::zeros(n + 1, n + 1);
        let mut u1e = DMatrix::<f64>::zeros(n + 3, n + 3);
        let mut u2e = DMatrix::<f64>::zeros(n + 3, n + 3);
        let mut alpha = vec![0.0; n + 1];
        let mut beta = vec![0.0; n + 1];

        // ====== Time marching ======

        march(problem, grid.base(), self.config.time_limit, cancel, |steps| {
            for step in steps {
                let m = (step - 1) as f64;

                // ====== Extended field: front and rear ghost nodes ======

                for i in 0..=n {
                    for j in 0..=n {
                        u1e[(i + 1, j + 1)] = u1[(i, j)];
                    }
                    let pls = pulse.evaluate_at((m + EPS_2D) * tau, i as f64 * hx);
                    u1e[(i + 1, 0)] = u1[(i, 1)] + 2.0 * hy * pls - 2.0 * hy * bi1 * u1[(i, 0)];
                    u1e[(i + 1, n + 2)] = u1[(i, n - 1)] - 2.0 * hy * bi2 * u1[(i, n)];
                }

                // ====== Half-step 1: implicit along the radius ======

                alpha[1] = axis_alpha;
                for j in 0..=n {
                    let axial = |row: usize| {
                        (u1e[(row, j + 2)] - 2.0 * u1e[(row, j + 1)] + u1e[(row, j)]) / hy2
                    };

                    beta[1] = axis_beta * (2.0 * u1e[(1, j + 1)] / tau + axial(1));
                    eliminate_variable(
                        &mut alpha,
                        &mut beta,
                        n,
                        |i| (a1[i], b1, c1[i]),
                        |i| 2.0 * u1e[(i + 1, j + 1)] / tau + axial(i + 1),
                    );

                    u2[(n, j)] = (omega2 * tau * beta[n]
                        + hx2 * u1e[(n + 1, j + 1)]
                        + 0.5 * hx2 * tau * axial(n + 1))
                        / ((1.0 - alpha[n] + hx * omega * bi3) * omega2 * tau + hx2);
                    for i in (0..n).rev() {
                        u2[(i, j)] = alpha[i + 1] * u2[(i + 1, j)] + beta[i + 1];
                    }
                }

                // ====== Extended field: side ghost nodes ======

                for j in 0..=n {
                    for i in 0..=n {
                        u2e[(i + 1, j + 1)] = u2[(i, j)];
                    }
                    u2e[(n + 2, j + 1)] = u2[(n - 1, j)] - 2.0 * hx * omega * bi3 * u2[(n, j)];
                }

                // ====== Half-step 2: implicit along the thickness ======

                alpha[1] = front_alpha;
                for i in 1..=n {
                    let k = 1.0 / (2.0 * i as f64);
                    let radial = |col: usize| {
                        (1.0 + k) * u2e[(i + 2, col)] - 2.0 * u2e[(i + 1, col)] + (1.0 - k) * u2e[(i, col)]
                    };

                    let pls = pulse.evaluate_at((m + 1.0 + EPS_2D) * tau, i as f64 * hx);
                    beta[1] = (tau * hy * pls + hy2 * u2e[(i + 1, 1)]) * front_beta + front_radial * radial(1);
                    eliminate_variable(
                        &mut alpha,
                        &mut beta,
                        n,
                        |_| (a2, b2, a2),
                        |j| 2.0 / tau * u2e[(i + 1, j + 1)] + omega2 / hx2 * radial(j + 1),
                    );

                    u1[(i, n)] = (tau * beta[n] + hy2 * u2e[(i + 1, n + 1)] + radial_weight * radial(n + 1))
                        / ((1.0 - alpha[n] + hy * bi2) * tau + hy2);
                    for j in (0..n).rev() {
                        u1[(i, j)] = alpha[j + 1] * u1[(i, j + 1)] + beta[j + 1];
                    }
                }

                // Axis: the radial operator degenerates to 2Ω²·(θ[1] − θ[0])/hx²
                let pls = pulse.evaluate_at((m + 1.0 + EPS_2D) * tau, 0.0);
                beta[1] = (tau * hy * pls + hy2 * u2e[(1, 1)]) * front_beta
                    + 2.0 * front_radial * (u2e[(2, 1)] - u2e[(1, 1)]);
                for j in 1..n {
                    let rhs = 2.0 / tau * u2e[(1, j + 1)]
                        + 2.0 * omega2 / hx2 * (u2e[(2, j + 1)] - u2e[(1, j + 1)]);
                    beta[j + 1] = (rhs + a2 * beta[j]) / (b2 - a2 * alpha[j]);
                }
                u1[(0, n)] = (tau * beta[n]
                    + hy2 * u2e[(1, n + 1)]
                    + 2.0 * radial_weight * (u2e[(2, n + 1)] - u2e[(1, n + 1)]))
                    / ((1.0 - alpha[n] + hy * bi2) * tau + hy2);
                for j in (0..n).rev() {
                    u1[(0, j)] = alpha[j + 1] * u1[(0, j + 1)] + beta[j + 1];
                }
            }

            let sum: f64 = (first..=last).map(|i| u1[(i, n)]).sum();
            Ok(sum / (last - first + 1) as f64)
        })
    }

    fn name(&self) -> &'static str {
        "ADI"
    }

    fn supports(&self, problem: &Problem) -> bool {
        problem.kind() == ProblemKind::Linearised && problem.dimension() == Dimension::Two
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NumericPropertyKeyword as K;
    use crate::solver::methods::ImplicitScheme;

    fn problem(points: usize) -> Problem {
        let mut problem = Problem::new(ProblemKind::Linearised, Dimension::Two);
        problem.curve_mut().set_num_points(points);
        problem.set_value(K::Diameter, 1e-2).unwrap();
        problem.set_value(K::SpotDiameter, 1e-2).unwrap();
        problem.set_value(K::FovOuter, 1e-2).unwrap();
        problem
    }

    fn scheme() -> AdiScheme {
        AdiScheme::new(SchemeConfiguration::new(SchemeKind::Adi).with_grid_density(20))
    }

    #[test]
    fn test_field_of_view_indices() {
        let mut problem = problem(10);
        let grid = Grid2D::new(20, 1.0);
        assert_eq!(field_of_view(&problem, &grid), (0, 20));
        problem.set_value(K::FovOuter, 5e-3).unwrap();
        problem.set_value(K::FovInner, 2e-3).unwrap();
        assert_eq!(field_of_view(&problem, &grid), (4, 10));
    }

    #[test]
    fn test_uniform_heating_matches_one_dimensional_solution() {
        let problem = problem(50);
        let token = CancellationToken::new();
        let curve = scheme().solve(&problem, &token).unwrap();

        let mut flat = Problem::new(ProblemKind::Linearised, Dimension::One);
        flat.curve_mut().set_num_points(50);
        let reference = ImplicitScheme::default().solve(&flat, &token).unwrap();

        assert_eq!(curve.len(), 50);
        for (x, y) in curve.temperatures().iter().zip(reference.temperatures()) {
            assert!((x - y).abs() < 2e-2, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_side_losses_cool_the_rear_face() {
        let mut adiabatic = problem(50);
        adiabatic.set_value(K::Thickness, 5e-3).unwrap();
        let mut lossy = adiabatic.clone();
        lossy.set_value(K::HeatLossSide, 0.5).unwrap();

        let token = CancellationToken::new();
        let a = scheme().solve(&adiabatic, &token).unwrap();
        let b = scheme().solve(&lossy, &token).unwrap();
        let tail = |c: &HeatingCurve| c.temperatures()[c.len() - 1] / c.apparent_maximum();
        assert!(tail(&a) > 0.99);
        assert!(tail(&b) < 0.8);
    }

    #[test]
    fn test_small_spot_overshoots_in_the_centre() {
        let mut problem = problem(50);
        problem.set_value(K::SpotDiameter, 5e-3).unwrap();
        problem.set_value(K::FovOuter, 4e-3).unwrap();
        let curve = scheme().solve(&problem, &CancellationToken::new()).unwrap();
        // Heat spreads sideways after the peak
        assert!(curve.temperatures()[curve.len() - 1] < 0.9 * curve.apparent_maximum());
    }

    #[test]
    fn test_zero_energy_gives_zero_curve() {
        let mut problem = problem(20);
        problem.set_value(K::LaserEnergy, 0.0).unwrap();
        let curve = scheme().solve(&problem, &CancellationToken::new()).unwrap();
        assert!(curve.temperatures().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn test_requires_two_dimensions() {
        let flat = Problem::new(ProblemKind::Linearised, Dimension::One);
        assert!(!scheme().supports(&flat));
        assert!(scheme().solve(&flat, &CancellationToken::new()).is_err());
    }
}
