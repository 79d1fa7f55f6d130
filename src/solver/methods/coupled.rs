//! Weighted scheme coupled with radiative transfer
//!
//! # Mathematical Background
//!
//! In a semi-transparent sample the energy equation gains the divergence of the
//! radiative flux `q` as a heat source, and both faces exchange radiation:
//!
//! ```text
//! ∂θ/∂t = ∂²θ/∂x² + (τ₀/Np)·(−∂q/∂τ)
//! −∂θ/∂x = Φ(t) − Bi₁·θ − q(0)/Np          at x = 0
//!  ∂θ/∂x = −Bi₂·θ + q(1)/Np                at x = 1
//! ```
//!
//! The source is taken from a [`RadiativeTransfer`] solve of the current
//! profile and averaged over the fourth-order compact stencil
//! `5/6·φ[i] + 1/12·(φ[i−1] + φ[i+1])`. Because the source depends on the new
//! temperatures, each step repeats {sweep, radiative solve} until both face
//! temperatures move by less than the nonlinear precision.
//!
//! # Time Stepping
//!
//! While the pulse is on, the time step is refined by `pulse_refinement`. The
//! rest of the time limit is then covered with the configured step, the number
//! of steps per output point chosen from the remaining time so that the last
//! sample does not overrun the limit.
//!
//! # Failure
//!
//! A radiative solve that does not end in [`RteStatus::Normal`] aborts the whole
//! solve with [`SolverError::RadiativeTransfer`].

use log::{debug, warn};

use crate::physics::{HeatingCurve, Problem, ProblemKind};
use crate::rte::{RadiativeTransfer, RteStatus};
use crate::solver::grid::Grid;
use crate::solver::methods::mixed::scheme_weight;
use crate::solver::methods::EPS;
use crate::solver::pulse::DiscretePulse;
use crate::solver::sweep::Sweep;
use crate::solver::traits::{unsupported, CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// Coupling iterations allowed per step
const MAX_COUPLING_ITERATIONS: usize = 100;

/// Step-size dependent constants of the coupled template
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    sigma: f64,
    hx: f64,
    tau: f64,
    hx2: f64,
    hx2_2tau: f64,
    two_tau_hx: f64,
    one_minus_sigma: f64,
    beta1_factor: f64,
    sigma_np: f64,
    one_minus_sigma_np: f64,
    hx_np: f64,
    tau0_np: f64,
    /// `1 + hx·Bi₁`
    front: f64,
    /// `hx·Bi₂`
    rear: f64,
}

impl Coefficients {
    fn new(problem: &Problem, grid: &Grid, weight: Option<f64>) -> Self {
        let sigma = scheme_weight(weight, grid);
        let hx = grid.hx();
        let tau = grid.tau();
        let hx2 = hx * hx;
        let np = problem.planck_number();
        let front = 1.0 + hx * problem.heat_loss_front();
        Self {
            sigma,
            hx,
            tau,
            hx2,
            hx2_2tau: hx2 / (2.0 * tau),
            two_tau_hx: 2.0 * tau * hx,
            one_minus_sigma: 1.0 - sigma,
            beta1_factor: 1.0 / (hx2 + 2.0 * tau * sigma * front),
            sigma_np: sigma / np,
            one_minus_sigma_np: (1.0 - sigma) / np,
            hx_np: hx / np,
            tau0_np: problem.optical_thickness() / np,
            front,
            rear: hx * problem.heat_loss_rear(),
        }
    }

    fn sweep(&self, density: usize) -> Sweep {
        let a = self.sigma / self.hx2;
        let b = 1.0 / self.tau + 2.0 * self.sigma / self.hx2;
        let alpha1 = 1.0 / (self.hx2 / (2.0 * self.tau * self.sigma) + self.front);
        Sweep::new(density, a, b, a, alpha1)
    }

    /// Pulse power averaged over the two time levels of step `m`
    fn pulse_power(&self, pulse: &DiscretePulse, m: usize) -> f64 {
        let t = m as f64;
        pulse.evaluate_at((t - 1.0 + EPS) * self.tau) * self.one_minus_sigma
            + pulse.evaluate_at((t - EPS) * self.tau) * self.sigma
    }
}

fn check_status(status: RteStatus, step: usize) -> Result<(), SolverError> {
    if status.is_normal() {
        Ok(())
    } else {
        warn!("radiative transfer failed at step {}: {}", step, status);
        Err(SolverError::RadiativeTransfer(status))
    }
}

/// Working state of one coupled solve
struct CoupledState {
    coefficients: Coefficients,
    sweep: Sweep,
    rte: RadiativeTransfer,
    u: Vec<f64>,
    v: Vec<f64>,
    precision: f64,
}

impl CoupledState {
    fn rear(&self) -> f64 {
        self.u[self.u.len() - 1]
    }

    fn set_grid(&mut self, problem: &Problem, grid: &Grid, weight: Option<f64>) {
        self.coefficients = Coefficients::new(problem, grid, weight);
        self.sweep = self.coefficients.sweep(grid.density());
    }

    /// Advance one step, iterating the sweep against the radiative solve
    fn advance(&mut self, pls: f64, step: usize) -> Result<(), SolverError> {
        let c = self.coefficients;
        let n = self.u.len() - 1;
        let tolerance = self.precision * self.precision;
        let u = &self.u;
        let v = &mut self.v;

        for _ in 0..MAX_COUPLING_ITERATIONS {
            let fluxes = self.rte.fluxes();

            // ====== Front face ======
            let phi0 = c.tau0_np * fluxes.derivative(0);
            let beta1 = (c.two_tau_hx
                * (pls - c.sigma_np * fluxes.flux(0) - c.one_minus_sigma_np * fluxes.stored_flux(0))
                + c.hx2 * (u[0] + phi0 * c.tau)
                + 2.0 * c.tau * c.one_minus_sigma * (u[1] - u[0] * c.front))
                * c.beta1_factor;

            // ====== Interior ======
            self.sweep.eliminate(beta1, |i| {
                let phi = c.tau0_np
                    * (5.0 / 6.0 * fluxes.mean_derivative(i)
                        + (fluxes.mean_derivative(i - 1) + fluxes.mean_derivative(i + 1)) / 12.0);
                u[i] / c.tau + phi + c.one_minus_sigma * (u[i + 1] - 2.0 * u[i] + u[i - 1]) / c.hx2
            });

            // ====== Rear face ======
            let phi_n = c.tau0_np * fluxes.derivative(n);
            let (previous_front, previous_rear) = (v[0], v[n]);
            v[n] = (c.sigma * self.sweep.beta(n)
                + c.hx2_2tau * u[n]
                + 0.5 * c.hx2 * phi_n
                + c.one_minus_sigma * (u[n - 1] - u[n] * (1.0 + c.rear))
                + c.hx_np * (c.sigma * fluxes.flux(n) + c.one_minus_sigma * fluxes.stored_flux(n)))
                / (c.hx2_2tau + c.sigma * (1.0 - self.sweep.alpha(n) + c.rear));
            self.sweep.substitute(v);

            if let Some(i) = v.iter().position(|x| !x.is_finite()) {
                return Err(SolverError::NonFinite(i));
            }

            check_status(self.rte.compute(v), step)?;

            if (v[0] - previous_front).powi(2) <= tolerance && (v[n] - previous_rear).powi(2) <= tolerance {
                self.u.copy_from_slice(&self.v);
                self.rte.store();
                return Ok(());
            }
        }

        debug!("coupling did not converge at step {}", step);
        Err(SolverError::NotConverged { step })
    }
}

/// Weighted scheme iterated against a radiative transfer solver
///
/// # Example
///
/// ```rust
/// use pulse_rs::physics::{Dimension, Problem, ProblemKind};
/// use pulse_rs::rte::{RteConfiguration, RteSolverKind};
/// use pulse_rs::solver::{CancellationToken, CoupledScheme, SchemeConfiguration, SchemeKind, Solver};
///
/// let mut problem = Problem::new(ProblemKind::ParticipatingMedium, Dimension::One);
/// problem.curve_mut().set_num_points(10);
///
/// let rte = RteConfiguration { solver: RteSolverKind::Nonscattering, ..Default::default() };
/// let config = SchemeConfiguration::new(SchemeKind::MixedCoupled)
///     .with_grid_density(8)
///     .with_time_limit(0.2)
///     .with_rte(rte);
///
/// let curve = CoupledScheme::new(config).solve(&problem, &CancellationToken::new()).unwrap();
/// assert_eq!(curve.len(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CoupledScheme {
    config: SchemeConfiguration,
}

impl Default for CoupledScheme {
    fn default() -> Self {
        Self::new(SchemeConfiguration::new(SchemeKind::MixedCoupled))
    }
}

impl CoupledScheme {
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

impl Solver for CoupledScheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        if !self.supports(problem) {
            return Err(unsupported(self.name(), problem));
        }
        let config = &self.config;

        // ====== Setup ======

        let n = config.grid_density;
        let mut grid = Grid::new(n, config.tau_factor * config.pulse_refinement);
        let pulse = DiscretePulse::new(problem, &grid);
        let coefficients = Coefficients::new(problem, &grid, config.weight);

        let mut state = CoupledState {
            coefficients,
            sweep: coefficients.sweep(n),
            rte: RadiativeTransfer::from_configuration(&config.rte, problem, n),
            u: vec![0.0; n + 1],
            v: vec![0.0; n + 1],
            precision: config.nonlinear_precision,
        };
        check_status(state.rte.compute(&state.u), 0)?;

        let mut curve = problem.curve().blank();
        curve.reset();
        let counts = curve.num_points();
        let time_factor = problem.time_factor();

        // ====== Phase 1: refined steps while the pulse is on ======

        let interval = grid.time_interval(config.time_limit, counts);
        let point_time = interval as f64 * grid.tau();
        let pulse_end = (pulse.width() / point_time).round() as usize + 1;

        let mut elapsed = 0.0;
        let mut w = 1;
        while w < counts && w <= pulse_end {
            cancel.check()?;
            for m in (w - 1) * interval + 1..w * interval + 1 {
                let pls = state.coefficients.pulse_power(&pulse, m);
                state.advance(pls, m)?;
            }
            elapsed += point_time;
            curve.add_point(elapsed * time_factor, state.rear());
            w += 1;
        }

        // ====== Phase 2: regular steps, no pulse ======

        let mut step = (w - 1) * interval;
        if w < counts {
            grid.set_tau_factor(config.tau_factor);
            state.set_grid(problem, &grid, config.weight);

            let dt = (config.time_limit - elapsed) / (counts - w) as f64;
            let interval = ((dt / grid.tau()).floor() as usize).max(1);
            let point_time = interval as f64 * grid.tau();
            debug!(
                "coupled scheme: pulse phase ended after {} points, {} steps per point",
                w - 1,
                interval
            );

            while w < counts {
                cancel.check()?;
                for _ in 0..interval {
                    step += 1;
                    state.advance(0.0, step)?;
                }
                elapsed += point_time;
                curve.add_point(elapsed * time_factor, state.rear());
                w += 1;
            }
        }

        curve.scale_to(problem.max_temp());
        Ok(curve)
    }

    fn name(&self) -> &'static str {
        "mixed coupled"
    }

    fn supports(&self, problem: &Problem) -> bool {
        problem.kind() == ProblemKind::ParticipatingMedium
    }
}
