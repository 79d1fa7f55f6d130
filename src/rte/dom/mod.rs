//! Discrete ordinates method for a scattering, absorbing and emitting slab
//!
//! # Algorithm
//!
//! Each call to [`DiscreteOrdinates::compute`] performs source iteration:
//!
//! 1. Interpolate the emissive power `J*(τ)` from the heat-grid temperatures
//! 2. Sweep the outgoing hemisphere (`μ > 0`) from the front wall to the rear
//!    wall as one ODE system; intensities of the other hemisphere are taken from
//!    the previous sweep and interpolated linearly between optical nodes
//! 3. Sweep the incoming hemisphere (`μ < 0`) back from the rear wall using the
//!    freshly computed outgoing intensities
//! 4. Solve the `μ = 0` ordinate, if any, from its local balance
//! 5. Stop once the squared change of both wall fluxes falls below the iteration
//!    error squared
//!
//! The converged field is carried over to the next call. Fluxes and source
//! terms are finally Hermite-interpolated onto the heat-grid nodes.

pub mod integrator;
pub mod intensities;
pub mod phase;
pub mod quadrature;

pub use integrator::{DormandPrince, IntegrationError};
pub use intensities::DiscreteIntensities;
pub use phase::PhaseFunctionKind;
pub use quadrature::Quadrature;

use log::debug;

use crate::physics::{NumericProperty, NumericPropertyKeyword, Problem, PropertyError};
use crate::rte::emission::EmissionFunction;
use crate::rte::fluxes::Fluxes;
use crate::rte::RteStatus;

/// Settings of the discrete ordinates solver
#[derive(Debug, Clone, PartialEq)]
pub struct DomConfiguration {
    /// Number of ordinates over `[−1, 1]`
    pub directions: usize,
    pub iteration_error: f64,
    pub max_iterations: usize,
    /// Intervals of the optical grid the intensities live on
    pub optical_grid_density: usize,
    pub phase_function: PhaseFunctionKind,
    pub integrator: DormandPrince,
}

impl Default for DomConfiguration {
    fn default() -> Self {
        Self {
            directions: NumericPropertyKeyword::DomDirections.default_value() as usize,
            iteration_error: NumericPropertyKeyword::DomIterationError.default_value(),
            max_iterations: 200,
            optical_grid_density: 32,
            phase_function: PhaseFunctionKind::default(),
            integrator: DormandPrince::default(),
        }
    }
}

impl DomConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.directions < 2 {
            return Err(format!("at least 2 directions are needed, got {}", self.directions));
        }
        if !(self.iteration_error > 0.0) {
            return Err("iteration error must be positive".to_string());
        }
        if self.max_iterations == 0 || self.optical_grid_density == 0 {
            return Err("iteration limit and optical grid density must be positive".to_string());
        }
        if !(self.integrator.atol > 0.0 && self.integrator.rtol > 0.0) || self.integrator.max_substeps == 0 {
            return Err("integrator tolerances and substep limit must be positive".to_string());
        }
        Ok(())
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        let value = match keyword {
            NumericPropertyKeyword::DomDirections => self.directions as f64,
            NumericPropertyKeyword::DomIterationError => self.iteration_error,
            _ => return None,
        };
        Some(NumericProperty::derive(keyword, value))
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        match keyword {
            NumericPropertyKeyword::DomDirections => {
                keyword.check(property.value())?;
                self.directions = property.as_count();
            }
            NumericPropertyKeyword::DomIterationError => {
                keyword.check(property.value())?;
                self.iteration_error = property.value();
            }
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}

/// Discrete ordinates radiative transfer solver
#[derive(Debug, Clone)]
pub struct DiscreteOrdinates {
    config: DomConfiguration,
    delta: f64,
    optical_thickness: f64,
    intensities: DiscreteIntensities,
    fluxes: Fluxes,
    /// Last accepted integration step, reused across sweeps
    step: f64,
}

impl DiscreteOrdinates {
    pub fn new(config: DomConfiguration, problem: &Problem, density: usize) -> Self {
        let quadrature = Quadrature::gauss_legendre(config.directions);
        let phase = config.phase_function.matrix(&quadrature, problem.scattering_anisotropy());
        let intensities = DiscreteIntensities::new(
            quadrature,
            phase,
            problem.optical_thickness(),
            config.optical_grid_density,
            problem.emissivity(),
            problem.scattering_albedo(),
        );
        let step = problem.optical_thickness() / config.optical_grid_density as f64;

        Self {
            config,
            delta: problem.nonlinearity(),
            optical_thickness: problem.optical_thickness(),
            intensities,
            fluxes: Fluxes::new(density),
            step,
        }
    }

    pub fn fluxes(&self) -> &Fluxes {
        &self.fluxes
    }

    pub fn fluxes_mut(&mut self) -> &mut Fluxes {
        &mut self.fluxes
    }

    pub fn intensities(&self) -> &DiscreteIntensities {
        &self.intensities
    }

    pub fn compute(&mut self, temperatures: &[f64]) -> RteStatus {
        assert_eq!(
            temperatures.len(),
            self.fluxes.density() + 1,
            "temperature profile does not match the grid"
        );
        let emission = EmissionFunction::new(self.delta, self.optical_thickness, temperatures);
        self.intensities.initialise(|tau| emission.at(tau));

        let last = self.intensities.intervals();
        let mut front = self.intensities.flux(&self.intensities.row(0).to_vec());
        let mut rear = self.intensities.flux(&self.intensities.row(last).to_vec());
        let tolerance = self.config.iteration_error * self.config.iteration_error;

        let mut converged = false;
        for iteration in 1..=self.config.max_iterations {
            if let Err(status) = self.sweep(&emission) {
                return status;
            }
            self.intensities.update_zero_ordinate(|tau| emission.at(tau));
            if !self.intensities.is_physical() {
                debug!("negative intensities after {} sweeps", iteration);
                return RteStatus::NonPhysicalIntensities;
            }

            let new_front = self.intensities.flux(&self.intensities.row(0).to_vec());
            let new_rear = self.intensities.flux(&self.intensities.row(last).to_vec());
            let change = ((new_front - front).powi(2), (new_rear - rear).powi(2));
            front = new_front;
            rear = new_rear;
            if change.0 < tolerance && change.1 < tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            debug!("source iteration exceeded {} sweeps", self.config.max_iterations);
            return RteStatus::IterationLimitReached;
        }

        self.interpolate_fluxes(&emission);
        RteStatus::Normal
    }

    /// One forward and one backward sweep
    fn sweep(&mut self, emission: &EmissionFunction) -> Result<(), RteStatus> {
        let quadrature = self.intensities.quadrature().clone();
        let last = self.intensities.intervals();
        let nodes = self.intensities.nodes().to_vec();

        // ====== Outgoing hemisphere, front to rear ======
        let positive = quadrature.positive();
        let row = self.intensities.row(0).to_vec();
        let boundary = self.intensities.wall_intensity(emission.at(0.0), &row, quadrature.negative());
        for k in positive.clone() {
            self.intensities.set(0, k, boundary);
        }
        for j in 0..last {
            self.integrate_interval(emission, &quadrature, positive.clone(), nodes[j], nodes[j + 1], j)?;
        }

        // ====== Incoming hemisphere, rear to front ======
        let negative = quadrature.negative();
        let row = self.intensities.row(last).to_vec();
        let boundary =
            self.intensities
                .wall_intensity(emission.at(self.optical_thickness), &row, quadrature.positive());
        for k in negative.clone() {
            self.intensities.set(last, k, boundary);
        }
        for j in (0..last).rev() {
            self.integrate_interval(emission, &quadrature, negative.clone(), nodes[j + 1], nodes[j], j)?;
        }
        Ok(())
    }

    /// Advance the ordinates `active` across optical interval `j` from `from` to `to`
    fn integrate_interval(
        &mut self,
        emission: &EmissionFunction,
        quadrature: &Quadrature,
        active: std::ops::Range<usize>,
        from: f64,
        to: f64,
        j: usize,
    ) -> Result<(), RteStatus> {
        let (start, end) = if from < to { (j, j + 1) } else { (j + 1, j) };
        let left = self.intensities.row(j).to_vec();
        let right = self.intensities.row(j + 1).to_vec();
        let (tau_left, tau_right) = (self.intensities.nodes()[j], self.intensities.nodes()[j + 1]);

        let mut state: Vec<f64> = active.clone().map(|k| self.intensities.get(start, k)).collect();
        let mut row = left.clone();
        let field = &self.intensities;

        let rhs = |tau: f64, y: &[f64], dy: &mut [f64]| {
            let s = (tau - tau_left) / (tau_right - tau_left);
            for (l, value) in row.iter_mut().enumerate() {
                *value = left[l] + (right[l] - left[l]) * s;
            }
            for (i, k) in active.clone().enumerate() {
                row[k] = y[i];
            }
            let j_tau = emission.at(tau);
            for (i, k) in active.clone().enumerate() {
                dy[i] = (field.source(k, j_tau, &row) - y[i]) / quadrature.mu(k);
            }
        };

        self.config
            .integrator
            .integrate(rhs, from, to, &mut state, &mut self.step)
            .map_err(|err| {
                debug!("ordinate integration failed on interval {}: {:?}", j, err);
                RteStatus::IntegrationFailed
            })?;

        for (i, k) in active.enumerate() {
            self.intensities.set(end, k, state[i]);
        }
        Ok(())
    }

    /// Hermite interpolation of the intensities onto the heat-grid nodes
    fn interpolate_fluxes(&mut self, emission: &EmissionFunction) {
        let density = self.fluxes.density();
        let field = &self.intensities;
        let quadrature = field.quadrature();
        let nodes = field.nodes();
        let intervals = field.intervals();
        let width = self.optical_thickness / intervals as f64;
        let n = quadrature.len();

        let mut row = vec![0.0; n];
        let mut values = Vec::with_capacity(density + 1);
        for i in 0..=density {
            let tau = self.optical_thickness * i as f64 / density as f64;
            let j = ((tau / width) as usize).min(intervals - 1);
            let s = (tau - nodes[j]) / width;

            let a = field.row(j).to_vec();
            let b = field.row(j + 1).to_vec();
            let (ja, jb) = (emission.at(nodes[j]), emission.at(nodes[j + 1]));

            let h00 = (1.0 + 2.0 * s) * (1.0 - s) * (1.0 - s);
            let h10 = s * (1.0 - s) * (1.0 - s);
            let h01 = s * s * (3.0 - 2.0 * s);
            let h11 = s * s * (s - 1.0);
            for k in 0..n {
                let mu = quadrature.mu(k);
                row[k] = if mu == 0.0 {
                    a[k] + (b[k] - a[k]) * s
                } else {
                    let da = (field.source(k, ja, &a) - a[k]) / mu;
                    let db = (field.source(k, jb, &b) - b[k]) / mu;
                    h00 * a[k] + h10 * width * da + h01 * b[k] + h11 * width * db
                };
            }

            let j_tau = emission.at(tau);
            values.push((field.flux(&row), field.flux_derivative(j_tau, &row)));
        }

        for (i, (q, d)) in values.into_iter().enumerate() {
            self.fluxes.set_flux(i, q);
            self.fluxes.set_derivative(i, d);
        }
    }
}
