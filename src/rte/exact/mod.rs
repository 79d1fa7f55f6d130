//! Non-scattering radiative transfer in closed form
//!
//! For a purely absorbing and emitting grey slab between diffuse grey walls the
//! radiative transfer equation integrates exactly. With the emissive power
//! `J(s)` over the optical coordinate `s ∈ [0, τ0]`:
//!
//! ```text
//! q(t) = 2·[R_f·E₃(t) − R_r·E₃(τ0 − t) + ∫₀ᵗ J(s)E₂(t − s) ds − ∫ₜ^τ0 J(s)E₂(s − t) ds]
//! ```
//!
//! The wall radiosities `R_f`, `R_r` solve the 2×2 system
//!
//! ```text
//! R_f = εJ(0)  + 2(1 − ε)·[R_r·E₃(τ0) + ∫ J(s)E₂(s) ds]
//! R_r = εJ(τ0) + 2(1 − ε)·[R_f·E₃(τ0) + ∫ J(s)E₂(τ0 − s) ds]
//! ```
//!
//! The source term `−∂q/∂t` is either differenced from `q` or evaluated from
//! its own closed form, which involves the `E₁` kernel:
//!
//! ```text
//! −∂q/∂t = −4J(t) + 2·[R_f·E₂(t) + R_r·E₂(τ0 − t) + ∫ J(s)E₁(|t − s|) ds]
//! ```

pub mod convolution;

pub use convolution::ConvolutionKind;

use log::debug;
use nalgebra::{Matrix2, Vector2};

use crate::math::{exp_integral, ExpIntegrals};
use crate::physics::{NumericProperty, NumericPropertyKeyword, Problem, PropertyError};
use crate::rte::emission::EmissionFunction;
use crate::rte::fluxes::Fluxes;
use crate::rte::RteStatus;

/// How the source term `−∂q/∂τ` is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeMode {
    /// Second-order finite differences of the flux
    #[default]
    Discrete,
    /// Closed-form expression with the `E₁` kernel
    Analytical,
}

/// Settings of the non-scattering solver
#[derive(Debug, Clone, PartialEq)]
pub struct NonscatteringConfiguration {
    pub convolution: ConvolutionKind,
    /// Minimum number of integration segments over `[0, τ0]`
    pub integration_segments: usize,
    pub derivatives: DerivativeMode,
}

impl Default for NonscatteringConfiguration {
    fn default() -> Self {
        Self {
            convolution: ConvolutionKind::default(),
            integration_segments: NumericPropertyKeyword::IntegrationSegments.default_value() as usize,
            derivatives: DerivativeMode::default(),
        }
    }
}

impl NonscatteringConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.integration_segments < 2 {
            return Err("at least 2 integration segments are needed".to_string());
        }
        if self.derivatives == DerivativeMode::Analytical && !self.convolution.handles_order(1) {
            return Err(format!(
                "{:?} cannot integrate the E1 kernel of analytical derivatives",
                self.convolution
            ));
        }
        Ok(())
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        match keyword {
            NumericPropertyKeyword::IntegrationSegments => Some(NumericProperty::derive(
                keyword,
                self.integration_segments as f64,
            )),
            _ => None,
        }
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        match keyword {
            NumericPropertyKeyword::IntegrationSegments => {
                keyword.check(property.value())?;
                self.integration_segments = property.as_count();
                Ok(())
            }
            other => Err(PropertyError::Unsupported(other)),
        }
    }
}

/// Closed-form solver for an absorbing, emitting, non-scattering slab
#[derive(Debug, Clone)]
pub struct Nonscattering {
    config: NonscatteringConfiguration,
    delta: f64,
    emissivity: f64,
    optical_thickness: f64,
    /// Fine mesh nodes per heat-grid interval (even)
    subdivision: usize,
    table: ExpIntegrals,
    e3_tau0: f64,
    emission: Vec<f64>,
    radiosities: (f64, f64),
    fluxes: Fluxes,
}

impl Nonscattering {
    pub fn new(config: NonscatteringConfiguration, problem: &Problem, density: usize) -> Self {
        let half = config.integration_segments.div_ceil(2 * density).max(1);
        let subdivision = 2 * half;
        let fine = density * subdivision;
        let tau0 = problem.optical_thickness();

        Self {
            config,
            delta: problem.nonlinearity(),
            emissivity: problem.emissivity(),
            optical_thickness: tau0,
            subdivision,
            table: ExpIntegrals::tabulate(tau0 / fine as f64, fine),
            e3_tau0: exp_integral(3, tau0),
            emission: vec![0.0; fine + 1],
            radiosities: (0.0, 0.0),
            fluxes: Fluxes::new(density),
        }
    }

    pub fn fluxes(&self) -> &Fluxes {
        &self.fluxes
    }

    pub fn fluxes_mut(&mut self) -> &mut Fluxes {
        &mut self.fluxes
    }

    /// Front and rear wall radiosities of the last computation
    pub fn radiosities(&self) -> (f64, f64) {
        self.radiosities
    }

    fn fine_count(&self) -> usize {
        self.emission.len() - 1
    }

    fn integrate(&self, order: usize, at: usize, from: usize, to: usize) -> f64 {
        self.config.convolution.integrate(order, &self.emission, &self.table, at, from, to)
    }

    fn solve_radiosities(&self) -> Option<(f64, f64)> {
        let m = self.fine_count();
        let reflect = 1.0 - self.emissivity;
        let b = 2.0 * reflect * self.e3_tau0;

        let rhs = Vector2::new(
            self.emissivity * self.emission[0] + 2.0 * reflect * self.integrate(2, 0, 0, m),
            self.emissivity * self.emission[m] + 2.0 * reflect * self.integrate(2, m, 0, m),
        );
        let system = Matrix2::new(1.0, -b, -b, 1.0);
        let solution = system.lu().solve(&rhs)?;
        Some((solution[0], solution[1]))
    }

    /// Fluxes for the dimensionless temperature profile on the heat grid
    pub fn compute(&mut self, temperatures: &[f64]) -> RteStatus {
        let density = self.fluxes.density();
        assert_eq!(temperatures.len(), density + 1, "temperature profile does not match the grid");

        let function = EmissionFunction::new(self.delta, self.optical_thickness, temperatures);
        let h = self.table.step();
        for (j, value) in self.emission.iter_mut().enumerate() {
            *value = function.at(j as f64 * h);
        }

        let Some((front, rear)) = self.solve_radiosities() else {
            debug!("radiosity system is singular");
            return RteStatus::IntegrationFailed;
        };
        self.radiosities = (front, rear);

        let m = self.fine_count();
        for i in 0..=density {
            let k = i * self.subdivision;
            let q = 2.0
                * (front * self.table.get(3, k) - rear * self.table.get(3, m - k)
                    + self.integrate(2, k, 0, k)
                    - self.integrate(2, k, k, m));
            self.fluxes.set_flux(i, q);
        }

        match self.config.derivatives {
            DerivativeMode::Discrete => self.difference_fluxes(),
            DerivativeMode::Analytical => {
                for i in 0..=density {
                    let k = i * self.subdivision;
                    let d = -4.0 * self.emission[k]
                        + 2.0
                            * (front * self.table.get(2, k)
                                + rear * self.table.get(2, m - k)
                                + self.integrate(1, k, 0, k)
                                + self.integrate(1, k, k, m));
                    self.fluxes.set_derivative(i, d);
                }
            }
        }

        if self.fluxes.fluxes().iter().all(|q| q.is_finite()) {
            RteStatus::Normal
        } else {
            RteStatus::IntegrationFailed
        }
    }

    fn difference_fluxes(&mut self) {
        let n = self.fluxes.density();
        let step = self.optical_thickness / n as f64;
        let q = |i: usize| self.fluxes.flux(i);

        let mut derivative = vec![0.0; n + 1];
        derivative[0] = -(-3.0 * q(0) + 4.0 * q(1) - q(2.min(n))) / (2.0 * step);
        for i in 1..n {
            derivative[i] = -(q(i + 1) - q(i - 1)) / (2.0 * step);
        }
        derivative[n] = -(3.0 * q(n) - 4.0 * q(n - 1) + q(n.saturating_sub(2))) / (2.0 * step);

        for (i, d) in derivative.into_iter().enumerate() {
            self.fluxes.set_derivative(i, d);
        }
    }
}
