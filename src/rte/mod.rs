//! Radiative transfer in a semi-transparent sample
//!
//! When the sample is a participating medium, the heat equation gains a source
//! term `−∂q/∂τ`, the divergence of the net radiative flux. This module computes
//! `q` and `−∂q/∂τ` on the heat-conduction grid for a given temperature profile.
//!
//! # Solvers
//!
//! - [`DiscreteOrdinates`]: general scattering media, source iteration over a
//!   Gauss–Legendre ordinate set
//! - [`Nonscattering`]: absorbing and emitting media in closed form with
//!   exponential-integral kernels
//!
//! Both are wrapped in the [`RadiativeTransfer`] enum and report a
//! [`RteStatus`] instead of failing: non-convergence is an expected outcome the
//! coupled scheme reacts to.
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::physics::{Dimension, Problem, ProblemKind};
//! use pulse_rs::rte::{RadiativeTransfer, RteConfiguration, RteSolverKind, RteStatus};
//!
//! let problem = Problem::new(ProblemKind::ParticipatingMedium, Dimension::One);
//! let config = RteConfiguration { solver: RteSolverKind::Nonscattering, ..Default::default() };
//! let mut rte = RadiativeTransfer::from_configuration(&config, &problem, 16);
//! assert_eq!(rte.compute(&[0.0; 17]), RteStatus::Normal);
//! assert!(rte.fluxes().flux(8).abs() < 1e-10);
//! ```

pub mod dom;
pub mod emission;
pub mod exact;
pub mod fluxes;

pub use dom::{DiscreteOrdinates, DomConfiguration, PhaseFunctionKind};
pub use emission::EmissionFunction;
pub use exact::{ConvolutionKind, DerivativeMode, Nonscattering, NonscatteringConfiguration};
pub use fluxes::Fluxes;

use std::fmt;

use crate::physics::{NumericProperty, NumericPropertyKeyword, Problem, PropertyError};

/// Outcome of a radiative transfer computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RteStatus {
    Normal,
    IterationLimitReached,
    NonPhysicalIntensities,
    IntegrationFailed,
}

impl RteStatus {
    pub fn is_normal(self) -> bool {
        self == RteStatus::Normal
    }
}

impl fmt::Display for RteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            RteStatus::Normal => "converged",
            RteStatus::IterationLimitReached => "iteration limit reached before convergence",
            RteStatus::NonPhysicalIntensities => "negative or non-finite intensities",
            RteStatus::IntegrationFailed => "integration along the ordinates failed",
        };
        f.write_str(description)
    }
}

/// Radiative transfer solver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RteSolverKind {
    #[default]
    DiscreteOrdinates,
    Nonscattering,
}

/// Settings of both radiative transfer solvers; `solver` picks one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RteConfiguration {
    pub solver: RteSolverKind,
    pub dom: DomConfiguration,
    pub nonscattering: NonscatteringConfiguration,
}

impl RteConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        match self.solver {
            RteSolverKind::DiscreteOrdinates => self.dom.validate(),
            RteSolverKind::Nonscattering => self.nonscattering.validate(),
        }
    }

    pub fn keywords() -> [NumericPropertyKeyword; 3] {
        [
            NumericPropertyKeyword::DomDirections,
            NumericPropertyKeyword::DomIterationError,
            NumericPropertyKeyword::IntegrationSegments,
        ]
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        self.dom.get(keyword).or_else(|| self.nonscattering.get(keyword))
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        match keyword {
            NumericPropertyKeyword::DomDirections | NumericPropertyKeyword::DomIterationError => {
                self.dom.set(keyword, property)
            }
            NumericPropertyKeyword::IntegrationSegments => self.nonscattering.set(keyword, property),
            other => {
                other.require(property.keyword())?;
                Err(PropertyError::Unsupported(other))
            }
        }
    }
}

/// Radiative transfer solver bound to a problem and a grid density
#[derive(Debug, Clone)]
pub enum RadiativeTransfer {
    DiscreteOrdinates(DiscreteOrdinates),
    Nonscattering(Nonscattering),
}

impl RadiativeTransfer {
    pub fn from_configuration(config: &RteConfiguration, problem: &Problem, density: usize) -> Self {
        match config.solver {
            RteSolverKind::DiscreteOrdinates => {
                RadiativeTransfer::DiscreteOrdinates(DiscreteOrdinates::new(config.dom.clone(), problem, density))
            }
            RteSolverKind::Nonscattering => RadiativeTransfer::Nonscattering(Nonscattering::new(
                config.nonscattering.clone(),
                problem,
                density,
            )),
        }
    }

    /// Fluxes for the dimensionless temperatures at the `N + 1` heat-grid nodes
    pub fn compute(&mut self, temperatures: &[f64]) -> RteStatus {
        match self {
            RadiativeTransfer::DiscreteOrdinates(solver) => solver.compute(temperatures),
            RadiativeTransfer::Nonscattering(solver) => solver.compute(temperatures),
        }
    }

    pub fn fluxes(&self) -> &Fluxes {
        match self {
            RadiativeTransfer::DiscreteOrdinates(solver) => solver.fluxes(),
            RadiativeTransfer::Nonscattering(solver) => solver.fluxes(),
        }
    }

    /// Keep the current fluxes as those of the last converged step
    pub fn store(&mut self) {
        match self {
            RadiativeTransfer::DiscreteOrdinates(solver) => solver.fluxes_mut().store(),
            RadiativeTransfer::Nonscattering(solver) => solver.fluxes_mut().store(),
        }
    }
}
