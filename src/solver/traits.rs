//! Solver trait, scheme configuration and errors
//!
//! # Design
//!
//! - [`SchemeKind`] names the finite-difference template
//! - [`SchemeConfiguration`] carries the numerical parameters of a scheme; its
//!   defaults depend on the kind
//! - [`Solver`] is the uniform `solve(problem) -> HeatingCurve` interface every
//!   scheme implements
//! - [`CancellationToken`] is checked once per output point
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::solver::{SchemeConfiguration, SchemeKind};
//!
//! let config = SchemeConfiguration::new(SchemeKind::Implicit)
//!     .with_grid_density(40)
//!     .with_time_limit(0.8);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.tau_factor, 0.25);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::physics::{HeatingCurve, NumericProperty, NumericPropertyKeyword, Problem, PropertyError};
use crate::rte::{RteConfiguration, RteStatus};

// =================================================================================================
// Errors and cancellation
// =================================================================================================

/// Errors raised by a solve
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("invalid scheme configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{scheme} cannot solve a {kind} problem in {dimension}")]
    Unsupported {
        scheme: &'static str,
        kind: String,
        dimension: String,
    },

    #[error("solve cancelled")]
    Cancelled,

    #[error("radiative transfer failed: {0}")]
    RadiativeTransfer(RteStatus),

    #[error("temperature became non-finite at node {0}")]
    NonFinite(usize),

    #[error("boundary temperatures did not converge at step {step}")]
    NotConverged { step: usize },
}

/// Shared flag asking a running solve to stop
///
/// Cloning shares the flag. Schemes poll it between output points, never inside
/// a sweep.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// `Err(Cancelled)` once the flag is raised
    pub fn check(&self) -> Result<(), SolverError> {
        if self.is_cancelled() {
            Err(SolverError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// A finite-difference scheme producing the rear-surface heating curve
///
/// The returned curve holds exactly `num_points` samples with strictly increasing
/// times, scaled so that its maximum equals the problem's maximum temperature.
pub trait Solver: Send {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError>;

    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether the problem kind and dimension can be handled
    fn supports(&self, problem: &Problem) -> bool;
}

/// Build the `Unsupported` error for a problem the scheme cannot handle
pub(crate) fn unsupported(scheme: &'static str, problem: &Problem) -> SolverError {
    SolverError::Unsupported {
        scheme,
        kind: format!("{:?}", problem.kind()),
        dimension: format!("{:?}", problem.dimension()),
    }
}

// =================================================================================================
// Scheme configuration
// =================================================================================================

/// Finite-difference template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemeKind {
    Explicit,
    #[default]
    Implicit,
    Mixed,
    Adi,
    MixedCoupled,
}

impl SchemeKind {
    /// Default `(grid density, τ-factor)` for this template
    pub fn defaults(self) -> (usize, f64) {
        match self {
            SchemeKind::Explicit => (80, 0.5),
            SchemeKind::Implicit => (30, 0.25),
            SchemeKind::Mixed => (30, 1.0),
            SchemeKind::Adi => (30, 1.0),
            SchemeKind::MixedCoupled => (16, 0.25),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemeKind::Explicit => "explicit",
            SchemeKind::Implicit => "implicit",
            SchemeKind::Mixed => "mixed",
            SchemeKind::Adi => "ADI",
            SchemeKind::MixedCoupled => "mixed coupled",
        };
        f.write_str(name)
    }
}

/// Refinement of the time step while the pulse is active (coupled scheme)
pub const DEFAULT_PULSE_REFINEMENT: f64 = 0.2;

/// Numerical parameters of a scheme
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeConfiguration {
    pub kind: SchemeKind,
    pub grid_density: usize,
    pub tau_factor: f64,
    /// Dimensionless time limit, in units of `l²/a`
    pub time_limit: f64,
    /// Weight of the implicit part (mixed schemes); `None` picks `0.5 − hx²/(12τ)`
    pub weight: Option<f64>,
    pub nonlinear_precision: f64,
    pub pulse_refinement: f64,
    pub rte: RteConfiguration,
}

impl Default for SchemeConfiguration {
    fn default() -> Self {
        Self::new(SchemeKind::default())
    }
}

impl SchemeConfiguration {
    pub fn new(kind: SchemeKind) -> Self {
        let (grid_density, tau_factor) = kind.defaults();
        Self {
            kind,
            grid_density,
            tau_factor,
            time_limit: NumericPropertyKeyword::TimeLimit.default_value(),
            weight: None,
            nonlinear_precision: NumericPropertyKeyword::NonlinearPrecision.default_value(),
            pulse_refinement: DEFAULT_PULSE_REFINEMENT,
            rte: RteConfiguration::default(),
        }
    }

    pub fn with_grid_density(mut self, density: usize) -> Self {
        self.grid_density = density;
        self
    }

    pub fn with_tau_factor(mut self, tau_factor: f64) -> Self {
        self.tau_factor = tau_factor;
        self
    }

    pub fn with_time_limit(mut self, time_limit: f64) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_nonlinear_precision(mut self, precision: f64) -> Self {
        self.nonlinear_precision = precision;
        self
    }

    pub fn with_pulse_refinement(mut self, refinement: f64) -> Self {
        self.pulse_refinement = refinement;
        self
    }

    pub fn with_rte(mut self, rte: RteConfiguration) -> Self {
        self.rte = rte;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.grid_density < 2 {
            return Err(format!("grid density must be at least 2, got {}", self.grid_density));
        }
        if !(self.tau_factor.is_finite() && self.tau_factor > 0.0) {
            return Err(format!("time factor must be positive, got {}", self.tau_factor));
        }
        if !(self.time_limit.is_finite() && self.time_limit > 0.0) {
            return Err(format!("time limit must be positive, got {}", self.time_limit));
        }
        if let Some(weight) = self.weight
            && !(0.0..=1.0).contains(&weight)
        {
            return Err(format!("scheme weight must lie in [0, 1], got {}", weight));
        }
        if !(self.nonlinear_precision > 0.0) {
            return Err("nonlinear precision must be positive".to_string());
        }
        if !(self.pulse_refinement > 0.0 && self.pulse_refinement <= 1.0) {
            return Err(format!(
                "pulse refinement must lie in (0, 1], got {}",
                self.pulse_refinement
            ));
        }
        self.rte.validate()
    }

    /// Keywords exposed by this configuration
    pub fn keywords(&self) -> Vec<NumericPropertyKeyword> {
        use NumericPropertyKeyword as K;
        let mut keywords = vec![K::GridDensity, K::TauFactor, K::TimeLimit];
        match self.kind {
            SchemeKind::Mixed => keywords.push(K::SchemeWeight),
            SchemeKind::Implicit => keywords.push(K::NonlinearPrecision),
            SchemeKind::MixedCoupled => {
                keywords.extend([K::SchemeWeight, K::NonlinearPrecision]);
                keywords.extend(RteConfiguration::keywords());
            }
            SchemeKind::Explicit | SchemeKind::Adi => {}
        }
        keywords
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        use NumericPropertyKeyword as K;
        let value = match keyword {
            K::GridDensity => self.grid_density as f64,
            K::TauFactor => self.tau_factor,
            K::TimeLimit => self.time_limit,
            K::SchemeWeight => self.weight?,
            K::NonlinearPrecision => self.nonlinear_precision,
            _ => return self.rte.get(keyword),
        };
        Some(NumericProperty::derive(keyword, value))
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        use NumericPropertyKeyword as K;
        keyword.require(property.keyword())?;
        if !matches!(
            keyword,
            K::GridDensity | K::TauFactor | K::TimeLimit | K::SchemeWeight | K::NonlinearPrecision
        ) {
            return self.rte.set(keyword, property);
        }

        keyword.check(property.value())?;
        match keyword {
            K::GridDensity => self.grid_density = property.as_count(),
            K::TauFactor => self.tau_factor = property.value(),
            K::TimeLimit => self.time_limit = property.value(),
            K::SchemeWeight => self.weight = Some(property.value()),
            _ => self.nonlinear_precision = property.value(),
        }
        Ok(())
    }
}
