//! Inverse problem: fitting a heating curve to experimental data
//!
//! The objective is the residual sum of squares between the measured signal and
//! the model curve (solution plus baseline) over the fitting window. Every
//! evaluation is a full solve of the problem with the current parameters.
//!
//! # Module Organization
//!
//! - **`path`**: [`SearchSpace`] (normalised, bounded parameter vector) and
//!   [`Path`], the state of a descent
//! - **`objective`**: [`Objective`], one solve per evaluation, finite-difference
//!   gradient and Jacobian
//! - **`linear`**: golden-section line search on `argmin`
//! - **`optimiser`**: [`PathOptimiser`], steepest descent or `argmin` BFGS
//!   steps under a convergence buffer
//! - **`buffer`**: convergence [`Buffer`] of recent objective values
//! - **`statistics`**: pure functions of the residuals (R², AIC, KS, Pearson)
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::physics::NumericPropertyKeyword;
//! use pulse_rs::search::{PathOptimiserKind, SearchConfiguration};
//!
//! let config = SearchConfiguration::default()
//!     .with_optimiser(PathOptimiserKind::SteepestDescent)
//!     .with_flags(vec![NumericPropertyKeyword::Diffusivity, NumericPropertyKeyword::MaxTemp]);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.iteration_limit, 50);
//! ```

pub mod buffer;
pub mod linear;
pub mod objective;
pub mod optimiser;
pub mod path;
pub mod statistics;

pub use buffer::Buffer;
pub use linear::{golden_section, LineSearchResult};
pub use objective::Objective;
pub use optimiser::{PathOptimiser, PathOptimiserKind, SearchOutcome};
pub use path::{Path, SearchSpace, MAX_NORMALISED_STEP};
pub use statistics::{aic, ks_test, pearson, r_squared, standard_errors, sum_of_squares, KsOutcome};

use thiserror::Error;

use crate::physics::{NumericProperty, NumericPropertyKeyword, PropertyError};
use crate::solver::SolverError;

use NumericPropertyKeyword as K;

/// Errors raised by a fit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("invalid search configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("the fitting window holds {found} points, at least {required} are needed")]
    InsufficientData { found: usize, required: usize },

    #[error("optimiser failure: {0}")]
    Optimiser(String),
}

impl From<argmin::core::Error> for SearchError {
    /// Errors raised by the objective come back unchanged
    fn from(err: argmin::core::Error) -> Self {
        match err.downcast::<SearchError>() {
            Ok(err) => err,
            Err(err) => SearchError::Optimiser(err.to_string()),
        }
    }
}

/// Settings of the parameter search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfiguration {
    pub optimiser: PathOptimiserKind,
    /// Relative width of the final bracket of a line search
    pub linear_resolution: f64,
    /// Finite-difference step of the gradient, in normalised units
    pub gradient_resolution: f64,
    pub buffer_size: usize,
    pub error_tolerance: f64,
    pub iteration_limit: usize,
    /// Problem properties varied by the search
    pub flags: Vec<NumericPropertyKeyword>,
    /// Significance level of the normality test
    pub significance: f64,
    /// Absolute Pearson coefficient above which two parameters are correlated
    pub correlation_threshold: f64,
}

impl Default for SearchConfiguration {
    fn default() -> Self {
        Self {
            optimiser: PathOptimiserKind::default(),
            linear_resolution: K::LinearResolution.default_value(),
            gradient_resolution: K::GradientResolution.default_value(),
            buffer_size: K::BufferSize.default_value() as usize,
            error_tolerance: K::ErrorTolerance.default_value(),
            iteration_limit: K::IterationLimit.default_value() as usize,
            flags: vec![K::Diffusivity, K::HeatLoss, K::MaxTemp],
            significance: K::Significance.default_value(),
            correlation_threshold: K::CorrelationThreshold.default_value(),
        }
    }
}

impl SearchConfiguration {
    pub fn with_optimiser(mut self, optimiser: PathOptimiserKind) -> Self {
        self.optimiser = optimiser;
        self
    }

    pub fn with_flags(mut self, flags: Vec<NumericPropertyKeyword>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    pub fn with_error_tolerance(mut self, tolerance: f64) -> Self {
        self.error_tolerance = tolerance;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            (K::LinearResolution, self.linear_resolution),
            (K::GradientResolution, self.gradient_resolution),
            (K::BufferSize, self.buffer_size as f64),
            (K::ErrorTolerance, self.error_tolerance),
            (K::IterationLimit, self.iteration_limit as f64),
            (K::Significance, self.significance),
            (K::CorrelationThreshold, self.correlation_threshold),
        ];
        for (keyword, value) in checks {
            keyword.check(value).map_err(|e| e.to_string())?;
        }
        if self.flags.is_empty() {
            return Err("no parameters selected for the search".to_string());
        }
        if let Some(k) = self.flags.iter().find(|k| k.is_discrete()) {
            return Err(format!("{} is discrete and cannot be searched", k));
        }
        for (i, k) in self.flags.iter().enumerate() {
            if self.flags[..i].contains(k) {
                return Err(format!("{} is selected twice", k));
            }
        }
        Ok(())
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        let value = match keyword {
            K::LinearResolution => self.linear_resolution,
            K::GradientResolution => self.gradient_resolution,
            K::BufferSize => self.buffer_size as f64,
            K::ErrorTolerance => self.error_tolerance,
            K::IterationLimit => self.iteration_limit as f64,
            K::Significance => self.significance,
            K::CorrelationThreshold => self.correlation_threshold,
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
        keyword.check(property.value())?;
        match keyword {
            K::LinearResolution => self.linear_resolution = property.value(),
            K::GradientResolution => self.gradient_resolution = property.value(),
            K::BufferSize => self.buffer_size = property.as_count(),
            K::ErrorTolerance => self.error_tolerance = property.value(),
            K::IterationLimit => self.iteration_limit = property.as_count(),
            K::Significance => self.significance = property.value(),
            K::CorrelationThreshold => self.correlation_threshold = property.value(),
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfiguration::default();
        assert_eq!(config.optimiser, PathOptimiserKind::Bfgs);
        assert_eq!(config.buffer_size, 4);
        assert_eq!(config.flags, vec![K::Diffusivity, K::HeatLoss, K::MaxTemp]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_flags() {
        assert!(SearchConfiguration::default().with_flags(vec![]).validate().is_err());
        assert!(
            SearchConfiguration::default()
                .with_flags(vec![K::NumPoints])
                .validate()
                .is_err()
        );
        assert!(
            SearchConfiguration::default()
                .with_flags(vec![K::Diffusivity, K::Diffusivity])
                .validate()
                .is_err()
        );
        assert!(SearchConfiguration::default().with_buffer_size(1).validate().is_err());
    }

    #[test]
    fn test_get_and_set() {
        let mut config = SearchConfiguration::default();
        config
            .set(K::IterationLimit, NumericProperty::new(K::IterationLimit, 20.0).unwrap())
            .unwrap();
        assert_eq!(config.iteration_limit, 20);
        assert_eq!(config.get(K::BufferSize).unwrap().as_count(), 4);
        assert_eq!(
            config.set(K::Diffusivity, NumericProperty::default_for(K::Diffusivity)),
            Err(PropertyError::Unsupported(K::Diffusivity))
        );
    }
}
