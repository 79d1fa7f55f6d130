//! Tagged scheme selected from a [`SchemeConfiguration`]

use crate::physics::{HeatingCurve, Problem};
use crate::solver::methods::{AdiScheme, CoupledScheme, ExplicitScheme, ImplicitScheme, MixedScheme};
use crate::solver::traits::{CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError};

/// Closed set of finite-difference schemes behind one [`Solver`] interface
///
/// # Example
///
/// ```rust
/// use pulse_rs::physics::{Dimension, Problem, ProblemKind};
/// use pulse_rs::solver::{CancellationToken, Scheme, SchemeConfiguration, SchemeKind, Solver};
///
/// let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
/// problem.curve_mut().set_num_points(50);
///
/// let mut scheme = Scheme::from_configuration(SchemeConfiguration::new(SchemeKind::Mixed)).unwrap();
/// assert!(scheme.supports(&problem));
/// let curve = scheme.solve(&problem, &CancellationToken::new()).unwrap();
/// assert_eq!(curve.len(), 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Scheme {
    Explicit(ExplicitScheme),
    Implicit(ImplicitScheme),
    Mixed(MixedScheme),
    Adi(AdiScheme),
    MixedCoupled(CoupledScheme),
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Implicit(ImplicitScheme::default())
    }
}

impl Scheme {
    /// Validate the configuration and build the scheme named by its kind
    pub fn from_configuration(config: SchemeConfiguration) -> Result<Self, SolverError> {
        config.validate().map_err(SolverError::InvalidConfiguration)?;
        Ok(match config.kind {
            SchemeKind::Explicit => Scheme::Explicit(ExplicitScheme::new(config)),
            SchemeKind::Implicit => Scheme::Implicit(ImplicitScheme::new(config)),
            SchemeKind::Mixed => Scheme::Mixed(MixedScheme::new(config)),
            SchemeKind::Adi => Scheme::Adi(AdiScheme::new(config)),
            SchemeKind::MixedCoupled => Scheme::MixedCoupled(CoupledScheme::new(config)),
        })
    }

    /// Fresh instance with the same configuration
    ///
    /// Schemes keep no field state between solves, so this is a plain clone.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn kind(&self) -> SchemeKind {
        self.configuration().kind
    }

    pub fn configuration(&self) -> &SchemeConfiguration {
        match self {
            Scheme::Explicit(s) => s.configuration(),
            Scheme::Implicit(s) => s.configuration(),
            Scheme::Mixed(s) => s.configuration(),
            Scheme::Adi(s) => s.configuration(),
            Scheme::MixedCoupled(s) => s.configuration(),
        }
    }

    pub fn configuration_mut(&mut self) -> &mut SchemeConfiguration {
        match self {
            Scheme::Explicit(s) => s.configuration_mut(),
            Scheme::Implicit(s) => s.configuration_mut(),
            Scheme::Mixed(s) => s.configuration_mut(),
            Scheme::Adi(s) => s.configuration_mut(),
            Scheme::MixedCoupled(s) => s.configuration_mut(),
        }
    }

    /// Set the dimensionless time limit
    pub fn set_time_limit(&mut self, time_limit: f64) {
        self.configuration_mut().time_limit = time_limit;
    }

    fn inner(&mut self) -> &mut dyn Solver {
        match self {
            Scheme::Explicit(s) => s,
            Scheme::Implicit(s) => s,
            Scheme::Mixed(s) => s,
            Scheme::Adi(s) => s,
            Scheme::MixedCoupled(s) => s,
        }
    }
}

impl Solver for Scheme {
    fn solve(&mut self, problem: &Problem, cancel: &CancellationToken) -> Result<HeatingCurve, SolverError> {
        self.inner().solve(problem, cancel)
    }

    fn name(&self) -> &'static str {
        match self {
            Scheme::Explicit(s) => s.name(),
            Scheme::Implicit(s) => s.name(),
            Scheme::Mixed(s) => s.name(),
            Scheme::Adi(s) => s.name(),
            Scheme::MixedCoupled(s) => s.name(),
        }
    }

    fn supports(&self, problem: &Problem) -> bool {
        match self {
            Scheme::Explicit(s) => s.supports(problem),
            Scheme::Implicit(s) => s.supports(problem),
            Scheme::Mixed(s) => s.supports(problem),
            Scheme::Adi(s) => s.supports(problem),
            Scheme::MixedCoupled(s) => s.supports(problem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Dimension, ProblemKind};
    use crate::rte::{ConvolutionKind, DerivativeMode, NonscatteringConfiguration, RteConfiguration, RteSolverKind};

    #[test]
    fn test_factory_matches_kind() {
        for kind in [
            SchemeKind::Explicit,
            SchemeKind::Implicit,
            SchemeKind::Mixed,
            SchemeKind::Adi,
            SchemeKind::MixedCoupled,
        ] {
            let scheme = Scheme::from_configuration(SchemeConfiguration::new(kind)).unwrap();
            assert_eq!(scheme.kind(), kind);
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = SchemeConfiguration::new(SchemeKind::Implicit).with_tau_factor(-1.0);
        assert!(matches!(
            Scheme::from_configuration(config),
            Err(SolverError::InvalidConfiguration(_))
        ));

        let nonscattering = NonscatteringConfiguration {
            convolution: ConvolutionKind::Simpson,
            derivatives: DerivativeMode::Analytical,
            ..Default::default()
        };
        let rte = RteConfiguration {
            solver: RteSolverKind::Nonscattering,
            nonscattering,
            ..Default::default()
        };
        let config = SchemeConfiguration::new(SchemeKind::MixedCoupled).with_rte(rte);
        assert!(Scheme::from_configuration(config).is_err());
    }

    #[test]
    fn test_supported_problems() {
        let linear = Problem::new(ProblemKind::Linearised, Dimension::One);
        let nonlinear = Problem::new(ProblemKind::Nonlinear, Dimension::One);
        let planar = Problem::new(ProblemKind::Linearised, Dimension::Two);
        let medium = Problem::new(ProblemKind::ParticipatingMedium, Dimension::One);

        let scheme = |kind| Scheme::from_configuration(SchemeConfiguration::new(kind)).unwrap();
        assert!(scheme(SchemeKind::Explicit).supports(&linear));
        assert!(!scheme(SchemeKind::Explicit).supports(&nonlinear));
        assert!(scheme(SchemeKind::Implicit).supports(&nonlinear));
        assert!(!scheme(SchemeKind::Mixed).supports(&planar));
        assert!(scheme(SchemeKind::Adi).supports(&planar));
        assert!(scheme(SchemeKind::MixedCoupled).supports(&medium));
        assert!(!scheme(SchemeKind::MixedCoupled).supports(&linear));
    }

    #[test]
    fn test_copy_and_time_limit() {
        let mut scheme = Scheme::default();
        scheme.set_time_limit(2.5);
        let copy = scheme.copy();
        assert_eq!(copy.configuration().time_limit, 2.5);
        assert_eq!(copy, scheme);
    }

    #[test]
    fn test_solve_twice_is_identical() {
        let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
        problem.curve_mut().set_num_points(40);
        let mut scheme = Scheme::default();
        let token = CancellationToken::new();
        let first = scheme.solve(&problem, &token).unwrap();
        let second = scheme.solve(&problem, &token).unwrap();
        assert_eq!(first, second);
    }
}
