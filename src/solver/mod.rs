//! Finite-difference schemes for the laser flash problem
//!
//! This module holds **how** a [`Problem`](crate::physics::Problem) is solved:
//! grids, the discretised pulse, the tridiagonal sweep and the time-marching
//! schemes built on them.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Problem** (`physics::Problem`): WHAT to solve
//!    - Sample geometry, heat losses, optical properties
//!    - Pulse and heating curve template
//!
//! 2. **Configuration** ([`SchemeConfiguration`]): HOW to solve
//!    - Scheme kind, grid density, time factor, time limit
//!    - Weight, nonlinear precision, radiative transfer settings
//!
//! 3. **Scheme** ([`Scheme`], [`Solver`] trait): the numerical method
//!    - Marches the temperature field in time
//!    - Returns the rear-face [`HeatingCurve`](crate::physics::HeatingCurve)
//!
//! # Module Organization
//!
//! - **`grid`**: [`Grid`] and [`Grid2D`], steps `hx = 1/N` and `τ = τ_F·hx²`
//! - **`pulse`**: [`DiscretePulse`] and its radial variant
//! - **`sweep`**: Thomas algorithm shared by the implicit templates
//! - **`traits`**: [`Solver`], [`SchemeConfiguration`], [`SolverError`],
//!   [`CancellationToken`]
//! - **`scheme`**: [`Scheme`], the tagged enum built from a configuration
//! - **`methods`**: explicit, implicit, mixed, ADI and coupled schemes
//!
//! # Quick Start Example
//!
//! ```rust
//! use pulse_rs::physics::{Dimension, Problem, ProblemKind};
//! use pulse_rs::solver::{CancellationToken, Scheme, SchemeConfiguration, SchemeKind, Solver};
//!
//! // 1. WHAT: a linearised 1D problem sampled at 100 points
//! let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
//! problem.curve_mut().set_num_points(100);
//!
//! // 2. HOW: implicit scheme on 40 nodes up to t = 0.8·l²/a
//! let config = SchemeConfiguration::new(SchemeKind::Implicit)
//!     .with_grid_density(40)
//!     .with_time_limit(0.8);
//!
//! // 3. Solve
//! let mut scheme = Scheme::from_configuration(config).unwrap();
//! let curve = scheme.solve(&problem, &CancellationToken::new()).unwrap();
//!
//! // 4. The peak equals the declared maximum temperature
//! assert!((curve.apparent_maximum() - problem.max_temp()).abs() < 1e-12);
//! ```

pub mod grid;
pub mod methods;
pub mod pulse;
pub mod scheme;
pub mod sweep;
pub mod traits;

pub use grid::{Grid, Grid2D};
pub use methods::{AdiScheme, CoupledScheme, ExplicitScheme, ImplicitScheme, MixedScheme};
pub use pulse::{DiscretePulse, DiscretePulse2D};
pub use scheme::Scheme;
pub use sweep::Sweep;
pub use traits::{
    CancellationToken, SchemeConfiguration, SchemeKind, Solver, SolverError, DEFAULT_PULSE_REFINEMENT,
};
