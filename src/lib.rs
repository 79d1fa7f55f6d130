//! pulse-rs: Laser Flash Analysis Engine
//!
//! Finite-difference heat conduction schemes, radiative transfer solvers and an
//! inverse parameter search for laser flash measurements of thermal diffusivity.
//!
//! # Architecture
//!
//! pulse-rs is built on two principles:
//!
//! 1. **Separation of physics and numerics**
//!    - The [`physics`] module states the problem: properties, pulse, baseline
//!    - The [`solver`] and [`rte`] modules solve it: finite-difference schemes
//!      and radiative transfer
//!
//! 2. **Fitting as a layer on top**
//!    - [`search`] turns "solve and compare with the measurement" into an
//!      objective and minimises it
//!    - [`tasks`] runs independent fits in parallel and collects their results
//!
//! # Quick Start
//!
//! ```rust
//! use pulse_rs::prelude::*;
//!
//! // 1. State the problem
//! let mut problem = Problem::new(ProblemKind::Linearised, Dimension::One);
//! problem.set_value(NumericPropertyKeyword::HeatLoss, 0.05).unwrap();
//!
//! // 2. Configure a scheme
//! let config = SchemeConfiguration::new(SchemeKind::Implicit).with_grid_density(30);
//! let mut scheme = Scheme::from_configuration(config).unwrap();
//!
//! // 3. Solve
//! let curve = scheme.solve(&problem, &CancellationToken::new()).unwrap();
//! assert_eq!(curve.len(), problem.curve().num_points());
//! assert!((curve.apparent_maximum() - problem.max_temp()).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`physics`]: properties, pulse, baseline, heating curve and problem statement
//! - [`input`]: experimental data, fitting window, metadata and readers
//! - [`math`]: cubic spline and exponential integrals
//! - [`solver`]: grids, discrete pulses and the finite-difference schemes
//! - [`rte`]: discrete ordinates and non-scattering radiative transfer
//! - [`search`]: objective, path optimisers, line search and statistics
//! - [`tasks`]: search tasks and the parallel task manager
//! - [`output`]: CSV export and charts

pub mod input;
pub mod math;
pub mod physics;
pub mod rte;
pub mod search;
pub mod solver;
pub mod tasks;

pub mod output;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use pulse_rs::prelude::*;
    //! ```
    pub use crate::input::{ExperimentalData, InterpolationDataset, Metadata, Range};
    pub use crate::physics::{
        Baseline, BaselineType, Dimension, HeatingCurve, NumericProperty, NumericPropertyKeyword, Problem,
        ProblemKind, Pulse, TemporalShape,
    };
    pub use crate::rte::{RadiativeTransfer, RteConfiguration, RteSolverKind, RteStatus};
    pub use crate::search::{PathOptimiserKind, SearchConfiguration};
    pub use crate::solver::{CancellationToken, Scheme, SchemeConfiguration, SchemeKind, Solver, SolverError};
    pub use crate::tasks::{Details, FitResult, MaterialData, SearchTask, TaskManager, TaskStatus};
}
