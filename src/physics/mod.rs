//! Physical description of a laser flash experiment
//!
//! This module holds **what** is computed: the problem statement, its tagged
//! numeric properties, the laser pulse, the signal baseline and the heating curve
//! produced by a scheme. **How** it is computed lives in [`crate::solver`] and
//! [`crate::rte`].
//!
//! # Core Concepts
//!
//! - **Numeric property**: keyword + SI value + optional error, validated against
//!   the keyword bounds
//! - **Problem**: property container read by schemes and written by the search
//! - **Heating curve**: rear-surface temperature sampled at `num_points` times
//!
//! # Example
//!
//! ```rust
//! use pulse_rs::physics::{HeatingCurve, Problem, ProblemKind, Dimension};
//!
//! let problem = Problem::new(ProblemKind::Linearised, Dimension::One);
//! let mut curve: HeatingCurve = problem.curve().blank();
//! curve.reset();
//! curve.add_point(0.1, 0.5);
//! assert_eq!(curve.len(), 2);
//! ```

pub mod baseline;
pub mod curve;
pub mod problem;
pub mod properties;
pub mod pulse;

pub use baseline::{Baseline, BaselineType, ZERO_LEFT};
pub use curve::HeatingCurve;
pub use problem::{Dimension, Problem, ProblemKind, PARKER_COEFFICIENT};
pub use properties::{Definition, NumericProperty, NumericPropertyKeyword, PropertyError};
pub use pulse::{Pulse, TemporalShape};
