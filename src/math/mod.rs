//! Numerical building blocks shared by the radiative transfer solvers

pub mod expint;
pub mod spline;

pub use expint::{exp_integral, ExpIntegrals};
pub use spline::CubicSpline;
