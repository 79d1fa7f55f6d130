//! Adaptive Dormand–Prince 5(4) integration of the ordinate equations
//!
//! # Mathematical Background
//!
//! Along an ordinate the radiative transfer equation is a linear first-order ODE
//! in the optical coordinate:
//!
//! ```text
//! μ·dI/dτ = S(τ, I) − I
//! ```
//!
//! The stepping itself is `ode_solvers::Dopri5`: the 5th-order solution is
//! advanced and the embedded 4th-order one drives the step size.
//!
//! # Characteristics
//!
//! - **Order**: 5(4), 7 stages, first-same-as-last tableau
//! - **Direction**: integrates forwards or backwards (`t1 < t0`)
//! - **Failure**: more than `max_substeps` steps, step size underflow, detected
//!   stiffness or a non-finite state

use std::cell::RefCell;

use nalgebra::DVector;
use ode_solvers::dop_shared::{IntegrationError as DopriError, OutputType};
use ode_solvers::{Dopri5, System};

const SAFETY: f64 = 0.9;
const BETA: f64 = 0.04;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Why an integration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationError {
    TooManySubsteps,
    StepSizeUnderflow,
    Stiff,
    NonFinite,
}

impl From<DopriError> for IntegrationError {
    fn from(err: DopriError) -> Self {
        match err {
            DopriError::MaxNumStepReached { .. } => IntegrationError::TooManySubsteps,
            DopriError::StepSizeUnderflow { .. } => IntegrationError::StepSizeUnderflow,
            DopriError::StiffnessDetected { .. } => IntegrationError::Stiff,
        }
    }
}

/// Right-hand side `f(t, y)` behind the `System` interface
struct Rhs<F>(RefCell<F>);

impl<F> System<f64, DVector<f64>> for Rhs<F>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        let mut f = self.0.borrow_mut();
        (*f)(t, y.as_slice(), dy.as_mut_slice());
    }
}

/// Adaptive Dormand–Prince integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DormandPrince {
    pub atol: f64,
    pub rtol: f64,
    pub max_substeps: usize,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self { atol: 1e-7, rtol: 1e-5, max_substeps: 10_000 }
    }
}

impl DormandPrince {
    /// Integrate `dy/dt = f(t, y)` from `t0` to `t1` in place
    ///
    /// `step` holds the initial step magnitude and receives the mean accepted
    /// one, so consecutive calls over adjacent intervals reuse it. Returns the
    /// number of accepted steps.
    pub fn integrate<F>(
        &self,
        f: F,
        t0: f64,
        t1: f64,
        y: &mut [f64],
        step: &mut f64,
    ) -> Result<usize, IntegrationError>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let span = (t1 - t0).abs();
        if span == 0.0 || y.is_empty() {
            return Ok(0);
        }
        let initial = if *step > 0.0 { step.min(span) } else { 0.0 };
        let limit = u32::try_from(self.max_substeps).unwrap_or(u32::MAX);

        let mut solver = Dopri5::from_param(
            Rhs(RefCell::new(f)),
            t0,
            t1,
            span,
            DVector::from_column_slice(y),
            self.rtol,
            self.atol,
            SAFETY,
            BETA,
            MIN_FACTOR,
            MAX_FACTOR,
            span,
            initial,
            limit,
            limit,
            OutputType::Sparse,
        );
        let stats = solver.integrate()?;

        let last = solver.y_out().last().ok_or(IntegrationError::NonFinite)?;
        if last.iter().any(|v| !v.is_finite()) {
            return Err(IntegrationError::NonFinite);
        }
        y.copy_from_slice(last.as_slice());

        let accepted = stats.accepted_steps as usize;
        if accepted > 0 {
            *step = span / accepted as f64;
        }
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_decay() {
        let integrator = DormandPrince::default();
        let mut y = [1.0];
        let mut step = 0.1;
        let accepted = integrator
            .integrate(|_, y, dy| dy[0] = -2.0 * y[0], 0.0, 1.0, &mut y, &mut step)
            .unwrap();
        assert_relative_eq!(y[0], (-2.0f64).exp(), max_relative = 1e-5);
        assert!(accepted > 0);
        assert_relative_eq!(step, 1.0 / accepted as f64);
    }

    #[test]
    fn test_backward_integration() {
        let integrator = DormandPrince::default();
        // dy/dt = y from t = 1 back to t = 0
        let mut y = [1.0f64.exp()];
        let mut step = 0.5;
        integrator.integrate(|_, y, dy| dy[0] = y[0], 1.0, 0.0, &mut y, &mut step).unwrap();
        assert_relative_eq!(y[0], 1.0, max_relative = 1e-5);
    }

    #[test]
    fn test_relaxation_to_source() {
        // μ·dI/dτ = S − I with S = 2 and μ = 0.1 relaxes to S
        let integrator = DormandPrince::default();
        let mut y = [0.0, 0.5];
        let mut step = 1.0;
        integrator
            .integrate(
                |_, y, dy| {
                    dy[0] = (2.0 - y[0]) / 0.1;
                    dy[1] = (2.0 - y[1]) / 0.1;
                },
                0.0,
                3.0,
                &mut y,
                &mut step,
            )
            .unwrap();
        assert_relative_eq!(y[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(y[1], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_substep_limit() {
        let integrator = DormandPrince { max_substeps: 3, ..Default::default() };
        let mut y = [1.0];
        let mut step = 1e-6;
        let result = integrator.integrate(|t, _, dy| dy[0] = (50.0 * t).sin(), 0.0, 10.0, &mut y, &mut step);
        assert_eq!(result, Err(IntegrationError::TooManySubsteps));
        assert_eq!(y, [1.0]);
    }

    #[test]
    fn test_empty_span_is_a_no_op() {
        let mut y = [3.0];
        let mut step = 0.1;
        let accepted = DormandPrince::default()
            .integrate(|_, _, dy| dy[0] = 1.0, 2.0, 2.0, &mut y, &mut step)
            .unwrap();
        assert_eq!((accepted, y, step), (0, [3.0], 0.1));
    }
}
