//! Golden-section line search

use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::goldensectionsearch::GoldenSectionSearch;

use crate::search::SearchError;

/// Iteration cap of one line search, far above what the resolutions need
const MAX_ITERATIONS: u64 = 200;

/// Fraction of the interval where the bracket starts, `1 − (√5 − 1)/2`
const START_FRACTION: f64 = 0.381_966_011_250_105_1;

/// Accepted step along a search direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchResult {
    pub step: f64,
    pub cost: f64,
}

/// `φ(α)` seen by the one-dimensional solver
struct Line<F>(RefCell<F>);

impl<F> CostFunction for Line<F>
where
    F: FnMut(f64) -> Result<f64, SearchError>,
{
    type Param = f64;
    type Output = f64;

    fn cost(&self, alpha: &f64) -> Result<f64, Error> {
        let mut phi = self.0.borrow_mut();
        Ok((*phi)(*alpha)?)
    }
}

/// Minimise `phi` over `[0, max_step]` by golden-section bracketing
///
/// The bracket shrinks until it is narrower than `resolution` relative to the
/// step. `cost` is `phi(0)`: when no trial step beats it, the result is a zero
/// step.
///
/// # Example
///
/// ```rust
/// use pulse_rs::search::{golden_section, SearchError};
///
/// let result = golden_section(|a| Ok::<_, SearchError>((a - 0.3) * (a - 0.3)), 1.0, 1e-4, 0.09).unwrap();
/// assert!((result.step - 0.3).abs() < 1e-3);
/// ```
pub fn golden_section(
    phi: impl FnMut(f64) -> Result<f64, SearchError>,
    max_step: f64,
    resolution: f64,
    cost: f64,
) -> Result<LineSearchResult, SearchError> {
    let zero = LineSearchResult { step: 0.0, cost };
    if !(max_step > 0.0) {
        return Ok(zero);
    }

    let solver = GoldenSectionSearch::new(0.0, max_step)?.with_tolerance(resolution)?;
    let result = Executor::new(Line(RefCell::new(phi)), solver)
        .configure(|state| state.param(START_FRACTION * max_step).max_iters(MAX_ITERATIONS))
        .run()?;

    let state = result.state();
    let best = state.get_best_cost();
    match state.get_best_param() {
        Some(&step) if best < cost => Ok(LineSearchResult { step, cost: best }),
        _ => Ok(zero),
    }
}
