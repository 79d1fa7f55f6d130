//! Objective function of the fit
//!
//! One evaluation writes the normalised parameters into the problem, solves it
//! with the configured scheme and sums the squared residuals over the fitting
//! window. Derivatives are finite differences, one or two solves per parameter.

use nalgebra::{DMatrix, DVector};

use crate::input::ExperimentalData;
use crate::physics::{HeatingCurve, NumericPropertyKeyword, Problem};
use crate::search::path::SearchSpace;
use crate::search::statistics::sum_of_squares;
use crate::search::SearchError;
use crate::solver::{CancellationToken, Scheme, Solver};

/// Signal minus model (curve plus baseline) over the fitting window
pub fn residuals(problem: &Problem, curve: &HeatingCurve, data: &ExperimentalData) -> Vec<f64> {
    let (time, signal) = data.window();
    time.iter()
        .zip(signal)
        .map(|(&t, &s)| s - problem.model_at(curve, t))
        .collect()
}

/// Model `f(x)`: sum of squared residuals for the normalised parameters `x`
pub struct Objective<'a> {
    problem: &'a mut Problem,
    scheme: &'a mut Scheme,
    data: &'a ExperimentalData,
    cancel: &'a CancellationToken,
    space: SearchSpace,
    evaluations: usize,
}

impl<'a> Objective<'a> {
    /// Objective over `flags`, together with the starting point read from the problem
    pub fn new(
        problem: &'a mut Problem,
        scheme: &'a mut Scheme,
        data: &'a ExperimentalData,
        flags: &[NumericPropertyKeyword],
        cancel: &'a CancellationToken,
    ) -> Result<(Self, DVector<f64>), SearchError> {
        let (space, start) = SearchSpace::new(problem, flags)?;
        let objective = Self { problem, scheme, data, cancel, space, evaluations: 0 };
        Ok((objective, start))
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn data(&self) -> &ExperimentalData {
        self.data
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.cancel
    }

    /// Number of solves performed so far
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Apply `x` to the problem and solve it
    pub fn solve(&mut self, x: &DVector<f64>) -> Result<HeatingCurve, SearchError> {
        self.space.apply(x, self.problem)?;
        self.evaluations += 1;
        Ok(self.scheme.solve(self.problem, self.cancel)?)
    }

    pub fn residuals(&mut self, x: &DVector<f64>) -> Result<Vec<f64>, SearchError> {
        let curve = self.solve(x)?;
        Ok(residuals(self.problem, &curve, self.data))
    }

    pub fn evaluate(&mut self, x: &DVector<f64>) -> Result<f64, SearchError> {
        Ok(sum_of_squares(&self.residuals(x)?))
    }

    /// Finite-difference step of component `i` and whether `x ± h` stay feasible
    fn step(&self, x: &DVector<f64>, i: usize, resolution: f64) -> (f64, bool, bool) {
        let h = resolution * x[i].abs().max(1.0);
        let mut trial = x.clone();
        trial[i] = x[i] + h;
        let forward = self.space.contains(&trial);
        trial[i] = x[i] - h;
        let backward = self.space.contains(&trial);
        (h, forward, backward)
    }

    /// Gradient of `f` at `x`, central where both neighbours are feasible
    ///
    /// `cost` is `f(x)`, reused by the one-sided differences.
    pub fn gradient(
        &mut self,
        x: &DVector<f64>,
        cost: f64,
        resolution: f64,
    ) -> Result<DVector<f64>, SearchError> {
        let mut gradient = DVector::zeros(x.len());
        for i in 0..x.len() {
            self.cancel.check()?;
            let (h, forward, backward) = self.step(x, i, resolution);
            let mut trial = x.clone();
            gradient[i] = match (forward, backward) {
                (true, true) => {
                    trial[i] = x[i] + h;
                    let up = self.evaluate(&trial)?;
                    trial[i] = x[i] - h;
                    let down = self.evaluate(&trial)?;
                    (up - down) / (2.0 * h)
                }
                (true, false) => {
                    trial[i] = x[i] + h;
                    (self.evaluate(&trial)? - cost) / h
                }
                (false, true) => {
                    trial[i] = x[i] - h;
                    (cost - self.evaluate(&trial)?) / h
                }
                (false, false) => 0.0,
            };
        }
        Ok(gradient)
    }

    /// Jacobian of the model over the window with respect to the physical parameters
    ///
    /// Row `j` is a sample of the fitting window, column `i` a parameter. A
    /// parameter pinned between coincident bounds gets a zero column.
    pub fn jacobian(&mut self, x: &DVector<f64>, resolution: f64) -> Result<DMatrix<f64>, SearchError> {
        let base = self.residuals(x)?;
        let mut jacobian = DMatrix::zeros(base.len(), x.len());
        for i in 0..x.len() {
            self.cancel.check()?;
            let (h, forward, backward) = self.step(x, i, resolution);
            let h = match (forward, backward) {
                (true, _) => h,
                (false, true) => -h,
                // bound interval narrower than the step: use the room towards the far bound
                (false, false) => {
                    let (lower, upper) = self.space.bounds(i);
                    if upper - x[i] >= x[i] - lower { upper - x[i] } else { lower - x[i] }
                }
            };
            if h == 0.0 {
                continue;
            }
            let mut trial = x.clone();
            trial[i] = x[i] + h;
            let shifted = self.residuals(&trial)?;
            let dx = h * self.space.scale(i);
            for (j, (r1, r0)) in shifted.iter().zip(&base).enumerate() {
                // residual = signal − model
                jacobian[(j, i)] = -(r1 - r0) / dx;
            }
        }
        // leave the problem at x
        self.space.apply(x, self.problem)?;
        Ok(jacobian)
    }
}
