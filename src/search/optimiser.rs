//! Gradient-based path optimisers
//!
//! # Algorithm
//!
//! Each iteration moves the descent one step:
//!
//! - **steepest descent** searches along `−∇f` with a golden-section line
//!   search over the feasible part of the direction;
//! - **BFGS** hands the point, gradient and inverse Hessian to one iteration of
//!   `argmin`'s quasi-Newton solver with a Moré–Thuente line search, and takes
//!   back the updated triple.
//!
//! The new cost is pushed into the convergence [`Buffer`]; the search stops when
//! the buffer converges or the iteration limit is hit. A BFGS step that yields
//! no decrease restarts the descent from the identity, a failed steepest-descent
//! step ends the search.
//!
//! Bounds stay outside `argmin`: [`Feasible`] clamps every trial point into the
//! search space and drops gradient components pushing an active bound outwards.

use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Executor, Gradient, LineSearch, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::BFGS;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::physics::HeatingCurve;
use crate::search::buffer::Buffer;
use crate::search::linear::golden_section;
use crate::search::objective::Objective;
use crate::search::path::Path;
use crate::search::{SearchConfiguration, SearchError};

/// Direction rule of the descent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathOptimiserKind {
    /// `d = −∇f`
    SteepestDescent,
    /// `d = −H∇f` with the BFGS inverse Hessian `H`
    #[default]
    Bfgs,
}

impl PathOptimiserKind {
    pub fn tracks_hessian(self) -> bool {
        matches!(self, PathOptimiserKind::Bfgs)
    }
}

/// The objective restricted to the search space, as `argmin` sees it
pub struct Feasible<'o, 'a> {
    objective: RefCell<&'o mut Objective<'a>>,
    resolution: f64,
    /// Last evaluated point and its cost, reused by the gradient
    last: RefCell<Option<(DVector<f64>, f64)>>,
}

impl<'o, 'a> Feasible<'o, 'a> {
    pub fn new(objective: &'o mut Objective<'a>, resolution: f64) -> Self {
        Self {
            objective: RefCell::new(objective),
            resolution,
            last: RefCell::new(None),
        }
    }

    fn point(&self, p: &[f64]) -> DVector<f64> {
        self.objective.borrow().space().project(&DVector::from_column_slice(p))
    }

    fn evaluate(&self, x: &DVector<f64>) -> Result<f64, SearchError> {
        if let Some((point, cost)) = self.last.borrow().as_ref()
            && point == x
        {
            return Ok(*cost);
        }
        let cost = self.objective.borrow_mut().evaluate(x)?;
        *self.last.borrow_mut() = Some((x.clone(), cost));
        Ok(cost)
    }
}

impl CostFunction for Feasible<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Vec<f64>) -> Result<f64, Error> {
        Ok(self.evaluate(&self.point(p))?)
    }
}

impl Gradient for Feasible<'_, '_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, p: &Vec<f64>) -> Result<Vec<f64>, Error> {
        let x = self.point(p);
        let cost = self.evaluate(&x)?;
        let mut objective = self.objective.borrow_mut();
        let gradient = objective.gradient(&x, cost, self.resolution)?;
        let descent = objective.space().restrict(&x, -gradient);
        Ok((-descent).as_slice().to_vec())
    }
}

fn to_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix.row_iter().map(|row| row.iter().copied().collect()).collect()
}

fn from_rows(rows: &[Vec<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), rows.len(), |i, j| rows[i][j])
}

/// Point reached by one iteration
struct Step {
    parameters: DVector<f64>,
    gradient: DVector<f64>,
    cost: f64,
    length: f64,
    inverse_hessian: Option<DMatrix<f64>>,
}

/// Result of a search run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best normalised parameters
    pub parameters: DVector<f64>,
    pub cost: f64,
    pub iterations: usize,
    /// The buffer converged before the iteration limit
    pub converged: bool,
    /// Solves performed, derivatives included
    pub evaluations: usize,
    /// Normalised parameters after each iteration, starting point first
    pub trajectory: Vec<DVector<f64>>,
    /// Solution at the best parameters
    pub curve: HeatingCurve,
}

/// Iterative minimiser of an [`Objective`]
#[derive(Debug, Clone, PartialEq)]
pub struct PathOptimiser {
    config: SearchConfiguration,
}

impl PathOptimiser {
    pub fn new(config: SearchConfiguration) -> Result<Self, SearchError> {
        config.validate().map_err(SearchError::InvalidConfiguration)?;
        Ok(Self { config })
    }

    pub fn configuration(&self) -> &SearchConfiguration {
        &self.config
    }

    /// Minimise the objective from the normalised point `start`
    ///
    /// On success the problem holds the best parameters found.
    pub fn optimise(
        &self,
        objective: &mut Objective<'_>,
        start: DVector<f64>,
    ) -> Result<SearchOutcome, SearchError> {
        let kind = self.config.optimiser;

        // ====== Starting point ======

        let cost = objective.evaluate(&start)?;
        let gradient = self.feasible_gradient(objective, &start, cost)?;
        let mut path = Path::new(start.clone(), gradient, cost, kind.tracks_hessian());
        let mut buffer = Buffer::new(self.config.buffer_size);
        let mut trajectory = vec![start];
        let mut iterations = 0;
        let mut converged = false;

        // ====== Descent ======

        while iterations < self.config.iteration_limit {
            objective.cancellation().check()?;
            iterations += 1;

            let step = match kind {
                PathOptimiserKind::SteepestDescent => self.steepest_descent_step(objective, &path)?,
                PathOptimiserKind::Bfgs => self.bfgs_step(objective, &path)?,
            };

            let Some(step) = step else {
                let n = path.parameters().len();
                if path.inverse_hessian().is_some_and(|h| *h != DMatrix::identity(n, n)) {
                    debug!("iteration {}: no decrease along the quasi-Newton direction, restarting", iterations);
                    path.reset(true);
                    continue;
                }
                debug!("iteration {}: no descent direction left", iterations);
                converged = true;
                break;
            };

            if let Some(h) = step.inverse_hessian {
                path.set_inverse_hessian(h);
            }
            path.advance(step.parameters.clone(), step.gradient, step.cost);
            trajectory.push(step.parameters);
            buffer.push(step.cost);

            debug!(
                "iteration {}: cost = {:.6e}, step = {:.3e}, {} solves",
                iterations,
                step.cost,
                step.length,
                objective.evaluations()
            );

            if buffer.is_converged(self.config.error_tolerance) {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!("search stopped at the iteration limit ({})", self.config.iteration_limit);
        }

        // ====== Final state ======

        let parameters = path.parameters().clone();
        let curve = objective.solve(&parameters)?;
        Ok(SearchOutcome {
            parameters,
            cost: path.cost(),
            iterations,
            converged,
            evaluations: objective.evaluations(),
            trajectory,
            curve,
        })
    }

    /// Gradient at `x` without the components pushing an active bound outwards
    fn feasible_gradient(
        &self,
        objective: &mut Objective<'_>,
        x: &DVector<f64>,
        cost: f64,
    ) -> Result<DVector<f64>, SearchError> {
        let gradient = objective.gradient(x, cost, self.config.gradient_resolution)?;
        Ok(-objective.space().restrict(x, -gradient))
    }

    /// Golden-section step along `−∇f`, `None` without decrease
    fn steepest_descent_step(
        &self,
        objective: &mut Objective<'_>,
        path: &Path,
    ) -> Result<Option<Step>, SearchError> {
        let x = path.parameters();
        let space = objective.space().clone();
        let direction = space.restrict(x, -path.gradient());
        let max_step = space.max_step(x, &direction);
        let line = golden_section(
            |alpha| objective.evaluate(&space.project(&(x + alpha * &direction))),
            max_step,
            self.config.linear_resolution,
            path.cost(),
        )?;
        if line.step == 0.0 {
            return Ok(None);
        }

        let parameters = space.project(&(x + line.step * &direction));
        let gradient = self.feasible_gradient(objective, &parameters, line.cost)?;
        Ok(Some(Step {
            parameters,
            gradient,
            cost: line.cost,
            length: line.step,
            inverse_hessian: None,
        }))
    }

    /// One `argmin` BFGS iteration from the current point, `None` without decrease
    fn bfgs_step(&self, objective: &mut Objective<'_>, path: &Path) -> Result<Option<Step>, SearchError> {
        let x = path.parameters();
        let n = x.len();
        let identity = DMatrix::identity(n, n);
        let h = path.inverse_hessian().unwrap_or(&identity);
        let space = objective.space().clone();

        let direction = space.restrict(x, -(h * path.gradient()));
        if direction.dot(path.gradient()) >= 0.0 {
            debug!("quasi-Newton direction does not descend");
            return Ok(None);
        }
        let max_step = space.max_step(x, &direction);
        if max_step <= 0.0 {
            return Ok(None);
        }

        let mut linesearch = MoreThuenteLineSearch::new().with_bounds(0.0, max_step)?;
        linesearch.initial_step_length(if max_step > 1.0 { 1.0 } else { 0.5 * max_step })?;
        let problem = Feasible::new(objective, self.config.gradient_resolution);

        let run = Executor::new(problem, BFGS::new(linesearch))
            .configure(|state| {
                state
                    .param(x.as_slice().to_vec())
                    .gradient(path.gradient().as_slice().to_vec())
                    .inv_hessian(to_rows(h))
                    .cost(path.cost())
                    .max_iters(1)
            })
            .run();
        let result = match run.map_err(SearchError::from) {
            Ok(result) => result,
            Err(SearchError::Optimiser(reason)) => {
                debug!("quasi-Newton iteration failed: {}", reason);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let state = result.state();
        let cost = state.get_cost();
        let (Some(p), Some(g), Some(hessian)) = (state.get_param(), state.get_gradient(), state.get_inv_hessian())
        else {
            return Ok(None);
        };
        if !(cost < path.cost()) {
            return Ok(None);
        }

        let parameters = space.project(&DVector::from_column_slice(p));
        Ok(Some(Step {
            length: (&parameters - x).norm(),
            parameters,
            gradient: DVector::from_column_slice(g),
            cost,
            inverse_hessian: Some(from_rows(hessian)),
        }))
    }
}
