//! One fit of one experimental curve

use std::fmt;

use log::{info, warn};
use thiserror::Error;

use crate::input::{DataError, ExperimentalData};
use crate::physics::{NumericPropertyKeyword, Problem};
use crate::search::objective::{residuals, Objective};
use crate::search::{
    aic, ks_test, pearson, r_squared, standard_errors, sum_of_squares, PathOptimiser, SearchConfiguration,
    SearchError,
};
use crate::solver::{CancellationToken, Scheme, SchemeConfiguration, Solver, SolverError};
use crate::tasks::result::{FitResult, MaterialData};
use crate::tasks::status::Details;

use NumericPropertyKeyword as K;

/// Trajectories shorter than this are not tested for correlation
const MIN_CORRELATION_SAMPLES: usize = 3;

/// Identity of a task inside a [`TaskManager`](crate::tasks::TaskManager)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while building or running a task
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("invalid task configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no task with id {0}")]
    UnknownTask(TaskId),

    #[error("task {0} is already queued or running")]
    Busy(TaskId),

    #[error("worker pool: {0}")]
    Pool(String),
}

impl TaskError {
    /// The run stopped because its cancellation token was set
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TaskError::Solver(SolverError::Cancelled) | TaskError::Search(SearchError::Solver(SolverError::Cancelled))
        )
    }
}

/// A problem, the scheme solving it and the measurement it is fitted to
#[derive(Debug, Clone)]
pub struct SearchTask {
    problem: Problem,
    scheme: Scheme,
    data: ExperimentalData,
    search: SearchConfiguration,
}

impl SearchTask {
    /// Assemble a task, rejecting schemes that cannot solve the problem
    pub fn new(
        problem: Problem,
        scheme: SchemeConfiguration,
        data: ExperimentalData,
        search: SearchConfiguration,
    ) -> Result<Self, TaskError> {
        let scheme = Scheme::from_configuration(scheme)?;
        if !scheme.supports(&problem) {
            return Err(TaskError::Configuration(format!(
                "{} scheme cannot solve a {:?} problem in {:?}",
                scheme.name(),
                problem.kind(),
                problem.dimension()
            )));
        }
        search.validate().map_err(TaskError::Configuration)?;
        for &flag in &search.flags {
            if problem.get(flag).is_none() {
                return Err(TaskError::Configuration(format!("{} is not a property of the problem", flag)));
            }
        }
        Ok(Self { problem, scheme, data, search })
    }

    /// Task seeded from the measurement itself
    ///
    /// The shot metadata is copied into the problem, the fitting window starts
    /// after the laser pulse and the diffusivity, amplitude and baseline are
    /// estimated from the signal.
    pub fn from_data(
        mut problem: Problem,
        scheme: SchemeConfiguration,
        mut data: ExperimentalData,
        search: SearchConfiguration,
    ) -> Result<Self, TaskError> {
        problem.apply_metadata(data.metadata()).map_err(DataError::from)?;
        data.clip_to_pulse(problem.pulse().width())?;
        problem.estimate_from(&data);
        Self::new(problem, scheme, data, search)
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn data(&self) -> &ExperimentalData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ExperimentalData {
        &mut self.data
    }

    pub fn search(&self) -> &SearchConfiguration {
        &self.search
    }

    /// Fit the problem to the data
    ///
    /// On success the problem holds the fitted parameters. Without complete
    /// `material` tables the conductivity is not derived and the result carries
    /// [`Details::InsufficientDataInProblemStatement`].
    pub fn run(
        &mut self,
        cancel: &CancellationToken,
        material: Option<&MaterialData>,
    ) -> Result<FitResult, TaskError> {
        let flags = self.search.flags.clone();
        let k = flags.len();
        let n = self.data.window().0.len();
        if n < k + 2 {
            return Err(SearchError::InsufficientData { found: n, required: k + 2 }.into());
        }
        info!("fitting {} parameters to {} points with the {} scheme", k, n, self.scheme.name());

        let mut details = Vec::new();
        if (n as f64) < K::NumPoints.bounds().0 {
            details.push(Details::InsufficientDataInRange);
        }

        // ====== Search ======

        self.problem.baseline_mut().fit_to(&self.data);
        let time_limit = self.data.time_limit() / self.problem.time_factor();
        if !(time_limit > 0.0) {
            return Err(TaskError::Configuration(format!(
                "fitting window ends at {} s, before the pulse",
                self.data.time_limit()
            )));
        }
        self.scheme.set_time_limit(time_limit);

        let optimiser = PathOptimiser::new(self.search.clone())?;
        let (outcome, jacobian, space) = {
            let (mut objective, start) =
                Objective::new(&mut self.problem, &mut self.scheme, &self.data, &flags, cancel)?;
            let outcome = optimiser.optimise(&mut objective, start)?;
            let jacobian = objective.jacobian(&outcome.parameters, self.search.gradient_resolution)?;
            (outcome, jacobian, objective.space().clone())
        };

        // ====== Statistics ======

        let residuals = residuals(&self.problem, &outcome.curve, &self.data);
        let (time, signal) = self.data.window();
        let sos = sum_of_squares(&residuals);
        let normality = ks_test(&residuals, self.search.significance);
        if !normality.passed {
            details.push(Details::AbnormalDistributionOfResiduals);
        }

        let errors = standard_errors(&jacobian, sos);
        let mut parameters = Vec::with_capacity(k);
        for (i, &keyword) in space.keywords().iter().enumerate() {
            let Some(mut property) = self.problem.get(keyword) else {
                continue;
            };
            if let Some(errors) = &errors {
                property = property.with_error(errors[i]);
            }
            if !keyword.is_sensible(property.value()) && !details.contains(&Details::ParameterValuesNotSensible) {
                details.push(Details::ParameterValuesNotSensible);
            }
            parameters.push(property);
        }

        let mut correlations = Vec::new();
        if outcome.trajectory.len() >= MIN_CORRELATION_SAMPLES {
            for i in 0..k {
                for j in i + 1..k {
                    let xi: Vec<f64> = outcome.trajectory.iter().map(|x| x[i]).collect();
                    let xj: Vec<f64> = outcome.trajectory.iter().map(|x| x[j]).collect();
                    if let Some(r) = pearson(&xi, &xj) {
                        correlations.push((flags[i], flags[j], r));
                    }
                }
            }
        }
        if correlations
            .iter()
            .any(|(_, _, r)| r.abs() > self.search.correlation_threshold)
        {
            details.push(Details::SignificantCorrelationBetweenParameters);
        }

        let derived = match material.filter(|m| m.is_complete()) {
            Some(material) => {
                match material.thermal_properties(self.problem.diffusivity(), self.problem.test_temperature()) {
                    Ok(properties) => properties.to_vec(),
                    Err(err) => {
                        warn!("thermal properties not derived: {}", err);
                        details.push(Details::InsufficientDataInProblemStatement);
                        Vec::new()
                    }
                }
            }
            None => {
                details.push(Details::InsufficientDataInProblemStatement);
                Vec::new()
            }
        };

        if !outcome.converged {
            details.push(Details::MaxIterationsReached);
        }
        for finding in &details {
            warn!("fit finding: {}", finding);
        }
        if details.is_empty() {
            details.push(Details::None);
        }

        info!(
            "fit finished after {} iterations ({} solves): SOS = {:.4e}",
            outcome.iterations, outcome.evaluations, sos
        );

        Ok(FitResult {
            parameters,
            derived,
            sum_of_squares: sos,
            r_squared: r_squared(&residuals, signal),
            aic: aic(sos, n, k),
            normality,
            correlations,
            details,
            iterations: outcome.iterations,
            converged: outcome.converged,
            curve: outcome.curve,
            time: time.to_vec(),
            signal: signal.to_vec(),
            residuals,
        })
    }
}
