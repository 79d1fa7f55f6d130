//! Search space and descent path
//!
//! The search works on normalised parameters `x = value / scale`, so that a
//! diffusivity of `1e-6 m²/s` and a Biot number of `0.1` move on comparable
//! scales. The scale of a parameter is the magnitude of its starting value, or
//! one display unit of its keyword when it starts at zero.

use nalgebra::{DMatrix, DVector};

use crate::physics::{NumericProperty, NumericPropertyKeyword, Problem, PropertyError};

/// Largest change of any normalised parameter in one iteration
pub const MAX_NORMALISED_STEP: f64 = 0.5;

/// Normalised, bounded parameter space of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    keywords: Vec<NumericPropertyKeyword>,
    scales: Vec<f64>,
    lower: DVector<f64>,
    upper: DVector<f64>,
}

impl SearchSpace {
    /// Build the space spanned by `flags` and the starting point read from `problem`
    pub fn new(
        problem: &Problem,
        flags: &[NumericPropertyKeyword],
    ) -> Result<(Self, DVector<f64>), PropertyError> {
        let mut scales = Vec::with_capacity(flags.len());
        let mut start = Vec::with_capacity(flags.len());
        for &keyword in flags {
            if keyword.is_discrete() {
                return Err(PropertyError::Unsupported(keyword));
            }
            let value = problem
                .get(keyword)
                .ok_or(PropertyError::Unsupported(keyword))?
                .value();
            let scale = if value != 0.0 {
                value.abs()
            } else {
                1.0 / keyword.definition().dimension_factor
            };
            scales.push(scale);
            start.push(value / scale);
        }

        let lower = DVector::from_iterator(flags.len(), flags.iter().zip(&scales).map(|(k, s)| k.bounds().0 / s));
        let upper = DVector::from_iterator(flags.len(), flags.iter().zip(&scales).map(|(k, s)| k.bounds().1 / s));
        let space = Self { keywords: flags.to_vec(), scales, lower, upper };
        let start = space.project(&DVector::from_vec(start));
        Ok((space, start))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[NumericPropertyKeyword] {
        &self.keywords
    }

    pub fn scale(&self, index: usize) -> f64 {
        self.scales[index]
    }

    /// Normalised bounds of component `index`
    pub fn bounds(&self, index: usize) -> (f64, f64) {
        (self.lower[index], self.upper[index])
    }

    /// Clamp every component into its bounds
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            x.len(),
            x.iter()
                .enumerate()
                .map(|(i, v)| v.clamp(self.lower[i], self.upper[i])),
        )
    }

    pub fn contains(&self, x: &DVector<f64>) -> bool {
        x.iter()
            .enumerate()
            .all(|(i, v)| *v >= self.lower[i] && *v <= self.upper[i])
    }

    /// Largest `α` keeping `x + α·d` inside the bounds, capped so that no
    /// component moves by more than [`MAX_NORMALISED_STEP`]
    pub fn max_step(&self, x: &DVector<f64>, direction: &DVector<f64>) -> f64 {
        let largest = direction.amax();
        if largest == 0.0 {
            return 0.0;
        }
        let mut alpha = MAX_NORMALISED_STEP / largest;
        for (i, &d) in direction.iter().enumerate() {
            let room = if d > 0.0 {
                (self.upper[i] - x[i]) / d
            } else if d < 0.0 {
                (self.lower[i] - x[i]) / d
            } else {
                continue;
            };
            alpha = alpha.min(room.max(0.0));
        }
        alpha
    }

    /// Drop the components of `direction` pushing an active bound outwards
    pub fn restrict(&self, x: &DVector<f64>, mut direction: DVector<f64>) -> DVector<f64> {
        for (i, d) in direction.iter_mut().enumerate() {
            if (*d < 0.0 && x[i] <= self.lower[i]) || (*d > 0.0 && x[i] >= self.upper[i]) {
                *d = 0.0;
            }
        }
        direction
    }

    /// Physical values of a normalised point
    pub fn values(&self, x: &DVector<f64>) -> Vec<f64> {
        x.iter().zip(&self.scales).map(|(v, s)| v * s).collect()
    }

    /// Write a normalised point into the problem
    pub fn apply(&self, x: &DVector<f64>, problem: &mut Problem) -> Result<(), PropertyError> {
        for (&keyword, value) in self.keywords.iter().zip(self.values(x)) {
            problem.set(keyword, NumericProperty::new(keyword, value)?)?;
        }
        Ok(())
    }
}

/// State of a descent
///
/// With Hessian tracking the path also carries an approximation of the inverse
/// Hessian, reset to identity on every [`reset`](Path::reset).
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    parameters: DVector<f64>,
    gradient: DVector<f64>,
    cost: f64,
    inverse_hessian: Option<DMatrix<f64>>,
    iteration: usize,
}

impl Path {
    pub fn new(parameters: DVector<f64>, gradient: DVector<f64>, cost: f64, track_hessian: bool) -> Self {
        let mut path = Self {
            parameters,
            gradient,
            cost,
            inverse_hessian: None,
            iteration: 0,
        };
        path.reset(track_hessian);
        path
    }

    /// Restart the descent from the current point
    pub fn reset(&mut self, track_hessian: bool) {
        let n = self.parameters.len();
        self.inverse_hessian = track_hessian.then(|| DMatrix::identity(n, n));
        self.iteration = 0;
    }

    /// Move to a new point
    pub fn advance(&mut self, parameters: DVector<f64>, gradient: DVector<f64>, cost: f64) {
        self.parameters = parameters;
        self.gradient = gradient;
        self.cost = cost;
        self.iteration += 1;
    }

    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    pub fn gradient(&self) -> &DVector<f64> {
        &self.gradient
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn inverse_hessian(&self) -> Option<&DMatrix<f64>> {
        self.inverse_hessian.as_ref()
    }

    pub fn set_inverse_hessian(&mut self, inverse_hessian: DMatrix<f64>) {
        self.inverse_hessian = Some(inverse_hessian);
    }
}
