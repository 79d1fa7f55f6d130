//! Pre-pulse signal baseline
//!
//! The detector signal of a laser-flash experiment sits on a baseline that is
//! usually flat, sometimes drifting linearly. The baseline is fitted by least
//! squares to the samples recorded before the laser fires and added to the model
//! curve when it is compared with the experiment.

use crate::input::ExperimentalData;
use crate::physics::properties::{NumericProperty, NumericPropertyKeyword, PropertyError};

/// Upper time limit of the pre-pulse window (seconds)
pub const ZERO_LEFT: f64 = -1e-5;

/// Functional form of the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineType {
    #[default]
    Constant,
    Linear,
}

/// Baseline `intercept + slope·t`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Baseline {
    kind: BaselineType,
    intercept: f64,
    slope: f64,
}

impl Baseline {
    pub fn new(kind: BaselineType, intercept: f64, slope: f64) -> Self {
        let slope = match kind {
            BaselineType::Constant => 0.0,
            BaselineType::Linear => slope,
        };
        Self { kind, intercept, slope }
    }

    pub fn value_at(&self, time: f64) -> f64 {
        self.intercept + self.slope * time
    }

    pub fn kind(&self) -> BaselineType {
        self.kind
    }

    /// Change the functional form; a constant baseline drops its slope
    pub fn set_kind(&mut self, kind: BaselineType) {
        self.kind = kind;
        if kind == BaselineType::Constant {
            self.slope = 0.0;
        }
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// `[intercept, slope]`
    pub fn parameters(&self) -> [f64; 2] {
        [self.intercept, self.slope]
    }

    /// Set `[intercept, slope]`; a constant baseline ignores the slope
    pub fn set_parameters(&mut self, parameters: [f64; 2]) {
        self.intercept = parameters[0];
        self.slope = match self.kind {
            BaselineType::Constant => 0.0,
            BaselineType::Linear => parameters[1],
        };
    }

    /// Least-squares fit to the pre-pulse part of the signal
    ///
    /// Uses the samples with `t < ZERO_LEFT` that precede the lower bound of the
    /// fitting window. Without at least one such sample the baseline is unchanged;
    /// a linear fit needs two.
    pub fn fit_to(&mut self, data: &ExperimentalData) {
        self.fit_window(data, f64::NEG_INFINITY, ZERO_LEFT);
    }

    /// Least-squares fit over `range_min < t < range_max`, clipped at the window
    pub fn fit_window(&mut self, data: &ExperimentalData, range_min: f64, range_max: f64) {
        let lower = data.index_range().lower();
        let (x, y): (Vec<f64>, Vec<f64>) = data
            .time()
            .iter()
            .zip(data.signal())
            .take(lower)
            .filter(|(t, _)| **t > range_min && **t < range_max)
            .map(|(t, s)| (*t, *s))
            .unzip();

        if x.is_empty() {
            return;
        }

        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        match self.kind {
            BaselineType::Linear if x.len() > 1 => {
                let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
                let sxy: f64 = x
                    .iter()
                    .zip(&y)
                    .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
                    .sum();
                self.slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
                self.intercept = mean_y - self.slope * mean_x;
            }
            BaselineType::Linear => {}
            BaselineType::Constant => {
                self.slope = 0.0;
                self.intercept = mean_y;
            }
        }
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        match keyword {
            NumericPropertyKeyword::BaselineIntercept => {
                Some(NumericProperty::derive(keyword, self.intercept))
            }
            NumericPropertyKeyword::BaselineSlope => Some(NumericProperty::derive(keyword, self.slope)),
            _ => None,
        }
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        keyword.check(property.value())?;
        match keyword {
            NumericPropertyKeyword::BaselineIntercept => self.intercept = property.value(),
            NumericPropertyKeyword::BaselineSlope => {
                if self.kind == BaselineType::Linear {
                    self.slope = property.value();
                }
            }
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}
