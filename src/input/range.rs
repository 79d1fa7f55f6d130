//! Time range of the fit and the matching index range

use crate::input::DataError;
use crate::physics::{NumericProperty, NumericPropertyKeyword, PropertyError};

/// Fitting window in seconds, `min ≤ t ≤ max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    min: f64,
    max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// The heating pulse itself is never fitted: raise the lower bound to its end
    pub fn process(&mut self, pulse_width: f64) {
        if self.min < pulse_width {
            self.min = pulse_width;
        }
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        match keyword {
            NumericPropertyKeyword::LowerBound => Some(NumericProperty::derive(keyword, self.min)),
            NumericPropertyKeyword::UpperBound => Some(NumericProperty::derive(keyword, self.max)),
            _ => None,
        }
    }

    pub fn set(
        &mut self,
        keyword: NumericPropertyKeyword,
        property: NumericProperty,
    ) -> Result<(), PropertyError> {
        keyword.require(property.keyword())?;
        match keyword {
            NumericPropertyKeyword::LowerBound => self.min = property.value(),
            NumericPropertyKeyword::UpperBound => self.max = property.value(),
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}

/// Half-open index window `[lower, upper)` over a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    lower: usize,
    upper: usize,
}

impl IndexRange {
    /// Validated index range over `len` samples
    pub fn new(lower: usize, upper: usize, len: usize) -> Result<Self, DataError> {
        if lower >= upper || upper > len {
            return Err(DataError::InvalidIndexRange { lower, upper, len });
        }
        Ok(Self { lower, upper })
    }

    /// Indices of the samples lying within `range`
    pub fn from_range(time: &[f64], range: &Range) -> Result<Self, DataError> {
        let lower = time.partition_point(|&t| t < range.min());
        let upper = time.partition_point(|&t| t <= range.max());
        Self::new(lower, upper, time.len())
    }

    /// Index of the sample closest to `value`
    pub fn closest(value: f64, time: &[f64]) -> usize {
        let j = time.partition_point(|&t| t < value);
        if j == 0 {
            0
        } else if j == time.len() {
            time.len() - 1
        } else if (time[j] - value).abs() < (value - time[j - 1]).abs() {
            j
        } else {
            j - 1
        }
    }

    pub fn lower(&self) -> usize {
        self.lower
    }

    pub fn upper(&self) -> usize {
        self.upper
    }

    pub fn len(&self) -> usize {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.upper == self.lower
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.lower..self.upper).contains(&index)
    }
}
