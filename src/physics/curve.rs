//! Heating curve: the sampled rear-surface temperature produced by a scheme

use crate::physics::properties::{NumericProperty, NumericPropertyKeyword, PropertyError};

/// Ordered `(time, temperature)` samples of a solution
///
/// Times are in seconds, temperatures in kelvin after scaling. The sample count
/// is fixed before the time-marching loop starts: [`reset`](Self::reset) stores
/// the initial point `(0, 0)` and a scheme appends `num_points − 1` more.
///
/// The time shift moves the curve along the time axis when it is compared with
/// experimental data; it does not alter the stored samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatingCurve {
    num_points: usize,
    time: Vec<f64>,
    temperature: Vec<f64>,
    time_shift: f64,
}

impl Default for HeatingCurve {
    fn default() -> Self {
        Self::new(NumericPropertyKeyword::NumPoints.default_value() as usize)
    }
}

impl HeatingCurve {
    pub fn new(num_points: usize) -> Self {
        assert!(num_points >= 2, "a heating curve needs at least 2 points");
        Self {
            num_points,
            time: Vec::with_capacity(num_points),
            temperature: Vec::with_capacity(num_points),
            time_shift: 0.0,
        }
    }

    /// Empty copy sharing point count and time shift
    pub fn blank(&self) -> Self {
        let mut curve = Self::new(self.num_points);
        curve.time_shift = self.time_shift;
        curve
    }

    /// Drop all samples and store the initial point `(0, 0)`
    pub fn reset(&mut self) {
        self.time.clear();
        self.temperature.clear();
        self.time.push(0.0);
        self.temperature.push(0.0);
    }

    pub fn add_point(&mut self, time: f64, temperature: f64) {
        debug_assert!(
            self.time.last().is_none_or(|&last| time > last),
            "heating curve times must increase"
        );
        self.time.push(time);
        self.temperature.push(temperature);
    }

    /// Multiply all temperatures by `factor`
    pub fn scale(&mut self, factor: f64) {
        self.temperature.iter_mut().for_each(|t| *t *= factor);
    }

    /// Largest sampled temperature, zero for an empty curve
    pub fn apparent_maximum(&self) -> f64 {
        self.temperature.iter().copied().fold(0.0, f64::max)
    }

    /// Scale so the peak matches `max_temperature`; flat curves are left as is
    pub fn scale_to(&mut self, max_temperature: f64) {
        let peak = self.apparent_maximum();
        if peak > 0.0 && peak.is_finite() {
            self.scale(max_temperature / peak);
        }
    }

    /// Linearly interpolated temperature at experiment time `time`
    ///
    /// The time shift is subtracted first. Before the first sample the curve is
    /// zero; past the last one it keeps the last value.
    pub fn temperature_at(&self, time: f64) -> f64 {
        let t = time - self.time_shift;
        let n = self.time.len();
        if n == 0 || t <= self.time[0] {
            return 0.0;
        }
        if t >= self.time[n - 1] {
            return self.temperature[n - 1];
        }
        let j = self.time.partition_point(|&x| x <= t);
        let (t0, t1) = (self.time[j - 1], self.time[j]);
        let (y0, y1) = (self.temperature[j - 1], self.temperature[j]);
        y0 + (y1 - y0) * (t - t0) / (t1 - t0)
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn set_num_points(&mut self, num_points: usize) {
        assert!(num_points >= 2, "a heating curve needs at least 2 points");
        self.num_points = num_points;
    }

    pub fn time_shift(&self) -> f64 {
        self.time_shift
    }

    pub fn set_time_shift(&mut self, shift: f64) {
        self.time_shift = shift;
    }

    pub fn times(&self) -> &[f64] {
        &self.time
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperature
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.time.last().copied()
    }

    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        match keyword {
            NumericPropertyKeyword::NumPoints => {
                Some(NumericProperty::derive(keyword, self.num_points as f64))
            }
            NumericPropertyKeyword::TimeShift => Some(NumericProperty::derive(keyword, self.time_shift)),
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
            NumericPropertyKeyword::NumPoints => self.set_num_points(property.as_count()),
            NumericPropertyKeyword::TimeShift => self.time_shift = property.value(),
            other => return Err(PropertyError::Unsupported(other)),
        }
        Ok(())
    }
}
