//! Experimental heating curve and its fitting window

use crate::input::metadata::Metadata;
use crate::input::range::{IndexRange, Range};
use crate::input::DataError;
use crate::physics::Baseline;

/// Half-width of the running average used to estimate the signal maximum
const SMOOTHING_HALF_WIDTH: usize = 2;

/// Measured rear-surface signal
///
/// Time is strictly increasing and in seconds. The [`IndexRange`] marks the
/// samples `[lower, upper)` taking part in the fit; it is derived from a
/// time [`Range`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentalData {
    time: Vec<f64>,
    signal: Vec<f64>,
    range: Range,
    index_range: IndexRange,
    metadata: Metadata,
}

impl ExperimentalData {
    /// Validate and wrap a curve
    ///
    /// The initial fitting window spans all non-negative times.
    pub fn new(time: Vec<f64>, signal: Vec<f64>) -> Result<Self, DataError> {
        if time.is_empty() {
            return Err(DataError::Empty);
        }
        if time.len() != signal.len() {
            return Err(DataError::LengthMismatch { time: time.len(), signal: signal.len() });
        }
        if let Some(i) = time.iter().chain(&signal).position(|x| !x.is_finite()) {
            return Err(DataError::NonFinite(i % time.len()));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DataError::NotIncreasing(i + 1));
        }

        let last = time[time.len() - 1];
        let range = Range::new(0.0_f64.min(last), last);
        let index_range = IndexRange::from_range(&time, &range)?;

        Ok(Self { time, signal, range, index_range, metadata: Metadata::default() })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn index_range(&self) -> IndexRange {
        self.index_range
    }

    /// Replace the fitting window
    pub fn set_range(&mut self, range: Range) -> Result<(), DataError> {
        self.index_range = IndexRange::from_range(&self.time, &range)?;
        self.range = range;
        Ok(())
    }

    /// Move the lower bound past the laser pulse, as the pulse itself is not fitted
    pub fn clip_to_pulse(&mut self, pulse_width: f64) -> Result<(), DataError> {
        let mut range = self.range;
        range.process(pulse_width);
        self.set_range(range)
    }

    /// Time and signal slices of the fitting window
    pub fn window(&self) -> (&[f64], &[f64]) {
        let r = self.index_range;
        (&self.time[r.lower()..r.upper()], &self.signal[r.lower()..r.upper()])
    }

    /// Last time inside the fitting window
    pub fn time_limit(&self) -> f64 {
        self.time[self.index_range.upper() - 1]
    }

    /// Maximum of the baseline-corrected signal after light smoothing
    pub fn max_adjusted_signal(&self, baseline: &Baseline) -> f64 {
        let adjusted: Vec<f64> = self
            .time
            .iter()
            .zip(&self.signal)
            .map(|(&t, &s)| s - baseline.value_at(t))
            .collect();

        let n = adjusted.len();
        (0..n)
            .map(|i| {
                let from = i.saturating_sub(SMOOTHING_HALF_WIDTH);
                let to = (i + SMOOTHING_HALF_WIDTH + 1).min(n);
                adjusted[from..to].iter().sum::<f64>() / (to - from) as f64
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// First time at which the corrected signal reaches half its maximum
    ///
    /// Linear interpolation between the bracketing samples. `None` when the
    /// signal never rises above the baseline.
    pub fn half_rise_time(&self, baseline: &Baseline) -> Option<f64> {
        let half = 0.5 * self.max_adjusted_signal(baseline);
        if half <= 0.0 {
            return None;
        }
        let adjusted = |i: usize| self.signal[i] - baseline.value_at(self.time[i]);
        let start = self.time.partition_point(|&t| t < 0.0).max(1);
        (start..self.time.len()).find(|&i| adjusted(i) >= half).map(|i| {
            let (y0, y1) = (adjusted(i - 1), adjusted(i));
            let (t0, t1) = (self.time[i - 1], self.time[i]);
            if y1 > y0 {
                t0 + (half - y0) * (t1 - t0) / (y1 - y0)
            } else {
                t1
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_curve() -> ExperimentalData {
        let time: Vec<f64> = (0..101).map(|i| -0.1 + i as f64 * 0.01).collect();
        let signal: Vec<f64> = time.iter().map(|&t| if t < 0.0 { 0.0 } else { t.min(0.5) }).collect();
        ExperimentalData::new(time, signal).unwrap()
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(ExperimentalData::new(vec![], vec![]).unwrap_err(), DataError::Empty);
        assert!(matches!(
            ExperimentalData::new(vec![0.0, 1.0], vec![0.0]).unwrap_err(),
            DataError::LengthMismatch { .. }
        ));
        assert_eq!(
            ExperimentalData::new(vec![0.0, 1.0, 1.0], vec![0.0; 3]).unwrap_err(),
            DataError::NotIncreasing(2)
        );
        assert_eq!(
            ExperimentalData::new(vec![0.0, 1.0], vec![0.0, f64::NAN]).unwrap_err(),
            DataError::NonFinite(1)
        );
    }

    #[test]
    fn test_default_window_starts_at_zero() {
        let data = step_curve();
        let (t, _) = data.window();
        assert!(t[0] >= -1e-12);
        assert_eq!(*t.last().unwrap(), *data.time().last().unwrap());
    }

    #[test]
    fn test_clip_to_pulse() {
        let mut data = step_curve();
        data.clip_to_pulse(0.05).unwrap();
        let (t, _) = data.window();
        assert!(t[0] >= 0.05 - 1e-9, "window starts at {}", t[0]);
    }

    #[test]
    fn test_half_rise_time() {
        let data = step_curve();
        let half = data.half_rise_time(&Baseline::default()).unwrap();
        assert!((half - 0.25).abs() < 0.011, "half rise {}", half);
    }

    #[test]
    fn test_half_rise_time_of_flat_signal() {
        let data = ExperimentalData::new(vec![0.0, 1.0, 2.0], vec![0.0; 3]).unwrap();
        assert!(data.half_rise_time(&Baseline::default()).is_none());
    }
}
