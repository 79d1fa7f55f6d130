//! Ring buffer of recent objective values

use std::collections::VecDeque;

/// Recent objective values, oldest first
///
/// The search is considered converged once the buffer is full and the spread of
/// its values is small compared with their mean.
///
/// # Example
///
/// ```rust
/// use pulse_rs::search::Buffer;
///
/// let mut buffer = Buffer::new(3);
/// for value in [1.0, 1.0001, 0.9999] {
///     buffer.push(value);
/// }
/// assert!(buffer.is_converged(1e-3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    capacity: usize,
    values: VecDeque<f64>,
}

impl Buffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "a convergence buffer needs at least 2 slots");
        Self { capacity, values: VecDeque::with_capacity(capacity) }
    }

    /// Append a value, evicting the oldest one when full
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    /// Full and `(max − min) ≤ tolerance·|mean|`
    pub fn is_converged(&self, tolerance: f64) -> bool {
        if !self.is_full() {
            return false;
        }
        let (min, max) = self
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = self.mean().unwrap_or(0.0);
        max - min <= tolerance * mean.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_converged_until_full() {
        let mut buffer = Buffer::new(4);
        for _ in 0..3 {
            buffer.push(2.0);
        }
        assert!(!buffer.is_converged(1e-3));
        buffer.push(2.0);
        assert!(buffer.is_converged(1e-3));
    }

    #[test]
    fn test_oldest_value_is_evicted() {
        let mut buffer = Buffer::new(2);
        buffer.push(10.0);
        buffer.push(1.0);
        assert!(!buffer.is_converged(1e-3));
        buffer.push(1.0);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.is_converged(1e-3));
        assert_eq!(buffer.mean(), Some(1.0));
    }

    #[test]
    fn test_relative_spread() {
        let mut buffer = Buffer::new(3);
        for v in [100.0, 100.5, 99.5] {
            buffer.push(v);
        }
        // spread 1.0 against mean 100
        assert!(buffer.is_converged(1.1e-2));
        assert!(!buffer.is_converged(0.9e-2));
    }

    #[test]
    #[should_panic(expected = "at least 2 slots")]
    fn test_capacity_too_small() {
        Buffer::new(1);
    }
}
