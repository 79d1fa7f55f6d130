//! Tabulated material data with linear interpolation
//!
//! Specific heat and density tables are loaded once and shared by every task
//! through [`MaterialData`](crate::tasks::MaterialData).

use crate::input::DataError;

/// Key-value table interpolated linearly between neighbouring entries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterpolationDataset {
    entries: Vec<(f64, f64)>,
}

impl InterpolationDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry keeping the keys sorted; an existing key is overwritten
    pub fn add(&mut self, key: f64, value: f64) {
        match self.entries.binary_search_by(|(k, _)| k.total_cmp(&key)) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (key, value)),
        }
    }

    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last entry whose key is strictly below `key`
    pub fn previous_to(&self, key: f64) -> Option<(f64, f64)> {
        let j = self.entries.partition_point(|(k, _)| *k < key);
        j.checked_sub(1).map(|i| self.entries[i])
    }

    /// Linear interpolation between the entries bracketing `key`
    pub fn interpolate_at(&self, key: f64) -> Result<f64, DataError> {
        let out_of_domain = || DataError::OutOfDomain {
            key,
            min: self.entries.first().map_or(f64::NAN, |e| e.0),
            max: self.entries.last().map_or(f64::NAN, |e| e.0),
        };

        let j = self.entries.partition_point(|(k, _)| *k < key);
        if let Some(&(k, v)) = self.entries.get(j)
            && k == key
        {
            return Ok(v);
        }
        if j == 0 || j == self.entries.len() {
            return Err(out_of_domain());
        }

        let (k0, v0) = self.entries[j - 1];
        let (k1, v1) = self.entries[j];
        Ok(v0 + (v1 - v0) * (key - k0) / (k1 - k0))
    }
}

impl FromIterator<(f64, f64)> for InterpolationDataset {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        let mut dataset = Self::new();
        for (k, v) in iter {
            dataset.add(k, v);
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let dataset: InterpolationDataset = [(0.0, 1.0), (10.0, 3.0)].into_iter().collect();
        assert_eq!(dataset.interpolate_at(5.0).unwrap(), 2.0);
    }

    #[test]
    fn test_exact_keys() {
        let dataset: InterpolationDataset = [(10.0, 3.0), (0.0, 1.0)].into_iter().collect();
        assert_eq!(dataset.interpolate_at(0.0).unwrap(), 1.0);
        assert_eq!(dataset.interpolate_at(10.0).unwrap(), 3.0);
    }

    #[test]
    fn test_out_of_domain() {
        let dataset: InterpolationDataset = [(0.0, 1.0), (10.0, 3.0)].into_iter().collect();
        assert!(matches!(
            dataset.interpolate_at(11.0),
            Err(DataError::OutOfDomain { .. })
        ));
        assert!(InterpolationDataset::new().interpolate_at(1.0).is_err());
    }

    #[test]
    fn test_previous_to() {
        let dataset: InterpolationDataset =
            [(0.0, 1.0), (5.0, 2.0), (10.0, 3.0)].into_iter().collect();
        assert_eq!(dataset.previous_to(5.0), Some((0.0, 1.0)));
        assert_eq!(dataset.previous_to(7.0), Some((5.0, 2.0)));
        assert_eq!(dataset.previous_to(0.0), None);
    }

    #[test]
    fn test_add_keeps_order() {
        let mut dataset = InterpolationDataset::new();
        dataset.add(3.0, 0.0);
        dataset.add(1.0, 0.0);
        dataset.add(2.0, 0.0);
        dataset.add(2.0, 9.0);
        let keys: Vec<f64> = dataset.entries().iter().map(|e| e.0).collect();
        assert_eq!(keys, vec![1.0, 2.0, 3.0]);
        assert_eq!(dataset.interpolate_at(2.0).unwrap(), 9.0);
    }
}
