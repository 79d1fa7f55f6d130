//! Fit results and tabulated material data

use crate::input::{DataError, InterpolationDataset};
use crate::physics::{HeatingCurve, NumericProperty, NumericPropertyKeyword};
use crate::search::KsOutcome;
use crate::tasks::status::Details;

use NumericPropertyKeyword as K;

/// Temperature-dependent specific heat and density of the sample material
///
/// Shared by every task of a [`TaskManager`](crate::tasks::TaskManager). The
/// thermal conductivity of a fit follows from `λ = a·ρ·cp` at the test
/// temperature.
///
/// # Example
///
/// ```rust
/// use pulse_rs::input::InterpolationDataset;
/// use pulse_rs::tasks::MaterialData;
///
/// let cp: InterpolationDataset = [(273.0, 700.0), (373.0, 800.0)].into_iter().collect();
/// let rho: InterpolationDataset = [(273.0, 2000.0), (373.0, 2000.0)].into_iter().collect();
/// let material = MaterialData::new(cp, rho);
///
/// let lambda = material.conductivity(1e-6, 323.0).unwrap();
/// assert!((lambda - 1e-6 * 2000.0 * 750.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialData {
    specific_heat: InterpolationDataset,
    density: InterpolationDataset,
}

impl MaterialData {
    pub fn new(specific_heat: InterpolationDataset, density: InterpolationDataset) -> Self {
        Self { specific_heat, density }
    }

    pub fn specific_heat(&self) -> &InterpolationDataset {
        &self.specific_heat
    }

    pub fn density(&self) -> &InterpolationDataset {
        &self.density
    }

    /// Both tables hold data
    pub fn is_complete(&self) -> bool {
        !self.specific_heat.is_empty() && !self.density.is_empty()
    }

    /// Specific heat, density and conductivity at `temperature`
    pub fn thermal_properties(
        &self,
        diffusivity: f64,
        temperature: f64,
    ) -> Result<[NumericProperty; 3], DataError> {
        let cp = self.specific_heat.interpolate_at(temperature)?;
        let rho = self.density.interpolate_at(temperature)?;
        Ok([
            NumericProperty::derive(K::SpecificHeat, cp),
            NumericProperty::derive(K::Density, rho),
            NumericProperty::derive(K::Conductivity, diffusivity * rho * cp),
        ])
    }

    /// `λ = a·ρ(T)·cp(T)`
    pub fn conductivity(&self, diffusivity: f64, temperature: f64) -> Result<f64, DataError> {
        let [_, _, lambda] = self.thermal_properties(diffusivity, temperature)?;
        Ok(lambda.value())
    }
}

/// Outcome of a finished search task
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Fitted properties with their standard errors when available
    pub parameters: Vec<NumericProperty>,
    /// Properties derived from the fit (specific heat, density, conductivity)
    pub derived: Vec<NumericProperty>,
    pub sum_of_squares: f64,
    pub r_squared: f64,
    pub aic: f64,
    pub normality: KsOutcome,
    /// Pearson coefficient of every pair of parameter trajectories
    pub correlations: Vec<(NumericPropertyKeyword, NumericPropertyKeyword, f64)>,
    pub details: Vec<Details>,
    pub iterations: usize,
    pub converged: bool,
    /// Solution at the fitted parameters
    pub curve: HeatingCurve,
    /// Times of the fitting window
    pub time: Vec<f64>,
    /// Measured signal over the fitting window
    pub signal: Vec<f64>,
    /// Signal minus model over the fitting window
    pub residuals: Vec<f64>,
}

impl FitResult {
    /// Fitted or derived property
    pub fn get(&self, keyword: NumericPropertyKeyword) -> Option<NumericProperty> {
        self.parameters
            .iter()
            .chain(&self.derived)
            .find(|p| p.keyword() == keyword)
            .copied()
    }

    pub fn has(&self, details: Details) -> bool {
        self.details.contains(&details)
    }

    /// Model (curve plus baseline) at the window times
    pub fn model(&self) -> Vec<f64> {
        self.signal.iter().zip(&self.residuals).map(|(s, r)| s - r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn material() -> MaterialData {
        let cp = [(300.0, 500.0), (400.0, 600.0)].into_iter().collect();
        let rho = [(300.0, 4000.0), (400.0, 3900.0)].into_iter().collect();
        MaterialData::new(cp, rho)
    }

    #[test]
    fn test_thermal_properties() {
        let [cp, rho, lambda] = material().thermal_properties(2e-6, 350.0).unwrap();
        assert_relative_eq!(cp.value(), 550.0);
        assert_relative_eq!(rho.value(), 3950.0);
        assert_relative_eq!(lambda.value(), 2e-6 * 550.0 * 3950.0, epsilon = 1e-12);
        assert_eq!(lambda.keyword(), K::Conductivity);
    }

    #[test]
    fn test_outside_tabulated_range() {
        assert!(matches!(
            material().conductivity(1e-6, 500.0),
            Err(DataError::OutOfDomain { .. })
        ));
        assert!(!MaterialData::default().is_complete());
        assert!(material().is_complete());
    }
}
