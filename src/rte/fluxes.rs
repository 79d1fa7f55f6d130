//! Radiative flux fields on the heat-conduction grid

/// Net radiative flux `q` and its source term `−∂q/∂τ` at the `N + 1` nodes
///
/// The stored copies hold the values of the last converged time step; the
/// coupled scheme averages them with the current ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Fluxes {
    flux: Vec<f64>,
    stored_flux: Vec<f64>,
    derivative: Vec<f64>,
    stored_derivative: Vec<f64>,
}

impl Fluxes {
    pub fn new(density: usize) -> Self {
        Self {
            flux: vec![0.0; density + 1],
            stored_flux: vec![0.0; density + 1],
            derivative: vec![0.0; density + 1],
            stored_derivative: vec![0.0; density + 1],
        }
    }

    pub fn density(&self) -> usize {
        self.flux.len() - 1
    }

    /// Reset all fields for a grid of density `N`
    pub fn resize(&mut self, density: usize) {
        *self = Self::new(density);
    }

    pub fn flux(&self, i: usize) -> f64 {
        self.flux[i]
    }

    pub fn stored_flux(&self, i: usize) -> f64 {
        self.stored_flux[i]
    }

    /// `−∂q/∂τ` at node `i`
    pub fn derivative(&self, i: usize) -> f64 {
        self.derivative[i]
    }

    pub fn stored_derivative(&self, i: usize) -> f64 {
        self.stored_derivative[i]
    }

    /// Average of the current and the stored derivative
    pub fn mean_derivative(&self, i: usize) -> f64 {
        0.5 * (self.derivative[i] + self.stored_derivative[i])
    }

    pub fn fluxes(&self) -> &[f64] {
        &self.flux
    }

    pub fn derivatives(&self) -> &[f64] {
        &self.derivative
    }

    pub(crate) fn set_flux(&mut self, i: usize, value: f64) {
        self.flux[i] = value;
    }

    pub(crate) fn set_derivative(&mut self, i: usize, value: f64) {
        self.derivative[i] = value;
    }

    /// Copy the current fields into the stored ones
    pub fn store(&mut self) {
        self.stored_flux.copy_from_slice(&self.flux);
        self.stored_derivative.copy_from_slice(&self.derivative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_mean() {
        let mut fluxes = Fluxes::new(4);
        fluxes.set_derivative(2, 2.0);
        fluxes.set_flux(2, 1.0);
        assert_eq!(fluxes.mean_derivative(2), 1.0);
        fluxes.store();
        fluxes.set_derivative(2, 4.0);
        assert_eq!(fluxes.mean_derivative(2), 3.0);
        assert_eq!(fluxes.stored_flux(2), 1.0);
    }

    #[test]
    fn test_resize_clears() {
        let mut fluxes = Fluxes::new(4);
        fluxes.set_flux(1, 5.0);
        fluxes.resize(8);
        assert_eq!(fluxes.density(), 8);
        assert!(fluxes.fluxes().iter().all(|&q| q == 0.0));
    }
}
