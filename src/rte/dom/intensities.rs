//! Discrete intensity field `I[node, ordinate]` on the optical grid

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1};

use crate::rte::dom::quadrature::Quadrature;

/// Intensities of every ordinate at the nodes of the optical grid
///
/// The field persists between calls so that each computation starts from the
/// previous solution. Hemispheric moments are normalised by the quadrature's
/// `Σ_{μ>0} w·μ` so that diffuse radiation carries exactly its emissive power.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteIntensities {
    quadrature: Quadrature,
    phase: Array2<f64>,
    nodes: Vec<f64>,
    intensities: Array2<f64>,
    emissivity: f64,
    albedo: f64,
    initialised: bool,
}

impl DiscreteIntensities {
    pub fn new(
        quadrature: Quadrature,
        phase: Array2<f64>,
        optical_thickness: f64,
        intervals: usize,
        emissivity: f64,
        albedo: f64,
    ) -> Self {
        let nodes = (0..=intervals).map(|j| optical_thickness * j as f64 / intervals as f64).collect();
        let intensities = Array2::zeros((intervals + 1, quadrature.len()));
        Self { quadrature, phase, nodes, intensities, emissivity, albedo, initialised: false }
    }

    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn intervals(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn get(&self, node: usize, ordinate: usize) -> f64 {
        self.intensities[[node, ordinate]]
    }

    pub fn set(&mut self, node: usize, ordinate: usize, value: f64) {
        self.intensities[[node, ordinate]] = value;
    }

    pub fn row(&self, node: usize) -> ArrayView1<'_, f64> {
        self.intensities.row(node)
    }

    /// Fill with the local equilibrium intensity `J/π` on the first call
    pub fn initialise(&mut self, emission: impl Fn(f64) -> f64) {
        if self.initialised {
            return;
        }
        for (j, &tau) in self.nodes.iter().enumerate() {
            let value = emission(tau) / PI;
            self.intensities.row_mut(j).fill(value);
        }
        self.initialised = true;
    }

    /// Source function `S_k = (1 − ω)J/π + (ω/2)·Σₗ wₗ·p(k, l)·Iₗ`
    pub fn source(&self, k: usize, emission: f64, row: &[f64]) -> f64 {
        let scattered: f64 = (0..row.len())
            .map(|l| self.quadrature.weight(l) * self.phase[[k, l]] * row[l])
            .sum();
        (1.0 - self.albedo) * emission / PI + 0.5 * self.albedo * scattered
    }

    /// Intensity leaving a diffuse grey wall: `εJ/π` plus the reflected part
    ///
    /// `incoming` selects the ordinates hitting the wall.
    pub fn wall_intensity(&self, emission: f64, row: &[f64], incoming: std::ops::Range<usize>) -> f64 {
        let irradiation: f64 = incoming
            .map(|l| self.quadrature.weight(l) * self.quadrature.mu(l).abs() * row[l])
            .sum();
        self.emissivity * emission / PI
            + (1.0 - self.emissivity) * irradiation / self.quadrature.hemispheric_moment()
    }

    /// Net flux `q = (π/c)·Σ wₖμₖIₖ`, with `c = Σ_{μ>0} w·μ`
    pub fn flux(&self, row: &[f64]) -> f64 {
        let moment: f64 = (0..row.len())
            .map(|k| self.quadrature.weight(k) * self.quadrature.mu(k) * row[k])
            .sum();
        PI * moment / self.quadrature.hemispheric_moment()
    }

    /// Source term `−dq/dτ = −(π/c)·Σ wₖ(Sₖ − Iₖ)`
    pub fn flux_derivative(&self, emission: f64, row: &[f64]) -> f64 {
        let moment: f64 = (0..row.len())
            .map(|k| self.quadrature.weight(k) * (self.source(k, emission, row) - row[k]))
            .sum();
        -PI * moment / self.quadrature.hemispheric_moment()
    }

    /// Solve the `μ = 0` ordinate from the local balance `I₀ = S₀`
    pub fn update_zero_ordinate(&mut self, emission: impl Fn(f64) -> f64) {
        let Some(z) = self.quadrature.zero() else {
            return;
        };
        let diagonal = 1.0 - 0.5 * self.albedo * self.quadrature.weight(z) * self.phase[[z, z]];
        for j in 0..self.nodes.len() {
            let row = self.intensities.row(j);
            let scattered: f64 = (0..row.len())
                .filter(|&l| l != z)
                .map(|l| self.quadrature.weight(l) * self.phase[[z, l]] * row[l])
                .sum();
            let value = ((1.0 - self.albedo) * emission(self.nodes[j]) / PI
                + 0.5 * self.albedo * scattered)
                / diagonal;
            self.intensities[[j, z]] = value;
        }
    }

    /// Whether every intensity is finite and non-negative
    pub fn is_physical(&self) -> bool {
        self.intensities.iter().all(|&i| i.is_finite() && i >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rte::dom::phase::PhaseFunctionKind;
    use approx::assert_relative_eq;

    fn field(count: usize, emissivity: f64, albedo: f64) -> DiscreteIntensities {
        let quadrature = Quadrature::gauss_legendre(count);
        let phase = PhaseFunctionKind::Isotropic.matrix(&quadrature, 0.0);
        DiscreteIntensities::new(quadrature, phase, 1.0, 8, emissivity, albedo)
    }

    #[test]
    fn test_equilibrium_has_no_flux_and_no_source() {
        let mut field = field(8, 1.0, 0.4);
        field.initialise(|_| 3.0);
        let row = field.row(3).to_vec();
        assert!(field.flux(&row).abs() < 1e-14);
        assert!(field.flux_derivative(3.0, &row).abs() < 1e-12);
        assert!(field.is_physical());
    }

    #[test]
    fn test_diffuse_beam_carries_its_emissive_power() {
        let field = field(4, 1.0, 0.0);
        // Isotropic radiation J/π travelling forwards only
        let row: Vec<f64> = (0..4).map(|k| if field.quadrature().mu(k) > 0.0 { 2.0 / PI } else { 0.0 }).collect();
        assert_relative_eq!(field.flux(&row), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reflecting_wall_conserves_flux() {
        let field = field(6, 0.0, 0.0);
        let mut row = vec![0.0; 6];
        for k in field.quadrature().negative() {
            row[k] = 0.1 * (k + 1) as f64;
        }
        let reflected = field.wall_intensity(5.0, &row, field.quadrature().negative());
        for k in field.quadrature().positive() {
            row[k] = reflected;
        }
        assert!(field.flux(&row).abs() < 1e-14);
    }

    #[test]
    fn test_zero_ordinate_balance() {
        let mut field = field(5, 1.0, 0.5);
        field.initialise(|_| 1.0);
        field.set(2, 2, 0.0);
        field.update_zero_ordinate(|_| 1.0);
        assert_relative_eq!(field.get(2, 2), 1.0 / PI, epsilon = 1e-12);
    }
}
