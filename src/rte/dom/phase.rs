//! Scattering phase functions reduced to the ordinate set
//!
//! The discrete ordinates solver only needs the azimuthally averaged phase
//! function between pairs of ordinates, `p(μₖ, μₗ)`, normalised so that
//! `½·Σₗ wₗ·p(μₖ, μₗ) = 1`.

use ndarray::Array2;

use crate::rte::dom::quadrature::Quadrature;

/// Phase function family; the asymmetry parameter `g` comes from the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseFunctionKind {
    #[default]
    Isotropic,
    /// `1 + 3g·μ·μ'`
    LinearAnisotropic,
    /// Henyey–Greenstein, expanded in Legendre polynomials
    HenyeyGreenstein,
}

/// Legendre polynomials `P₀..=P_order` at `x`
fn legendre(order: usize, x: f64) -> Vec<f64> {
    let mut p = vec![1.0; order + 1];
    if order >= 1 {
        p[1] = x;
    }
    for l in 2..=order {
        let l_f = l as f64;
        p[l] = ((2.0 * l_f - 1.0) * x * p[l - 1] - (l_f - 1.0) * p[l - 2]) / l_f;
    }
    p
}

impl PhaseFunctionKind {
    /// Matrix `p[k, l] = p(μₖ, μₗ)` for the asymmetry parameter `g`
    pub fn matrix(self, quadrature: &Quadrature, anisotropy: f64) -> Array2<f64> {
        let n = quadrature.len();
        let mut matrix = match self {
            PhaseFunctionKind::Isotropic => Array2::ones((n, n)),
            PhaseFunctionKind::LinearAnisotropic => Array2::from_shape_fn((n, n), |(k, l)| {
                1.0 + 3.0 * anisotropy * quadrature.mu(k) * quadrature.mu(l)
            }),
            PhaseFunctionKind::HenyeyGreenstein => {
                // Terms beyond 2n − 1 are not resolved by the quadrature
                let order = 2 * n - 1;
                let polynomials: Vec<Vec<f64>> =
                    quadrature.nodes().iter().map(|&mu| legendre(order, mu)).collect();
                Array2::from_shape_fn((n, n), |(k, l)| {
                    let mut sum = 0.0;
                    let mut power = 1.0;
                    for m in 0..=order {
                        sum += (2 * m + 1) as f64 * power * polynomials[k][m] * polynomials[l][m];
                        power *= anisotropy;
                    }
                    sum
                })
            }
        };

        for k in 0..n {
            let norm: f64 = 0.5 * (0..n).map(|l| quadrature.weight(l) * matrix[[k, l]]).sum::<f64>();
            if norm > 0.0 {
                matrix.row_mut(k).mapv_inplace(|p| p / norm);
            }
        }
        matrix
    }
}
