//! Gauss–Legendre ordinate sets
//!
//! Nodes and weights on `[−1, 1]` come from the Golub–Welsch eigenvalue problem:
//! the nodes are the eigenvalues of the symmetric Jacobi matrix of the Legendre
//! recurrence and the weights are `2·v₀²`, with `v₀` the first component of each
//! normalised eigenvector.

use nalgebra::{DMatrix, SymmetricEigen};

/// Ordinate set sorted by increasing cosine `μ`
///
/// Negative ordinates come first. An odd count places `μ = 0` in the middle.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature {
    mu: Vec<f64>,
    weights: Vec<f64>,
    hemispheric: f64,
}

impl Quadrature {
    pub fn gauss_legendre(count: usize) -> Self {
        assert!(count >= 2, "a quadrature needs at least 2 ordinates");

        let jacobi = DMatrix::from_fn(count, count, |i, j| {
            if i.abs_diff(j) == 1 {
                let k = i.max(j) as f64;
                k / (4.0 * k * k - 1.0).sqrt()
            } else {
                0.0
            }
        });
        let eigen = SymmetricEigen::new(jacobi);

        let mut pairs: Vec<(f64, f64)> = (0..count)
            .map(|i| {
                let v0 = eigen.eigenvectors[(0, i)];
                (eigen.eigenvalues[i], 2.0 * v0 * v0)
            })
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (mut mu, mut weights): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

        // Enforce exact mirror symmetry
        for i in 0..count / 2 {
            let j = count - 1 - i;
            let node = 0.5 * (mu[j] - mu[i]);
            let weight = 0.5 * (weights[i] + weights[j]);
            mu[i] = -node;
            mu[j] = node;
            weights[i] = weight;
            weights[j] = weight;
        }
        if count % 2 == 1 {
            mu[count / 2] = 0.0;
        }

        let hemispheric = mu.iter().zip(&weights).filter(|(m, _)| **m > 0.0).map(|(m, w)| m * w).sum();
        Self { mu, weights, hemispheric }
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    pub fn mu(&self, k: usize) -> f64 {
        self.mu[k]
    }

    pub fn weight(&self, k: usize) -> f64 {
        self.weights[k]
    }

    pub fn nodes(&self) -> &[f64] {
        &self.mu
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `Σ_{μ>0} w·μ`; one half for an exact hemispheric moment
    pub fn hemispheric_moment(&self) -> f64 {
        self.hemispheric
    }

    /// Indices of ordinates pointing into the slab from the front wall
    pub fn positive(&self) -> std::ops::Range<usize> {
        self.len().div_ceil(2)..self.len()
    }

    /// Indices of ordinates pointing towards the front wall
    pub fn negative(&self) -> std::ops::Range<usize> {
        0..self.len() / 2
    }

    /// Index of the `μ = 0` ordinate, present for odd counts
    pub fn zero(&self) -> Option<usize> {
        (self.len() % 2 == 1).then_some(self.len() / 2)
    }
}
