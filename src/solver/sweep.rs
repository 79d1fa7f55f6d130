//! Tridiagonal sweep (Thomas algorithm)
//!
//! Solves systems written in the finite-difference form
//!
//! ```text
//! −a·V[i−1] + b·V[i] − c·V[i+1] = F[i],   i = 1..N−1
//! ```
//!
//! with the boundary closure `V[0] = α₁·V[1] + β₁` supplied by the caller.
//!
//! Forward elimination produces
//!
//! ```text
//! α[i+1] = c / (b − a·α[i])
//! β[i+1] = (F[i] + a·β[i]) / (b − a·α[i])
//! ```
//!
//! and back substitution `V[i] = α[i+1]·V[i+1] + β[i+1]` runs once `V[N]` is known.

/// Constant-coefficient tridiagonal sweep
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    a: f64,
    b: f64,
    c: f64,
    alpha: Vec<f64>,
    beta: Vec<f64>,
}

impl Sweep {
    /// Sweep over `N + 1` nodes; `α` is precomputed from the front closure `α₁`
    pub fn new(density: usize, a: f64, b: f64, c: f64, alpha1: f64) -> Self {
        let mut sweep = Self { a, b, c, alpha: vec![0.0; density + 1], beta: vec![0.0; density + 1] };
        sweep.set_alpha1(alpha1);
        sweep
    }

    /// Change the front closure and recompute `α`
    pub fn set_alpha1(&mut self, alpha1: f64) {
        let n = self.alpha.len() - 1;
        self.alpha[1] = alpha1;
        for i in 1..n {
            self.alpha[i + 1] = self.c / (self.b - self.a * self.alpha[i]);
        }
    }

    pub fn alpha(&self, i: usize) -> f64 {
        self.alpha[i]
    }

    pub fn beta(&self, i: usize) -> f64 {
        self.beta[i]
    }

    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    /// Forward elimination of `β` for the right-hand side `rhs(i)`
    pub fn eliminate(&mut self, beta1: f64, mut rhs: impl FnMut(usize) -> f64) {
        let n = self.beta.len() - 1;
        self.beta[1] = beta1;
        for i in 1..n {
            self.beta[i + 1] = (rhs(i) + self.a * self.beta[i]) / (self.b - self.a * self.alpha[i]);
        }
    }

    /// Back substitution; `v[N]` must already hold the rear boundary value
    pub fn substitute(&self, v: &mut [f64]) {
        let n = self.beta.len() - 1;
        for i in (0..n).rev() {
            v[i] = self.alpha[i + 1] * v[i + 1] + self.beta[i + 1];
        }
    }
}

/// One line of a variable-coefficient system, used by the ADI half-steps
///
/// `alpha` and `beta` must have room for `n + 1` entries; `alpha[1]` and `beta[1]`
/// hold the front closure. Coefficients are read through `abc(i) -> (a, b, c)`.
pub fn eliminate_variable(
    alpha: &mut [f64],
    beta: &mut [f64],
    n: usize,
    abc: impl Fn(usize) -> (f64, f64, f64),
    rhs: impl Fn(usize) -> f64,
) {
    for i in 1..n {
        let (a, b, c) = abc(i);
        let denominator = b - a * alpha[i];
        alpha[i + 1] = c / denominator;
        beta[i + 1] = (rhs(i) + a * beta[i]) / denominator;
    }
}
