//! Quadratures for `∫ J(s)·Eₙ(|t − s|) ds`
//!
//! Both strategies work on the fine integration mesh: `values[j]` holds `J` at
//! node `j`, the kernel distance between nodes `j` and `k` is `|j − k|·h`, and the
//! exponential integrals come from an [`ExpIntegrals`] table with step `h`.

use crate::math::ExpIntegrals;

/// Integration strategy for the exponential-integral convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolutionKind {
    /// `J` piecewise linear, `Eₙ` integrated analytically on each segment
    #[default]
    ProductIntegration,
    /// Composite Simpson rule; cannot integrate the singular `E₁` kernel
    Simpson,
}

impl ConvolutionKind {
    /// Whether the kernel `Eₙ` is finite at zero distance for this strategy
    pub fn handles_order(self, order: usize) -> bool {
        match self {
            ConvolutionKind::ProductIntegration => order + 2 <= crate::math::expint::MAX_ORDER,
            ConvolutionKind::Simpson => order >= 2,
        }
    }

    /// `∫ J(s)·Eₙ(|s_at − s|) ds` over the nodes `from..=to`
    ///
    /// The interval must not contain `at` in its interior.
    pub fn integrate(
        self,
        order: usize,
        values: &[f64],
        table: &ExpIntegrals,
        at: usize,
        from: usize,
        to: usize,
    ) -> f64 {
        if to <= from {
            return 0.0;
        }
        debug_assert!(at <= from || at >= to, "kernel singularity inside the interval");
        match self {
            ConvolutionKind::ProductIntegration => product(order, values, table, at, from, to),
            ConvolutionKind::Simpson => simpson(order, values, table, at, from, to),
        }
    }
}

fn product(order: usize, values: &[f64], table: &ExpIntegrals, at: usize, from: usize, to: usize) -> f64 {
    let h = table.step();
    let mut sum = 0.0;
    for j in from..to {
        // Kernel distance grows from `near` to `near + 1` steps across the segment
        let (near, g0, g1) = if j >= at {
            (j - at, values[j], values[j + 1])
        } else {
            (at - j - 1, values[j + 1], values[j])
        };
        let u0 = near as f64 * h;
        let u1 = u0 + h;

        let e1_0 = table.get(order + 1, near);
        let e1_1 = table.get(order + 1, near + 1);
        let zeroth = e1_0 - e1_1;
        let first = u0 * e1_0 - u1 * e1_1 + table.get(order + 2, near) - table.get(order + 2, near + 1);

        sum += g0 * zeroth + (g1 - g0) / h * (first - u0 * zeroth);
    }
    sum
}

fn simpson(order: usize, values: &[f64], table: &ExpIntegrals, at: usize, from: usize, to: usize) -> f64 {
    let h = table.step();
    let f = |j: usize| values[j] * table.get(order, j.abs_diff(at));

    let segments = to - from;
    let even = segments - segments % 2;
    let mut sum = f(from) + f(from + even);
    for j in 1..even {
        sum += if j % 2 == 1 { 4.0 } else { 2.0 } * f(from + j);
    }
    let mut integral = sum * h / 3.0;
    if even < segments {
        integral += 0.5 * h * (f(to - 1) + f(to));
    }
    integral
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::exp_integral;
    use approx::assert_relative_eq;

    fn setup(count: usize, length: f64) -> (ExpIntegrals, Vec<f64>) {
        let table = ExpIntegrals::tabulate(length / count as f64, count);
        (table, vec![1.0; count + 1])
    }

    /// `∫₀^L E₂(s) ds = E₃(0) − E₃(L)`
    #[test]
    fn test_uniform_emission_is_exact() {
        let (table, values) = setup(64, 1.5);
        let expected = 0.5 - exp_integral(3, 1.5);
        let product = ConvolutionKind::ProductIntegration.integrate(2, &values, &table, 0, 0, 64);
        assert_relative_eq!(product, expected, epsilon = 1e-12);
        let simpson = ConvolutionKind::Simpson.integrate(2, &values, &table, 0, 0, 64);
        assert_relative_eq!(simpson, expected, epsilon = 1e-4);
    }

    /// Left and right integrals mirror each other
    #[test]
    fn test_left_side_matches_right_side() {
        let (table, _) = setup(40, 1.0);
        let values: Vec<f64> = (0..=40).map(|j| 1.0 + j as f64 / 40.0).collect();
        let mirrored: Vec<f64> = values.iter().rev().copied().collect();
        let left = ConvolutionKind::ProductIntegration.integrate(2, &values, &table, 40, 0, 40);
        let right = ConvolutionKind::ProductIntegration.integrate(2, &mirrored, &table, 0, 0, 40);
        assert_relative_eq!(left, right, epsilon = 1e-12);
    }

    /// The logarithmic singularity of `E₁` is integrated exactly
    #[test]
    fn test_e1_kernel() {
        let (table, values) = setup(32, 2.0);
        let expected = 1.0 - exp_integral(2, 2.0);
        let integral = ConvolutionKind::ProductIntegration.integrate(1, &values, &table, 0, 0, 32);
        assert_relative_eq!(integral, expected, epsilon = 1e-12);
        assert!(!ConvolutionKind::Simpson.handles_order(1));
    }

    /// Linear `J` is integrated exactly by the product rule
    #[test]
    fn test_linear_emission() {
        let (table, _) = setup(20, 1.0);
        let values: Vec<f64> = (0..=20).map(|j| j as f64 / 20.0).collect();
        // ∫₀¹ s·E₂(s) ds = E₄(0) − E₃(1) − E₄(1)
        let expected = 1.0 / 3.0 - exp_integral(3, 1.0) - exp_integral(4, 1.0);
        let integral = ConvolutionKind::ProductIntegration.integrate(2, &values, &table, 0, 0, 20);
        assert_relative_eq!(integral, expected, epsilon = 1e-12);
    }
}
