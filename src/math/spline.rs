//! Natural cubic spline on a non-uniform grid

/// Natural cubic spline through `(x[i], y[i])`
///
/// Second derivatives vanish at both ends. Evaluation outside the nodes
/// extrapolates with the end cubic.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline; `x` must be strictly increasing with at least 2 nodes
    pub fn natural(x: &[f64], y: &[f64]) -> Self {
        assert!(x.len() >= 2, "a spline needs at least 2 nodes");
        assert_eq!(x.len(), y.len(), "spline nodes and values differ in length");

        let n = x.len();
        let mut m = vec![0.0; n];
        if n > 2 {
            // Tridiagonal system for the interior second derivatives
            let mut c_prime = vec![0.0; n];
            let mut d_prime = vec![0.0; n];
            for i in 1..n - 1 {
                let h0 = x[i] - x[i - 1];
                let h1 = x[i + 1] - x[i];
                let a = h0 / 6.0;
                let b = (h0 + h1) / 3.0;
                let c = h1 / 6.0;
                let d = (y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0;
                let denom = b - a * c_prime[i - 1];
                c_prime[i] = c / denom;
                d_prime[i] = (d - a * d_prime[i - 1]) / denom;
            }
            for i in (1..n - 1).rev() {
                m[i] = d_prime[i] - c_prime[i] * m[i + 1];
            }
        }

        Self { x: x.to_vec(), y: y.to_vec(), m }
    }

    fn segment(&self, t: f64) -> usize {
        let j = self.x.partition_point(|&xi| xi <= t);
        j.clamp(1, self.x.len() - 1) - 1
    }

    pub fn value(&self, t: f64) -> f64 {
        let k = self.segment(t);
        let h = self.x[k + 1] - self.x[k];
        let a = (self.x[k + 1] - t) / h;
        let b = (t - self.x[k]) / h;
        a * self.y[k]
            + b * self.y[k + 1]
            + ((a * a * a - a) * self.m[k] + (b * b * b - b) * self.m[k + 1]) * h * h / 6.0
    }

    pub fn derivative(&self, t: f64) -> f64 {
        let k = self.segment(t);
        let h = self.x[k + 1] - self.x[k];
        let a = (self.x[k + 1] - t) / h;
        let b = (t - self.x[k]) / h;
        (self.y[k + 1] - self.y[k]) / h
            + ((3.0 * b * b - 1.0) * self.m[k + 1] - (3.0 * a * a - 1.0) * self.m[k]) * h / 6.0
    }

    pub fn nodes(&self) -> &[f64] {
        &self.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reproduces_nodes() {
        let x = [0.0, 0.3, 1.0, 1.4, 2.0];
        let y = [1.0, -2.0, 0.5, 0.0, 3.0];
        let s = CubicSpline::natural(&x, &y);
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(s.value(*xi), *yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_is_exact() {
        let x: Vec<f64> = (0..7).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let s = CubicSpline::natural(&x, &y);
        assert_relative_eq!(s.value(1.23), 1.46, epsilon = 1e-12);
        assert_relative_eq!(s.derivative(2.9), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_smooth_function() {
        let x: Vec<f64> = (0..=40).map(|i| i as f64 * std::f64::consts::PI / 40.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let s = CubicSpline::natural(&x, &y);
        assert_relative_eq!(s.value(1.0), 1.0_f64.sin(), epsilon = 1e-5);
        assert_relative_eq!(s.derivative(1.0), 1.0_f64.cos(), epsilon = 1e-3);
    }

    #[test]
    #[should_panic(expected = "a spline needs at least 2 nodes")]
    fn test_single_node_panics() {
        CubicSpline::natural(&[0.0], &[1.0]);
    }
}
