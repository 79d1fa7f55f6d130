//! Dimensionless blackbody emission of the medium

use crate::math::CubicSpline;

/// Emissive power `J*(θ) = (1 + δθ)⁴/(4δ)` over the optical coordinate
///
/// The temperature profile is given on `N + 1` equidistant nodes spanning
/// `[0, τ0]` and interpolated with a natural cubic spline. A ghost node at `−Δ`
/// carries the linear extrapolation `2θ0 − θ1` so the front end of the spline is
/// not forced flat.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFunction {
    delta: f64,
    spline: CubicSpline,
}

impl EmissionFunction {
    pub fn new(delta: f64, optical_thickness: f64, temperatures: &[f64]) -> Self {
        assert!(temperatures.len() >= 2, "emission needs at least 2 temperature nodes");
        let n = temperatures.len() - 1;
        let step = optical_thickness / n as f64;

        let mut x = Vec::with_capacity(n + 2);
        let mut y = Vec::with_capacity(n + 2);
        x.push(-step);
        y.push(2.0 * temperatures[0] - temperatures[1]);
        for (i, &theta) in temperatures.iter().enumerate() {
            x.push(i as f64 * step);
            y.push(theta);
        }
        Self { delta, spline: CubicSpline::natural(&x, &y) }
    }

    /// `J*(θ)`
    pub fn power(&self, theta: f64) -> f64 {
        (1.0 + self.delta * theta).powi(4) / (4.0 * self.delta)
    }

    /// Interpolated temperature at the optical coordinate `τ`
    pub fn temperature_at(&self, tau: f64) -> f64 {
        self.spline.value(tau)
    }

    /// `J*` at the optical coordinate `τ`
    pub fn at(&self, tau: f64) -> f64 {
        self.power(self.temperature_at(tau))
    }
}
