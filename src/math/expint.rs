//! Exponential integrals `Eₙ(x) = ∫₁^∞ e^{−xt} t^{−n} dt`
//!
//! They are the kernels of the radiative transfer equation in a plane-parallel
//! slab: `E₂` weighs the flux of a diffuse source, `E₃` the flux leaving a
//! diffuse boundary.

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const MAX_ITERATIONS: usize = 200;
const EPS: f64 = 1e-15;
const FPMIN: f64 = 1e-300;

/// `Eₙ(x)` for `x ≥ 0`
///
/// `E₁(0)` is infinite; `Eₙ(0) = 1/(n−1)` otherwise. Uses the power series for
/// `x ≤ 1` and a continued fraction beyond.
pub fn exp_integral(n: u32, x: f64) -> f64 {
    assert!(x >= 0.0, "exponential integral needs x >= 0");
    if n == 0 {
        return (-x).exp() / x;
    }
    if x == 0.0 {
        return if n == 1 { f64::INFINITY } else { 1.0 / (n - 1) as f64 };
    }

    let nm1 = (n - 1) as f64;

    if x > 1.0 {
        let mut b = x + n as f64;
        let mut c = 1.0 / FPMIN;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_ITERATIONS {
            let i = i as f64;
            let an = -i * (nm1 + i);
            b += 2.0;
            d = 1.0 / (an * d + b);
            c = b + an / c;
            let del = c * d;
            h *= del;
            if (del - 1.0).abs() < EPS {
                break;
            }
        }
        return h * (-x).exp();
    }

    let mut ans = if n > 1 { 1.0 / nm1 } else { -x.ln() - EULER_GAMMA };
    let mut fact = 1.0;
    for i in 1..=MAX_ITERATIONS {
        fact *= -x / i as f64;
        let del = if i as u32 != n - 1 {
            -fact / (i as f64 - nm1)
        } else {
            let psi = -EULER_GAMMA + (1..n).map(|k| 1.0 / k as f64).sum::<f64>();
            fact * (-x.ln() + psi)
        };
        ans += del;
        if del.abs() < ans.abs() * EPS {
            break;
        }
    }
    ans
}

/// Highest order kept in an [`ExpIntegrals`] table
pub const MAX_ORDER: usize = 5;

/// `Eₙ(k·h)` tabulated for `n = 1..=5` and `k = 0..=count`
#[derive(Debug, Clone, PartialEq)]
pub struct ExpIntegrals {
    step: f64,
    table: Vec<Vec<f64>>,
}

impl ExpIntegrals {
    pub fn tabulate(step: f64, count: usize) -> Self {
        let table = (1..=MAX_ORDER as u32)
            .map(|n| (0..=count).map(|k| exp_integral(n, k as f64 * step)).collect())
            .collect();
        Self { step, table }
    }

    /// `Eₙ(k·step)`
    pub fn get(&self, n: usize, k: usize) -> f64 {
        self.table[n - 1][k]
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.table[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.table[0].is_empty()
    }
}
