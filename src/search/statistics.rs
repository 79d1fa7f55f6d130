//! Goodness-of-fit statistics
//!
//! All functions are pure: they take residuals (signal minus model) or parameter
//! trajectories and return a number.
//!
//! | Statistic | Definition |
//! |---|---|
//! | sum of squares | `Σ rᵢ²` |
//! | R² | `1 − RSS/TSS` |
//! | AIC | `n·ln(S) + 2(k+1) + n·(ln 2π + 1)` |
//! | KS | `sup |F_n(r) − Φ(r/s)|` with the empirical standard deviation `s` |
//! | Pearson | `cov(x, y)/(σx·σy)` |

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Penalisation term `ln(2π) + 1` of the Akaike criterion
const AIC_PENALISATION: f64 = 2.837_877_066_409_345_3;

/// Below this `λ` the Kolmogorov tail is 1 to double precision
const KOLMOGOROV_SMALL_LAMBDA: f64 = 0.2;

pub fn sum_of_squares(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Coefficient of determination of a fit
///
/// `signal` holds the measured values the residuals were computed from. A
/// constant signal has no variance to explain and gives 0.
///
/// ```rust
/// use pulse_rs::search::r_squared;
///
/// let signal = [1.0, 2.0, 3.0];
/// assert_eq!(r_squared(&[0.0, 0.0, 0.0], &signal), 1.0);
/// ```
pub fn r_squared(residuals: &[f64], signal: &[f64]) -> f64 {
    assert_eq!(residuals.len(), signal.len(), "residuals and signal must have the same length");
    if signal.is_empty() {
        return 0.0;
    }
    let mean = signal.iter().mean();
    let tss: f64 = signal.iter().map(|s| (s - mean).powi(2)).sum();
    if tss == 0.0 {
        return 0.0;
    }
    1.0 - sum_of_squares(residuals) / tss
}

/// Akaike information criterion for `n` residuals and `k` free parameters
pub fn aic(statistic: f64, n: usize, k: usize) -> f64 {
    let n = n as f64;
    n * statistic.ln() + 2.0 * (k as f64 + 1.0) + n * AIC_PENALISATION
}

/// Outcome of a Kolmogorov–Smirnov normality test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsOutcome {
    /// Largest distance between the empirical and normal CDFs
    pub statistic: f64,
    /// Asymptotic p-value
    pub probability: f64,
    /// `probability > significance`: normality is not rejected
    pub passed: bool,
}

/// Test the residuals against a zero-mean normal with their empirical deviation
///
/// Residuals without spread (or fewer than two) are accepted trivially.
pub fn ks_test(residuals: &[f64], significance: f64) -> KsOutcome {
    let n = residuals.len();
    let sd = standard_deviation(residuals);
    let normal = match Normal::new(0.0, sd) {
        Ok(normal) if n > 1 && sd > 0.0 => normal,
        _ => return KsOutcome { statistic: 0.0, probability: 1.0, passed: true },
    };

    let mut sorted = residuals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let nf = n as f64;
    let statistic = sorted
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let f = normal.cdf(r);
            (f - i as f64 / nf).max((i + 1) as f64 / nf - f)
        })
        .fold(0.0, f64::max);

    let sqrt_n = nf.sqrt();
    let probability = kolmogorov_tail((sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic);
    KsOutcome { statistic, probability, passed: probability > significance }
}

/// `Q(λ) = 2 Σ (−1)^{j−1} exp(−2j²λ²)`
fn kolmogorov_tail(lambda: f64) -> f64 {
    if lambda < KOLMOGOROV_SMALL_LAMBDA {
        return 1.0;
    }
    let a = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    for j in 1..=100 {
        let term = sign * (a * (j * j) as f64).exp();
        sum += term;
        if term.abs() <= 1e-12 * sum.abs() {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Sample standard deviation (`n − 1` normalisation), zero below two values
fn standard_deviation(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    x.iter().std_dev()
}

/// Pearson product-moment correlation, `None` when either series is constant
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    assert_eq!(x.len(), y.len(), "correlated series must have the same length");
    let (sx, sy) = (standard_deviation(x), standard_deviation(y));
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((x.iter().covariance(y.iter()) / (sx * sy)).clamp(-1.0, 1.0))
}

/// Standard errors `σᵢ = sqrt(RSS/(n−k)·[(JᵀJ)⁻¹]ᵢᵢ)`
///
/// `jacobian` is `n × k`, the derivative of the model at each sample with
/// respect to each parameter. `None` when `n ≤ k` or `JᵀJ` is singular.
pub fn standard_errors(jacobian: &DMatrix<f64>, rss: f64) -> Option<DVector<f64>> {
    let (n, k) = jacobian.shape();
    if n <= k {
        return None;
    }
    let information = jacobian.transpose() * jacobian;
    let covariance = information.try_inverse()?;
    let variance = rss / (n - k) as f64;
    Some(covariance.diagonal().map(|c| (variance * c.max(0.0)).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_r_squared_limits() {
        let signal = [1.0, 3.0, 2.0, 6.0];
        assert_relative_eq!(r_squared(&[0.0; 4], &signal), 1.0);

        // residuals as large as the deviations from the mean
        let mean = 3.0;
        let residuals: Vec<f64> = signal.iter().map(|s| s - mean).collect();
        assert_relative_eq!(r_squared(&residuals, &signal), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_aic_exact_arithmetic() {
        let expected = 6.0 + 50.0 * ((2.0 * std::f64::consts::PI).ln() + 1.0);
        assert_relative_eq!(aic(1.0, 50, 2), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&x, &[4.0, 3.0, 2.0, 1.0]).unwrap(), -1.0);
        assert!(pearson(&x, &[1.0; 4]).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());

        // cov = 4/3, σx = σy = √(5/3)
        let r = pearson(&x, &[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(r, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_standard_deviation_is_the_sample_one() {
        assert_relative_eq!(standard_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), (32.0f64 / 7.0).sqrt());
        assert_eq!(standard_deviation(&[3.0]), 0.0);
        assert_eq!(standard_deviation(&[]), 0.0);
    }

    #[test]
    fn test_ks_accepts_normal_quantiles() {
        let standard = Normal::new(0.0, 1.0).unwrap();
        let residuals: Vec<f64> = (0..200)
            .map(|i| 0.01 * standard.inverse_cdf((i as f64 + 0.5) / 200.0))
            .collect();
        let outcome = ks_test(&residuals, 0.05);
        assert!(outcome.passed);
        assert!(outcome.statistic < 0.05);
    }

    #[test]
    fn test_ks_rejects_bimodal_residuals() {
        let residuals: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        let outcome = ks_test(&residuals, 0.05);
        assert!(!outcome.passed);
        assert!(outcome.statistic > 0.3);
        assert!(outcome.probability < 1e-6);
    }

    #[test]
    fn test_ks_without_spread() {
        let outcome = ks_test(&[0.5; 10], 0.05);
        assert!(outcome.passed);
        assert_eq!(outcome.probability, 1.0);
    }

    #[test]
    fn test_kolmogorov_tail_known_value() {
        // Q(1.36) is the classic 5 % critical value
        assert_relative_eq!(kolmogorov_tail(1.36), 0.0494, epsilon = 5e-4);
        assert_eq!(kolmogorov_tail(0.1), 1.0);
    }

    #[test]
    fn test_standard_error_of_a_constant() {
        // fitting y = c to n samples: σ_c = sqrt(RSS/(n−1)/n)
        let n = 10;
        let jacobian = DMatrix::from_element(n, 1, 1.0);
        let rss = 0.9;
        let errors = standard_errors(&jacobian, rss).unwrap();
        assert_relative_eq!(errors[0], (rss / 9.0 / 10.0).sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn test_standard_errors_need_more_samples_than_parameters() {
        let jacobian = DMatrix::from_element(2, 2, 1.0);
        assert!(standard_errors(&jacobian, 1.0).is_none());
        let singular = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(standard_errors(&singular, 1.0).is_none());
    }
}
