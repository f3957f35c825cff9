//! Statistical helpers shared by the models.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile of the standard normal distribution.
///
/// `normal_quantile(0.975)` ~= 1.96, the z-score behind a two-sided 95%
/// confidence interval.
pub fn normal_quantile(p: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(standard) => standard.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Mean of a slice. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator) over the finite entries of a
/// slice, skipping NaN warm-up positions. NaN when fewer than two finite
/// entries remain.
pub fn nan_sample_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return f64::NAN;
    }
    let m = mean(&finite);
    let sum_sq: f64 = finite.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (finite.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n denominator) over the finite entries of
/// a slice. NaN when no finite entries remain.
pub fn nan_population_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    let m = mean(&finite);
    let sum_sq: f64 = finite.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / finite.len() as f64).sqrt()
}
