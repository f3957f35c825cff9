//! Classical additive seasonal decomposition.
//!
//! Splits a series into trend + seasonal + residual the way classical
//! moving-average decomposition does: a centered moving average estimates
//! the trend, positional means of the detrended series estimate the
//! seasonal component.

use crate::error::{ForecastError, Result};
use crate::utils::stats::mean;

/// Components of an additive decomposition, each aligned to the input.
/// Trend (and therefore residual) entries are NaN where the centered
/// window does not fit.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Decompose `values` additively with the given seasonal period.
///
/// Requires at least two full cycles. The seasonal component is normalized
/// so its positional means sum to zero over one period.
pub fn decompose_additive(values: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "seasonal period must be at least 2, got {period}"
        )));
    }
    let n = values.len();
    if n < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }

    let trend = centered_moving_average(values, period);

    // Positional means of the detrended series.
    let mut position_sums = vec![0.0; period];
    let mut position_counts = vec![0usize; period];
    for (i, (&v, &t)) in values.iter().zip(trend.iter()).enumerate() {
        if t.is_finite() {
            position_sums[i % period] += v - t;
            position_counts[i % period] += 1;
        }
    }
    let mut position_means: Vec<f64> = position_sums
        .iter()
        .zip(position_counts.iter())
        .map(|(&sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect();

    // Normalize so the seasonal effects cancel over one full cycle.
    let offset = mean(&position_means);
    for s in position_means.iter_mut() {
        *s -= offset;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| position_means[i % period]).collect();
    let residual: Vec<f64> = values
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((&v, &t), &s)| v - t - s)
        .collect();

    Ok(Decomposition {
        trend,
        seasonal,
        residual,
    })
}

/// Centered moving average of the given window. For an even window the two
/// edge observations get half weight so the average stays centered.
fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut trend = vec![f64::NAN; n];

    if window % 2 == 1 {
        let half = window / 2;
        for i in half..n.saturating_sub(half) {
            let slice = &values[i - half..=i + half];
            trend[i] = slice.iter().sum::<f64>() / window as f64;
        }
    } else {
        let half = window / 2;
        for i in half..n.saturating_sub(half) {
            let mut sum = 0.5 * values[i - half] + 0.5 * values[i + half];
            for &v in &values[i - half + 1..i + half] {
                sum += v;
            }
            trend[i] = sum / window as f64;
        }
    }

    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_series_decomposes_to_flat_trend() {
        let values = vec![100.0; 21];
        let decomp = decompose_additive(&values, 7).unwrap();

        for i in 0..21 {
            if decomp.trend[i].is_finite() {
                assert_relative_eq!(decomp.trend[i], 100.0, epsilon = 1e-9);
                assert_relative_eq!(decomp.residual[i], 0.0, epsilon = 1e-9);
            }
            assert_relative_eq!(decomp.seasonal[i], 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn trend_boundary_is_undefined() {
        let values: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let decomp = decompose_additive(&values, 7).unwrap();

        // Half-window of 3 on each side for period 7.
        for i in 0..3 {
            assert!(decomp.trend[i].is_nan());
            assert!(decomp.trend[20 - i].is_nan());
        }
        for i in 3..18 {
            assert!(decomp.trend[i].is_finite());
        }
    }

    #[test]
    fn linear_series_recovers_linear_trend() {
        let values: Vec<f64> = (0..28).map(|i| 5.0 + 2.0 * i as f64).collect();
        let decomp = decompose_additive(&values, 7).unwrap();

        // Centered MA of a line is the line itself where defined.
        for i in 3..25 {
            assert_relative_eq!(decomp.trend[i], values[i], epsilon = 1e-9);
        }
        for s in &decomp.seasonal {
            assert_relative_eq!(*s, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn recovers_injected_weekly_pattern() {
        let pattern = [3.0, -1.0, 0.5, -2.0, 1.0, -0.5, -1.0];
        let values: Vec<f64> = (0..35).map(|i| 50.0 + pattern[i % 7]).collect();
        let decomp = decompose_additive(&values, 7).unwrap();

        let pattern_mean = pattern.iter().sum::<f64>() / 7.0;
        for i in 0..35 {
            assert_relative_eq!(
                decomp.seasonal[i],
                pattern[i % 7] - pattern_mean,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn seasonal_component_sums_to_zero_over_a_cycle() {
        let values: Vec<f64> = (0..28)
            .map(|i| 10.0 + i as f64 * 0.5 + if i % 7 == 2 { 4.0 } else { 0.0 })
            .collect();
        let decomp = decompose_additive(&values, 7).unwrap();

        let cycle_sum: f64 = decomp.seasonal[..7].iter().sum();
        assert_relative_eq!(cycle_sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn needs_two_full_cycles() {
        let values = vec![1.0; 13];
        assert!(matches!(
            decompose_additive(&values, 7),
            Err(ForecastError::InsufficientData { needed: 14, got: 13 })
        ));
    }

    #[test]
    fn rejects_degenerate_period() {
        assert!(matches!(
            decompose_additive(&[1.0, 2.0, 3.0, 4.0], 1),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
