//! Holt-Winters exponential smoothing with weekly seasonality.
//!
//! Additive trend, additive weekly seasonal component. Smoothing
//! parameters are chosen by minimizing in-sample squared error over a
//! fixed grid, which keeps the fit deterministic across platforms.
//!
//! Update equations (additive):
//! - Level:    `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
//! - Trend:    `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
//! - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`

use std::collections::HashMap;

use crate::core::{DailySeries, ForecastResult};
use crate::error::Result;
use crate::models::{check_fit_input, residuals_from, ForecastModel};
use crate::utils::stats::nan_sample_std;

const MIN_POINTS: usize = 14;
const SEASONAL_PERIOD: usize = 7;

const ALPHA_GRID: [f64; 6] = [0.1, 0.2, 0.3, 0.5, 0.7, 0.9];
const BETA_GRID: [f64; 5] = [0.01, 0.05, 0.1, 0.2, 0.3];
const GAMMA_GRID: [f64; 5] = [0.05, 0.1, 0.2, 0.3, 0.5];

/// Holt-Winters forecaster with additive weekly seasonality; falls back to
/// plain Holt (trend only) when the series is too short for a full double
/// cycle of the seasonal period.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoltWinters;

/// Terminal smoothing state plus the in-sample one-step predictions.
struct SmoothedFit {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
}

impl HoltWinters {
    pub fn new() -> Self {
        Self
    }

    /// Initial state from the first seasonal cycle(s): level is the mean of
    /// the first cycle, trend the mean cycle-over-cycle change, seasonal
    /// indices the first cycle's deviations normalized to sum to zero.
    fn init_seasonal_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let level = values[..period].iter().sum::<f64>() / period as f64;

        let trend = if values.len() >= 2 * period {
            (0..period)
                .map(|i| (values[period + i] - values[i]) / period as f64)
                .sum::<f64>()
                / period as f64
        } else {
            0.0
        };

        let mut seasonals: Vec<f64> = values[..period].iter().map(|y| y - level).collect();
        let adjustment = seasonals.iter().sum::<f64>() / period as f64;
        for s in seasonals.iter_mut() {
            *s -= adjustment;
        }

        (level, trend, seasonals)
    }

    /// One full smoothing pass with seasonality. The first cycle
    /// initializes the state and has no fitted values.
    fn seasonal_pass(values: &[f64], alpha: f64, beta: f64, gamma: f64) -> SmoothedFit {
        let period = SEASONAL_PERIOD;
        let (mut level, mut trend, mut seasonals) = Self::init_seasonal_state(values, period);
        let mut fitted = vec![f64::NAN; values.len()];

        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];
            fitted[t] = level + trend + s;

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        SmoothedFit {
            level,
            trend,
            seasonals,
            fitted,
        }
    }

    /// Trend-only Holt pass. Only the first observation is warm-up.
    fn holt_pass(values: &[f64], alpha: f64, beta: f64) -> SmoothedFit {
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut fitted = vec![f64::NAN; values.len()];

        for (t, &y) in values.iter().enumerate().skip(1) {
            fitted[t] = level + trend;

            let level_prev = level;
            level = alpha * y + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
        }

        SmoothedFit {
            level,
            trend,
            seasonals: Vec::new(),
            fitted,
        }
    }

    fn sse(values: &[f64], fitted: &[f64]) -> f64 {
        values
            .iter()
            .zip(fitted.iter())
            .filter(|(_, f)| f.is_finite())
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    fn fit_seasonal(values: &[f64]) -> (SmoothedFit, f64, f64, f64) {
        let mut best: Option<(SmoothedFit, f64, f64, f64, f64)> = None;
        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                for &gamma in &GAMMA_GRID {
                    let fit = Self::seasonal_pass(values, alpha, beta, gamma);
                    let sse = Self::sse(values, &fit.fitted);
                    if best.as_ref().map_or(true, |(_, s, ..)| sse < *s) {
                        best = Some((fit, sse, alpha, beta, gamma));
                    }
                }
            }
        }
        // The grid is non-empty, so `best` is always populated.
        let (fit, _, alpha, beta, gamma) =
            best.unwrap_or_else(|| (Self::seasonal_pass(values, 0.3, 0.1, 0.1), 0.0, 0.3, 0.1, 0.1));
        (fit, alpha, beta, gamma)
    }

    fn fit_trend_only(values: &[f64]) -> (SmoothedFit, f64, f64) {
        let mut best: Option<(SmoothedFit, f64, f64, f64)> = None;
        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                let fit = Self::holt_pass(values, alpha, beta);
                let sse = Self::sse(values, &fit.fitted);
                if best.as_ref().map_or(true, |(_, s, ..)| sse < *s) {
                    best = Some((fit, sse, alpha, beta));
                }
            }
        }
        let (fit, _, alpha, beta) =
            best.unwrap_or_else(|| (Self::holt_pass(values, 0.3, 0.1), 0.0, 0.3, 0.1));
        (fit, alpha, beta)
    }
}

impl ForecastModel for HoltWinters {
    fn name(&self) -> &'static str {
        "Holt-Winters"
    }

    fn min_data_points(&self) -> usize {
        MIN_POINTS
    }

    fn fit_and_forecast(
        &self,
        series: &DailySeries,
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult> {
        check_fit_input(series, self.min_data_points())?;
        let values = series.values();
        let n = values.len();
        let seasonal = n >= 2 * SEASONAL_PERIOD;

        let mut metadata = HashMap::new();
        let (fit, forecast_values) = if seasonal {
            let (fit, alpha, beta, gamma) = Self::fit_seasonal(values);
            let forecast_values: Vec<f64> = (1..=horizon)
                .map(|h| {
                    let idx = (n + h - 1) % SEASONAL_PERIOD;
                    fit.level + h as f64 * fit.trend + fit.seasonals[idx]
                })
                .collect();
            metadata.insert("seasonal_period".to_string(), SEASONAL_PERIOD.to_string());
            metadata.insert("alpha".to_string(), format!("{alpha:.2}"));
            metadata.insert("beta".to_string(), format!("{beta:.2}"));
            metadata.insert("gamma".to_string(), format!("{gamma:.2}"));
            (fit, forecast_values)
        } else {
            let (fit, alpha, beta) = Self::fit_trend_only(values);
            let forecast_values: Vec<f64> = (1..=horizon)
                .map(|h| fit.level + h as f64 * fit.trend)
                .collect();
            metadata.insert("seasonal_period".to_string(), "none".to_string());
            metadata.insert("alpha".to_string(), format!("{alpha:.2}"));
            metadata.insert("beta".to_string(), format!("{beta:.2}"));
            (fit, forecast_values)
        };

        let residuals = residuals_from(values, &fit.fitted);
        let residual_std = nan_sample_std(&residuals);

        Ok(ForecastResult::with_widening_intervals(
            self.name(),
            series,
            confidence_level,
            forecast_values,
            fit.fitted,
            residuals,
            residual_std,
            metadata,
        ))
    }
}
