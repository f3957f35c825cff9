//! Exponentially weighted moving average forecast.
//!
//! The forecast is a flat line at the weighted average of the most recent
//! window, with weights decaying exponentially so the newest observation
//! counts about e times as much as the oldest one in the window.

use std::collections::HashMap;

use crate::core::{DailySeries, ForecastResult};
use crate::error::Result;
use crate::models::{check_fit_input, residuals_from, ForecastModel};
use crate::utils::stats::nan_sample_std;

const MIN_POINTS: usize = 7;
const MAX_WINDOW: usize = 14;

#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMovingAverage;

impl WeightedMovingAverage {
    pub fn new() -> Self {
        Self
    }

    /// Normalized weights `exp(linspace(-1, 0, window))`, oldest first.
    fn decay_weights(window: usize) -> Vec<f64> {
        let mut weights: Vec<f64> = (0..window)
            .map(|i| (-1.0 + i as f64 / (window - 1) as f64).exp())
            .collect();
        let sum: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= sum;
        }
        weights
    }

    /// Weighted mean of `segment`, dividing by the weight total rather than
    /// trusting the weights to sum to one. The accumulation is anchored at
    /// the first value so an exactly constant window averages to exactly
    /// that constant, whatever rounding the weights carry.
    fn weighted_average(segment: &[f64], weights: &[f64]) -> f64 {
        let anchor = segment[0];
        let mut dot = 0.0;
        let mut total = 0.0;
        for (v, w) in segment.iter().zip(weights.iter()) {
            dot += w * (v - anchor);
            total += w;
        }
        anchor + dot / total
    }
}

impl ForecastModel for WeightedMovingAverage {
    fn name(&self) -> &'static str {
        "Weighted Moving Average"
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

        let window = n.min(MAX_WINDOW);
        let weights = Self::decay_weights(window);

        let weighted_avg = Self::weighted_average(&values[n - window..], &weights);
        let forecast_values = vec![weighted_avg; horizon];

        // Slide the same weighting scheme back through history; a value
        // exists once a full window is available.
        let mut fitted_values = vec![f64::NAN; n];
        for end in window..=n {
            fitted_values[end - 1] = Self::weighted_average(&values[end - window..end], &weights);
        }

        let residuals = residuals_from(values, &fitted_values);
        let residual_std = nan_sample_std(&residuals);

        let mut metadata = HashMap::new();
        metadata.insert("window".to_string(), window.to_string());
        metadata.insert("weighted_avg".to_string(), format!("{weighted_avg}"));

        Ok(ForecastResult::with_widening_intervals(
            self.name(),
            series,
            confidence_level,
            forecast_values,
            fitted_values,
            residuals,
            residual_std,
            metadata,
        ))
    }
}
