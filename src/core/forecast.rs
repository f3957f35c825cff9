//! Forecast result structure shared by all models.

use crate::core::DailySeries;
use crate::utils::stats::normal_quantile;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Standardized output of a single model fit.
///
/// Immutable once constructed. `fitted_values` and `residuals` are aligned
/// to the input series; positions the model could not fit (warm-up, trend
/// boundary) hold `f64::NAN`.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Stable name of the producing model.
    pub model_name: String,
    /// Point forecast for each future step, length = horizon.
    pub forecast_values: Vec<f64>,
    /// Consecutive future dates, starting the day after the series ends.
    pub forecast_dates: Vec<NaiveDate>,
    /// Lower confidence bound per step.
    pub lower_ci: Vec<f64>,
    /// Upper confidence bound per step.
    pub upper_ci: Vec<f64>,
    /// In-sample predictions aligned to the input series (NaN = undefined).
    pub fitted_values: Vec<f64>,
    /// actual - fitted, aligned likewise.
    pub residuals: Vec<f64>,
    /// Standard deviation of the defined residuals.
    pub residual_std: f64,
    /// Confidence level the bounds were built for.
    pub confidence_level: f64,
    /// Model-specific diagnostics.
    pub metadata: HashMap<String, String>,
}

impl ForecastResult {
    /// Assemble a result with the uniform widening confidence interval.
    ///
    /// Every model shares the same interval rule so that interval widths are
    /// comparable across models:
    ///
    /// `width(step) = residual_std * z((1 + level) / 2) * sqrt(step)`
    ///
    /// i.e. uncertainty compounds with the square root of the forecast step.
    /// A non-finite `residual_std` collapses to zero width, which keeps
    /// `lower <= point <= upper` intact even for degenerate fits.
    pub(crate) fn with_widening_intervals(
        model_name: &str,
        series: &DailySeries,
        confidence_level: f64,
        forecast_values: Vec<f64>,
        fitted_values: Vec<f64>,
        residuals: Vec<f64>,
        residual_std: f64,
        metadata: HashMap<String, String>,
    ) -> Self {
        let spread = if residual_std.is_finite() {
            residual_std
        } else {
            0.0
        };
        let z = normal_quantile((1.0 + confidence_level) / 2.0);

        let horizon = forecast_values.len();
        let mut lower_ci = Vec::with_capacity(horizon);
        let mut upper_ci = Vec::with_capacity(horizon);
        for (i, &value) in forecast_values.iter().enumerate() {
            let width = spread * z * ((i + 1) as f64).sqrt();
            lower_ci.push(value - width);
            upper_ci.push(value + width);
        }

        Self {
            model_name: model_name.to_string(),
            forecast_dates: series.future_dates(horizon),
            forecast_values,
            lower_ci,
            upper_ci,
            fitted_values,
            residuals,
            residual_std: spread,
            confidence_level,
            metadata,
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.forecast_values.len()
    }
}
