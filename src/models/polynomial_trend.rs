//! Polynomial trend forecast over a 0-based day index.

use std::collections::HashMap;

use crate::core::{DailySeries, ForecastResult};
use crate::error::Result;
use crate::models::{check_fit_input, residuals_from, ForecastModel};
use crate::utils::polyfit::{polyfit, polyval};
use crate::utils::stats::nan_population_std;

const MIN_POINTS: usize = 7;
const MIN_POINTS_QUADRATIC: usize = 10;

/// Least-squares polynomial trend: quadratic when the series is long
/// enough to support curvature, linear otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolynomialTrend;

impl PolynomialTrend {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastModel for PolynomialTrend {
    fn name(&self) -> &'static str {
        "Polynomial Trend"
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

        let degree = if n >= MIN_POINTS_QUADRATIC { 2 } else { 1 };
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let coefficients = polyfit(&x, values, degree)?;

        let fitted_values: Vec<f64> = x.iter().map(|&xi| polyval(&coefficients, xi)).collect();
        let forecast_values: Vec<f64> = (0..horizon)
            .map(|i| polyval(&coefficients, (n + i) as f64))
            .collect();

        let residuals = residuals_from(values, &fitted_values);
        let residual_std = nan_population_std(&residuals);

        let mut metadata = HashMap::new();
        metadata.insert("degree".to_string(), degree.to_string());
        metadata.insert(
            "coefficients".to_string(),
            coefficients
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );

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
