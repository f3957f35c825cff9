//! Forecasting by classical decomposition plus trend extrapolation.
//!
//! Decomposes the series into trend + weekly seasonal + residual, fits a
//! straight line to the trend component, extrapolates it forward, and
//! repeats the last full seasonal cycle across the horizon.

use std::collections::HashMap;

use crate::core::{DailySeries, ForecastResult};
use crate::error::Result;
use crate::models::{check_fit_input, residuals_from, ForecastModel};
use crate::utils::decompose::decompose_additive;
use crate::utils::polyfit::{polyfit, polyval};
use crate::utils::stats::nan_sample_std;

const MIN_POINTS: usize = 21;
const SEASONAL_PERIOD: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalDecomposition;

impl SeasonalDecomposition {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastModel for SeasonalDecomposition {
    fn name(&self) -> &'static str {
        "Seasonal Decomposition"
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

        let decomposition = decompose_additive(values, SEASONAL_PERIOD)?;

        // The defined trend values form one contiguous interior run; fit a
        // line against their own 0-based index, exactly as they sit.
        let defined_trend: Vec<f64> = decomposition
            .trend
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .collect();
        let x: Vec<f64> = (0..defined_trend.len()).map(|i| i as f64).collect();
        let coefficients = polyfit(&x, &defined_trend, 1)?;

        // Extrapolated trend plus the last full seasonal cycle, repeated.
        let cycle = &decomposition.seasonal[n - SEASONAL_PERIOD..];
        let forecast_values: Vec<f64> = (0..horizon)
            .map(|i| {
                let trend = polyval(&coefficients, (defined_trend.len() + i) as f64);
                trend + cycle[i % SEASONAL_PERIOD]
            })
            .collect();

        let fitted_values: Vec<f64> = decomposition
            .trend
            .iter()
            .zip(decomposition.seasonal.iter())
            .map(|(&t, &s)| if t.is_finite() { t + s } else { f64::NAN })
            .collect();
        let residuals = residuals_from(values, &fitted_values);
        let residual_std = nan_sample_std(&residuals);

        let mut metadata = HashMap::new();
        metadata.insert("period".to_string(), SEASONAL_PERIOD.to_string());
        metadata.insert("trend_slope".to_string(), format!("{}", coefficients[1]));

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn make_series(values: Vec<f64>) -> DailySeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len() as i64)
            .map(|i| start + Duration::days(i))
            .collect();
        DailySeries::new(dates, values).unwrap()
    }

    #[test]
    fn refuses_below_minimum() {
        let series = make_series((0..20).map(|i| i as f64).collect());
        let result = SeasonalDecomposition::new().fit_and_forecast(&series, 7, 0.95);
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 21, got: 20 })
        ));
    }

    #[test]
    fn constant_series_forecasts_constant() {
        let series = make_series(vec![250.0; 28]);
        let result = SeasonalDecomposition::new()
            .fit_and_forecast(&series, 7, 0.95)
            .unwrap();

        for &v in &result.forecast_values {
            assert_relative_eq!(v, 250.0, epsilon = 1e-6);
        }
        assert_relative_eq!(result.residual_std, 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            result.metadata["trend_slope"].parse::<f64>().unwrap(),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn linear_series_extrapolates_slope() {
        let values: Vec<f64> = (0..28).map(|i| 10.0 + 2.0 * i as f64).collect();
        let series = make_series(values);
        let result = SeasonalDecomposition::new()
            .fit_and_forecast(&series, 7, 0.95)
            .unwrap();

        let slope: f64 = result.metadata["trend_slope"].parse().unwrap();
        assert_relative_eq!(slope, 2.0, epsilon = 1e-6);

        // Trend is defined on indices 3..=24 (22 values ending at y=58);
        // extrapolation continues from the end of that run.
        for (i, &v) in result.forecast_values.iter().enumerate() {
            let expected = 58.0 + 2.0 * (i + 1) as f64;
            assert_relative_eq!(v, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn forecast_repeats_weekly_cycle() {
        let pattern = [4.0, -2.0, 1.0, -3.0, 2.0, 0.0, -2.0];
        let values: Vec<f64> = (0..35).map(|i| 100.0 + pattern[i % 7]).collect();
        let series = make_series(values);
        let result = SeasonalDecomposition::new()
            .fit_and_forecast(&series, 14, 0.95)
            .unwrap();

        // Steps one cycle apart carry the same seasonal offset; with a flat
        // trend they should match almost exactly.
        for h in 0..7 {
            assert_relative_eq!(
                result.forecast_values[h],
                result.forecast_values[h + 7],
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn boundary_positions_have_no_fit() {
        let values: Vec<f64> = (0..21).map(|i| 50.0 + i as f64).collect();
        let series = make_series(values);
        let result = SeasonalDecomposition::new()
            .fit_and_forecast(&series, 7, 0.95)
            .unwrap();

        for i in 0..3 {
            assert!(result.fitted_values[i].is_nan());
            assert!(result.fitted_values[20 - i].is_nan());
            assert!(result.residuals[i].is_nan());
        }
        for i in 3..18 {
            assert!(result.fitted_values[i].is_finite());
        }
    }
}
