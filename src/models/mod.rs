//! Forecasting models.
//!
//! All models implement [`ForecastModel`]: given a dense daily series, a
//! horizon and a confidence level, they either produce a complete
//! [`ForecastResult`] or fail with an error. Failure is an ordinary result,
//! whether caused by too little data or by a numerical problem during
//! fitting; callers pick the next model rather than unwinding.

mod holt_winters;
mod polynomial_trend;
mod seasonal_decomposition;
mod weighted_average;

pub use holt_winters::HoltWinters;
pub use polynomial_trend::PolynomialTrend;
pub use seasonal_decomposition::SeasonalDecomposition;
pub use weighted_average::WeightedMovingAverage;

use crate::core::{DailySeries, ForecastResult};
use crate::error::{ForecastError, Result};

/// Common interface for all forecasting models.
///
/// Models are stateless: one `fit_and_forecast` call carries a fit from
/// start to finish and nothing persists between calls, so a single boxed
/// instance can be reused across series and threads.
pub trait ForecastModel: Send + Sync {
    /// Stable display name.
    fn name(&self) -> &'static str;

    /// Minimum number of observations below which the model refuses to fit.
    fn min_data_points(&self) -> usize;

    /// Fit the model to `series` and forecast `horizon` days ahead with
    /// two-sided confidence bounds at `confidence_level`.
    fn fit_and_forecast(
        &self,
        series: &DailySeries,
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult>;
}

/// Type alias for boxed model trait objects.
pub type BoxedModel = Box<dyn ForecastModel>;

/// The full model set in its fixed evaluation order.
///
/// The order matters twice: backtest ties keep the earlier model, and
/// per-entity forecasting takes the first model that fits at all.
pub fn default_models() -> Vec<BoxedModel> {
    vec![
        Box::new(HoltWinters::new()),
        Box::new(SeasonalDecomposition::new()),
        Box::new(WeightedMovingAverage::new()),
        Box::new(PolynomialTrend::new()),
    ]
}

/// Shared precondition checks: enough observations, all of them finite.
pub(crate) fn check_fit_input(series: &DailySeries, needed: usize) -> Result<()> {
    if series.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: series.len(),
        });
    }
    if let Some(bad) = series.values().iter().find(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(format!(
            "non-finite observation in input series: {bad}"
        )));
    }
    Ok(())
}

/// actual - fitted, preserving NaN at undefined fitted positions.
pub(crate) fn residuals_from(actual: &[f64], fitted: &[f64]) -> Vec<f64> {
    actual
        .iter()
        .zip(fitted.iter())
        .map(|(a, f)| a - f)
        .collect()
}
