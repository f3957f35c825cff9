//! Walk-forward backtesting and accuracy-based model selection.
//!
//! The tracker holds out the most recent days of the series, trains each
//! candidate on the remainder, forecasts the holdout and compares. The
//! model with the lowest MAPE wins; the full comparison table is kept for
//! reporting.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::DailySeries;
use crate::models::{BoxedModel, ForecastModel};

/// Days withheld from training during backtests.
pub const BACKTEST_HOLDOUT_DAYS: usize = 7;

/// Backtests are always scored at this confidence level, independent of the
/// level used for the production forecast, so CI coverage is comparable
/// across runs.
const BACKTEST_CONFIDENCE_LEVEL: f64 = 0.95;

/// Forecast accuracy of one model over the backtest holdout.
#[derive(Debug, Clone, Serialize)]
pub struct AccuracyMetrics {
    pub model_name: String,
    /// Mean absolute percentage error over non-zero actuals; infinite when
    /// every actual in the holdout is zero.
    pub mape: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Percentage of day-over-day movements whose direction the forecast
    /// got right.
    pub directional_accuracy: f64,
    /// Percentage of actuals inside the forecast confidence band.
    pub ci_coverage: f64,
}

/// Outcome of a selection run: the winning model plus the full accuracy
/// table, sorted ascending by MAPE. An empty table means no model could be
/// backtested and the winner is a structural fallback, not a vetted choice.
pub struct ModelSelection<'a> {
    pub best: &'a dyn ForecastModel,
    pub metrics: Vec<AccuracyMetrics>,
}

impl ModelSelection<'_> {
    /// Whether the winner was actually validated by a backtest.
    pub fn is_validated(&self) -> bool {
        !self.metrics.is_empty()
    }
}

/// Walk-forward backtester with a fixed trailing holdout.
#[derive(Debug, Clone)]
pub struct AccuracyTracker {
    holdout: usize,
}

impl Default for AccuracyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self {
            holdout: BACKTEST_HOLDOUT_DAYS,
        }
    }

    /// Backtest one model. Returns `None` when the series is too short to
    /// both train the model and hold out the comparison window, or when the
    /// model itself fails on the training slice; a skip either way, never
    /// an error.
    pub fn evaluate(
        &self,
        model: &dyn ForecastModel,
        series: &DailySeries,
    ) -> Option<AccuracyMetrics> {
        let n = series.len();
        if n < self.holdout + model.min_data_points() {
            return None;
        }

        let train = series.head(n - self.holdout).ok()?;
        let actual = &series.values()[n - self.holdout..];

        let result = model
            .fit_and_forecast(&train, self.holdout, BACKTEST_CONFIDENCE_LEVEL)
            .ok()?;
        let predicted = &result.forecast_values[..self.holdout];
        let lower = &result.lower_ci[..self.holdout];
        let upper = &result.upper_ci[..self.holdout];

        let steps = self.holdout as f64;

        // MAPE over non-zero actuals only.
        let percentage_errors: Vec<f64> = actual
            .iter()
            .zip(predicted.iter())
            .filter(|(a, _)| **a != 0.0)
            .map(|(a, p)| ((a - p) / a).abs())
            .collect();
        let mape = if percentage_errors.is_empty() {
            f64::INFINITY
        } else {
            percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64 * 100.0
        };

        let rmse = (actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>()
            / steps)
            .sqrt();

        let mae = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (a - p).abs())
            .sum::<f64>()
            / steps;

        // Day-over-day direction, with "flat or up" counted as up.
        let directional_accuracy = if actual.len() > 1 {
            let matches = actual
                .windows(2)
                .zip(predicted.windows(2))
                .filter(|(a, p)| (a[1] - a[0] >= 0.0) == (p[1] - p[0] >= 0.0))
                .count();
            matches as f64 / (actual.len() - 1) as f64 * 100.0
        } else {
            0.0
        };

        let within = actual
            .iter()
            .zip(lower.iter().zip(upper.iter()))
            .filter(|(a, (lo, hi))| **a >= **lo && **a <= **hi)
            .count();
        let ci_coverage = within as f64 / steps * 100.0;

        debug!(
            model = model.name(),
            mape, rmse, mae, "backtest evaluation complete"
        );

        Some(AccuracyMetrics {
            model_name: model.name().to_string(),
            mape,
            rmse,
            mae,
            directional_accuracy,
            ci_coverage,
        })
    }

    /// Backtest every model and pick the lowest-MAPE winner.
    ///
    /// Ties keep the earlier model (stable sort over the input order). When
    /// no model produces a backtest result, falls back to the first model
    /// whose minimum the series meets, or failing that the last model in
    /// the list, with an empty metrics table so callers can tell the
    /// choice was never validated. Returns `None` only for an empty model
    /// slice.
    pub fn select_best<'a>(
        &self,
        models: &'a [BoxedModel],
        series: &DailySeries,
    ) -> Option<ModelSelection<'a>> {
        let mut evaluated: Vec<(usize, AccuracyMetrics)> = models
            .iter()
            .enumerate()
            .filter_map(|(i, model)| {
                self.evaluate(model.as_ref(), series).map(|m| (i, m))
            })
            .collect();

        if evaluated.is_empty() {
            let fallback = models
                .iter()
                .find(|m| series.len() >= m.min_data_points())
                .or_else(|| models.last())?;
            warn!(
                model = fallback.name(),
                "no model produced a usable backtest; falling back without validation"
            );
            return Some(ModelSelection {
                best: fallback.as_ref(),
                metrics: Vec::new(),
            });
        }

        evaluated.sort_by(|a, b| {
            a.1.mape
                .partial_cmp(&b.1.mape)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = models[evaluated[0].0].as_ref();
        let metrics = evaluated.into_iter().map(|(_, m)| m).collect();

        Some(ModelSelection { best, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DailySeries, ForecastResult};
    use crate::error::{ForecastError, Result};
    use crate::models::{default_models, WeightedMovingAverage};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn make_series(values: Vec<f64>) -> DailySeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len() as i64)
            .map(|i| start + Duration::days(i))
            .collect();
        DailySeries::new(dates, values).unwrap()
    }

    /// Test double that always refuses to fit.
    struct AlwaysFails;

    impl ForecastModel for AlwaysFails {
        fn name(&self) -> &'static str {
            "Always Fails"
        }
        fn min_data_points(&self) -> usize {
            5
        }
        fn fit_and_forecast(
            &self,
            _series: &DailySeries,
            _horizon: usize,
            _confidence_level: f64,
        ) -> Result<ForecastResult> {
            Err(ForecastError::ComputationError("nope".to_string()))
        }
    }

    #[test]
    fn evaluate_requires_holdout_plus_minimum() {
        let tracker = AccuracyTracker::new();
        let model = WeightedMovingAverage::new();

        // min 7 + holdout 7 = 14; one short must be skipped.
        let series = make_series(vec![10.0; 13]);
        assert!(tracker.evaluate(&model, &series).is_none());

        let series = make_series(vec![10.0; 14]);
        assert!(tracker.evaluate(&model, &series).is_some());
    }

    #[test]
    fn perfect_forecast_scores_perfectly() {
        let tracker = AccuracyTracker::new();
        let model = WeightedMovingAverage::new();
        let series = make_series(vec![100.0; 30]);

        let metrics = tracker.evaluate(&model, &series).unwrap();
        assert_relative_eq!(metrics.mape, 0.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-9);
        // Flat actuals and flat forecasts agree in direction everywhere.
        assert_relative_eq!(metrics.directional_accuracy, 100.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.ci_coverage, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn all_zero_holdout_gives_infinite_mape() {
        let mut values = vec![50.0; 23];
        values.extend(vec![0.0; 7]);
        let series = make_series(values);

        let tracker = AccuracyTracker::new();
        let metrics = tracker
            .evaluate(&WeightedMovingAverage::new(), &series)
            .unwrap();
        assert!(metrics.mape.is_infinite());
        // The other metrics remain finite.
        assert!(metrics.rmse.is_finite());
        assert!(metrics.mae.is_finite());
    }

    #[test]
    fn select_best_sorts_ascending_by_mape() {
        let models = default_models();
        // 40 points lets every model both train and hold out.
        let series = make_series(vec![100.0; 40]);

        let selection = AccuracyTracker::new()
            .select_best(&models, &series)
            .unwrap();
        assert_eq!(selection.metrics.len(), 4);
        for pair in selection.metrics.windows(2) {
            assert!(pair[0].mape <= pair[1].mape);
        }
        assert!(selection.is_validated());
    }

    #[test]
    fn ties_keep_declaration_order() {
        let models = default_models();
        // Constant series: every model forecasts 100 exactly, MAPE 0 across
        // the board, so the first-declared model must win.
        let series = make_series(vec![100.0; 40]);

        let selection = AccuracyTracker::new()
            .select_best(&models, &series)
            .unwrap();
        assert_eq!(selection.best.name(), "Holt-Winters");
        assert_eq!(selection.metrics[0].model_name, "Holt-Winters");
    }

    #[test]
    fn selection_is_deterministic() {
        let models = default_models();
        let values: Vec<f64> = (0..45)
            .map(|i| 120.0 + 3.0 * (i as f64 * 0.7).sin() + 0.4 * i as f64)
            .collect();
        let series = make_series(values);

        let tracker = AccuracyTracker::new();
        let first = tracker.select_best(&models, &series).unwrap();
        let second = tracker.select_best(&models, &series).unwrap();

        assert_eq!(first.best.name(), second.best.name());
        let names_a: Vec<_> = first.metrics.iter().map(|m| &m.model_name).collect();
        let names_b: Vec<_> = second.metrics.iter().map(|m| &m.model_name).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn degenerate_fallback_picks_first_eligible_model() {
        let models = default_models();
        // 13 points: too short for any backtest (WMA needs 14), but long
        // enough for WMA and Polynomial Trend to fit structurally. The
        // first eligible in declaration order is WMA.
        let series = make_series(vec![10.0; 13]);

        let selection = AccuracyTracker::new()
            .select_best(&models, &series)
            .unwrap();
        assert_eq!(selection.best.name(), "Weighted Moving Average");
        assert!(selection.metrics.is_empty());
        assert!(!selection.is_validated());
    }

    #[test]
    fn degenerate_fallback_last_model_when_nothing_qualifies() {
        let models: Vec<BoxedModel> = vec![Box::new(AlwaysFails), Box::new(AlwaysFails)];
        // Below even the test double's minimum.
        let series = make_series(vec![1.0; 4]);

        let selection = AccuracyTracker::new()
            .select_best(&models, &series)
            .unwrap();
        assert_eq!(selection.best.name(), "Always Fails");
        assert!(selection.metrics.is_empty());
    }

    #[test]
    fn model_failure_during_backtest_is_a_skip() {
        let models: Vec<BoxedModel> = vec![
            Box::new(AlwaysFails),
            Box::new(WeightedMovingAverage::new()),
        ];
        let series = make_series(vec![100.0; 30]);

        let selection = AccuracyTracker::new()
            .select_best(&models, &series)
            .unwrap();
        // The failing model is skipped, the working one wins.
        assert_eq!(selection.best.name(), "Weighted Moving Average");
        assert_eq!(selection.metrics.len(), 1);
    }

    #[test]
    fn select_best_on_empty_model_list() {
        let models: Vec<BoxedModel> = Vec::new();
        let series = make_series(vec![1.0; 20]);
        assert!(AccuracyTracker::new()
            .select_best(&models, &series)
            .is_none());
    }
}
