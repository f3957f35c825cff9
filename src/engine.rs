//! Orchestration of a full forecasting run.
//!
//! The engine ties the pieces together: backtest-driven model selection on
//! the aggregate series, a production re-fit of the winner, fixed-horizon
//! point forecasts, per-entity forecasts, and the current-month cost
//! projection. Failures never abort a run; every section of the report
//! degrades independently to an explicit "nothing to report" value.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::accuracy::{AccuracyMetrics, AccuracyTracker};
use crate::core::{DailySeries, ForecastResult};
use crate::models::{default_models, BoxedModel};

/// Fixed reporting horizons, in days ahead of the last observation.
pub const REPORTING_HORIZONS: [usize; 4] = [1, 7, 14, 30];

/// Scalar knobs supplied by the caller. The engine reads no environment
/// and no files.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Two-sided confidence level for interval construction.
    pub confidence_level: f64,
    /// Production forecast horizon in days.
    pub horizon: usize,
    /// Entities below this total historical cost are not analyzed.
    pub min_entity_cost: f64,
    /// How many of the costliest entities get their own forecast.
    pub top_entities: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            horizon: 14,
            min_entity_cost: 1.0,
            top_entities: 6,
        }
    }
}

/// One entity's history plus its pre-computed total, used for ranking and
/// threshold filtering.
#[derive(Debug, Clone)]
pub struct EntityHistory {
    pub name: String,
    pub series: DailySeries,
    pub total_cost: f64,
}

/// A single point forecast at one of the fixed reporting horizons.
#[derive(Debug, Clone, Serialize)]
pub struct PointForecast {
    pub days_ahead: usize,
    pub date: NaiveDate,
    pub value: f64,
    /// Half-width of the confidence range around `value`.
    pub margin: f64,
}

/// Per-entity forecast outcome. Entities that no model could fit are
/// reported explicitly rather than dropped.
#[derive(Debug, Clone, Serialize)]
pub enum EntityOutcome {
    Forecast(ForecastResult),
    InsufficientData,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityForecast {
    pub name: String,
    pub total_cost: f64,
    pub outcome: EntityOutcome,
}

/// Projection of the current calendar month's total cost.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyProjection {
    pub year: i32,
    pub month: u32,
    pub month_to_date: f64,
    pub projected_total: f64,
    pub days_remaining: u32,
}

/// Complete output of one forecasting run.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    /// Name of the model that produced the production forecast, if any.
    pub selected_model: Option<String>,
    /// False when the selection fell back without backtest evidence.
    pub validated: bool,
    /// Accuracy comparison, ascending by MAPE. Empty on degenerate
    /// fallback.
    pub accuracy: Vec<AccuracyMetrics>,
    /// The production forecast; `None` when every model failed.
    pub forecast: Option<ForecastResult>,
    pub point_forecasts: Vec<PointForecast>,
    pub entities: Vec<EntityForecast>,
    pub monthly_projection: Option<MonthlyProjection>,
}

/// Top-level forecasting coordinator.
pub struct ForecastEngine {
    config: ForecastConfig,
    tracker: AccuracyTracker,
    models: Vec<BoxedModel>,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config,
            tracker: AccuracyTracker::new(),
            models: default_models(),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    #[cfg(test)]
    fn with_models(config: ForecastConfig, models: Vec<BoxedModel>) -> Self {
        Self {
            config,
            tracker: AccuracyTracker::new(),
            models,
        }
    }

    /// Run a full forecast, evaluating the calendar "now" against the
    /// current UTC date.
    pub fn run(&self, series: &DailySeries, entities: &[EntityHistory]) -> ForecastReport {
        self.run_at(series, entities, Utc::now().date_naive())
    }

    /// Run a full forecast with an explicit evaluation date. The date only
    /// affects the monthly projection.
    pub fn run_at(
        &self,
        series: &DailySeries,
        entities: &[EntityHistory],
        today: NaiveDate,
    ) -> ForecastReport {
        let (validated, accuracy, forecast) = match self.tracker.select_best(&self.models, series)
        {
            Some(selection) => {
                info!(
                    model = selection.best.name(),
                    validated = selection.is_validated(),
                    "model selection complete"
                );
                let forecast = self.refit(selection.best.name(), series);
                (selection.is_validated(), selection.metrics, forecast)
            }
            None => (false, Vec::new(), None),
        };

        let point_forecasts = forecast
            .as_ref()
            .map(|f| self.point_forecasts(series, f))
            .unwrap_or_default();
        let monthly_projection = self.monthly_projection(series, forecast.as_ref(), today);
        let entities = self.forecast_entities(entities);

        ForecastReport {
            selected_model: forecast.as_ref().map(|f| f.model_name.clone()),
            validated,
            accuracy,
            forecast,
            point_forecasts,
            entities,
            monthly_projection,
        }
    }

    /// Re-fit the selection winner on the complete series. A borderline
    /// winner can fail here (it was validated on a shorter slice, never on
    /// the full series at the production horizon); walk the remaining
    /// models in declaration order before giving up.
    fn refit(&self, winner: &str, series: &DailySeries) -> Option<ForecastResult> {
        for model in self
            .models
            .iter()
            .filter(|m| m.name() == winner)
            .chain(self.models.iter().filter(|m| m.name() != winner))
        {
            match model.fit_and_forecast(series, self.config.horizon, self.config.confidence_level)
            {
                Ok(result) => {
                    if model.name() != winner {
                        warn!(
                            winner,
                            used = model.name(),
                            "selection winner failed on the full series; using fallback"
                        );
                    }
                    return Some(result);
                }
                Err(err) => debug!(model = model.name(), %err, "production fit failed"),
            }
        }
        warn!("no model produced a production forecast");
        None
    }

    /// Point forecasts at the fixed reporting horizons. Inside the
    /// configured horizon the value and range come straight from the
    /// forecast arrays. Beyond it the last forecast value continues flat
    /// with a generic 95% band unscaled by step.
    fn point_forecasts(&self, series: &DailySeries, forecast: &ForecastResult) -> Vec<PointForecast> {
        let Some(&last_value) = forecast.forecast_values.last() else {
            return Vec::new();
        };

        REPORTING_HORIZONS
            .iter()
            .map(|&days_ahead| {
                if days_ahead <= forecast.horizon() {
                    let i = days_ahead - 1;
                    PointForecast {
                        days_ahead,
                        date: forecast.forecast_dates[i],
                        value: forecast.forecast_values[i],
                        margin: (forecast.upper_ci[i] - forecast.lower_ci[i]) / 2.0,
                    }
                } else {
                    PointForecast {
                        days_ahead,
                        date: series.last_date() + Duration::days(days_ahead as i64),
                        value: last_value,
                        margin: 1.96 * forecast.residual_std,
                    }
                }
            })
            .collect()
    }

    /// Forecast the costliest entities above the analysis threshold. Each
    /// entity takes the first model (in declaration order) that fits; there
    /// is no per-entity backtest competition.
    fn forecast_entities(&self, entities: &[EntityHistory]) -> Vec<EntityForecast> {
        let mut eligible: Vec<&EntityHistory> = entities
            .iter()
            .filter(|e| e.total_cost >= self.config.min_entity_cost)
            .collect();
        eligible.sort_by(|a, b| {
            b.total_cost
                .partial_cmp(&a.total_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        eligible.truncate(self.config.top_entities);

        eligible
            .into_iter()
            .map(|entity| {
                let outcome = self
                    .models
                    .iter()
                    .find_map(|model| {
                        model
                            .fit_and_forecast(
                                &entity.series,
                                self.config.horizon,
                                self.config.confidence_level,
                            )
                            .ok()
                    })
                    .map(EntityOutcome::Forecast)
                    .unwrap_or(EntityOutcome::InsufficientData);

                if matches!(outcome, EntityOutcome::InsufficientData) {
                    debug!(entity = %entity.name, "no model could fit entity history");
                }

                EntityForecast {
                    name: entity.name.clone(),
                    total_cost: entity.total_cost,
                    outcome,
                }
            })
            .collect()
    }

    /// Project the current month's total. Only produced when the series
    /// ends inside `today`'s calendar month and at least one day of the
    /// month is still ahead.
    fn monthly_projection(
        &self,
        series: &DailySeries,
        forecast: Option<&ForecastResult>,
        today: NaiveDate,
    ) -> Option<MonthlyProjection> {
        let forecast = forecast?;
        if forecast.forecast_values.is_empty() {
            return None;
        }

        let last = series.last_date();
        if last.year() != today.year() || last.month() != today.month() {
            return None;
        }

        let days_in_month = days_in_month(last)?;
        let days_remaining = days_in_month.checked_sub(last.day())?;
        if days_remaining == 0 {
            return None;
        }

        let steps = (days_remaining as usize).min(forecast.forecast_values.len());
        let average = forecast.forecast_values[..steps].iter().sum::<f64>() / steps as f64;

        let month_to_date: f64 = series
            .dates()
            .iter()
            .zip(series.values().iter())
            .filter(|(date, _)| date.year() == last.year() && date.month() == last.month())
            .map(|(_, value)| value)
            .sum();

        Some(MonthlyProjection {
            year: last.year(),
            month: last.month(),
            month_to_date,
            projected_total: month_to_date + average * days_remaining as f64,
            days_remaining,
        })
    }
}

/// Number of days in the month containing `date`.
fn days_in_month(date: NaiveDate) -> Option<u32> {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first_of_next - Duration::days(1)).day())
}
