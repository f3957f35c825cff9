//! # cost-forecast
//!
//! Daily cost forecasting with automatic model selection.
//!
//! Four interchangeable models (Holt-Winters, seasonal decomposition,
//! weighted moving average, polynomial trend) compete on a walk-forward
//! backtest; the winner produces the production forecast with widening
//! confidence intervals, per-entity forecasts, and a projection of the
//! current month's total.

#![allow(clippy::needless_range_loop)]

pub mod accuracy;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::accuracy::{AccuracyMetrics, AccuracyTracker, ModelSelection};
    pub use crate::core::{DailySeries, ForecastResult};
    pub use crate::engine::{
        EntityHistory, ForecastConfig, ForecastEngine, ForecastReport, MonthlyProjection,
    };
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{default_models, ForecastModel};
}
