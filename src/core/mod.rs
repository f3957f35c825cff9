//! Core data structures for cost forecasting.

mod daily_series;
mod forecast;

pub use daily_series::DailySeries;
pub use forecast::ForecastResult;
