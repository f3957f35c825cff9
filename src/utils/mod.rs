//! Numerical utilities shared by the forecasting models.

pub mod decompose;
pub mod polyfit;
pub mod stats;

pub use decompose::{decompose_additive, Decomposition};
pub use polyfit::{polyfit, polyval};
pub use stats::normal_quantile;
