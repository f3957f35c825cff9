//! Error types for the cost-forecast library.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building series or fitting models.
///
/// At the model boundary every variant means the same thing to callers:
/// the model could not produce a forecast. The orchestration layer treats
/// any `Err` as a skip-and-fall-back signal, never as a reason to abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input series")]
    EmptyData,

    /// Fewer observations than the operation requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Mismatched lengths between related arrays.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date sequencing or arithmetic error.
    #[error("date error: {0}")]
    DateError(String),

    /// Numerical failure during fitting (ill-conditioned system, non-finite
    /// input, decomposition breakdown).
    #[error("computation error: {0}")]
    ComputationError(String),
}
