//! Dense daily time series.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// A univariate time series at daily frequency with no gaps.
///
/// Invariant: dates are strictly increasing by exactly one calendar day
/// between consecutive entries. The invariant is established at
/// construction; every consumer of a `DailySeries` may rely on it.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series from already-dense data.
    ///
    /// Returns an error when the inputs are empty, of mismatched length, or
    /// the dates are not consecutive calendar days.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        for pair in dates.windows(2) {
            if pair[1] - pair[0] != Duration::days(1) {
                return Err(ForecastError::DateError(format!(
                    "dates must be consecutive calendar days: {} is followed by {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { dates, values })
    }

    /// Build a dense series from possibly-gappy observations.
    ///
    /// Observations are sorted by date; any missing interior date is filled
    /// forward with the most recent observed value. Duplicate dates are
    /// rejected: aggregation belongs to the ingestion layer, and merging
    /// here would mask upstream bugs.
    pub fn from_observations(observations: &[(NaiveDate, f64)]) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let mut sorted = observations.to_vec();
        sorted.sort_by_key(|(date, _)| *date);
        for pair in sorted.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(ForecastError::DateError(format!(
                    "duplicate observation for {}",
                    pair[0].0
                )));
            }
        }

        let mut dates = Vec::with_capacity(sorted.len());
        let mut values = Vec::with_capacity(sorted.len());
        let mut previous = sorted[0].1;
        let mut expected = sorted[0].0;

        for &(date, value) in &sorted {
            while expected < date {
                dates.push(expected);
                values.push(previous);
                expected += Duration::days(1);
            }
            dates.push(date);
            values.push(value);
            previous = value;
            expected = date + Duration::days(1);
        }

        Ok(Self { dates, values })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series is empty. Always `false` for a constructed series,
    /// kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observation date.
    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last observation date.
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// A copy of the first `n` observations. Used by backtesting to hold
    /// out the tail of the series.
    pub fn head(&self, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(ForecastError::EmptyData);
        }
        if n > self.len() {
            return Err(ForecastError::InsufficientData {
                needed: n,
                got: self.len(),
            });
        }
        Ok(Self {
            dates: self.dates[..n].to_vec(),
            values: self.values[..n].to_vec(),
        })
    }

    /// Consecutive future dates starting the day after the last observation.
    pub fn future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let last = self.last_date();
        (1..=horizon as i64).map(|d| last + Duration::days(d)).collect()
    }
}
