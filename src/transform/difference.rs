//! Differencing of series.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{difference, inverse_difference, seasonal_difference};
use crate::transform::record;

/// `order`-th lag-1 difference, aligned to the surviving tail timestamps.
pub fn diff(series: &TimeSeries, order: usize) -> Result<TimeSeries> {
    if series.len() <= order {
        return Err(ForecastError::InsufficientData {
            needed: order + 1,
            got: series.len(),
        });
    }
    let mut out = series.with_tail_values(difference(series.values(), order))?;
    record(&mut out, &format!("diff({order})"));
    Ok(out)
}

/// Lag-`period` difference, aligned to the surviving tail timestamps.
pub fn seasonal_diff(series: &TimeSeries, period: usize) -> Result<TimeSeries> {
    if period == 0 {
        return Err(ForecastError::InvalidParameter(
            "seasonal period must be positive".into(),
        ));
    }
    if series.len() <= period {
        return Err(ForecastError::InsufficientData {
            needed: period + 1,
            got: series.len(),
        });
    }
    let mut out = series.with_tail_values(seasonal_difference(series.values(), 1, period))?;
    record(&mut out, &format!("sdiff({period})"));
    Ok(out)
}

/// Rebuild levels from `first` and one round of lag-1 differences.
pub fn undiff(first: f64, diffs: &[f64]) -> Vec<f64> {
    inverse_difference(first, diffs)
}
