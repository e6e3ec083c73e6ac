//! Natural logarithm and its inverse.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::transform::record;

/// Natural logarithm of every value.
///
/// Fails with [`ForecastError::NonPositiveValue`] on the first value `<= 0`.
pub fn log(series: &TimeSeries) -> Result<TimeSeries> {
    if let Some((index, value)) = series.first_non_positive() {
        return Err(ForecastError::NonPositiveValue { index, value });
    }
    let mut out = series.map_values(f64::ln);
    record(&mut out, "log");
    Ok(out)
}

/// Exponential of every value, the inverse of [`log`].
pub fn exp(series: &TimeSeries) -> TimeSeries {
    let mut out = series.map_values(f64::exp);
    record(&mut out, "exp");
    out
}
