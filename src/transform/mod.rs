//! Series-level transformations.
//!
//! Every transform returns a new [`TimeSeries`](crate::core::TimeSeries) and
//! appends its name to the `transform` metadata entry, so a derived series
//! records how it was obtained.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fpi_forecast::core::TimeSeries;
//! use fpi_forecast::transform::{diff, log};
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let series = TimeSeries::monthly_from(start, vec![100.0, 102.0, 101.0, 105.0]).unwrap();
//!
//! let growth = diff(&log(&series).unwrap(), 1).unwrap();
//! assert_eq!(growth.len(), 3);
//! assert_eq!(growth.metadata()["transform"], "log,diff(1)");
//! ```

mod difference;
mod logarithm;

pub use difference::{diff, seasonal_diff, undiff};
pub use logarithm::{exp, log};

use crate::core::TimeSeries;

/// Metadata key holding the comma-separated transform history.
pub const TRANSFORM_KEY: &str = "transform";

fn record(series: &mut TimeSeries, step: &str) {
    let history = match series.metadata().get(TRANSFORM_KEY) {
        Some(previous) if !previous.is_empty() => format!("{previous},{step}"),
        _ => step.to_string(),
    };
    series.set_metadata(TRANSFORM_KEY, history);
}
