//! Core data structures for the analysis pipeline.

mod forecast;
mod time_series;

pub use forecast::{Forecast, PredictionInterval};
pub use time_series::{parse_period, Frequency, MissingValuePolicy, TimeSeries, TimeSeriesBuilder};
