//! # fpi-forecast
//!
//! Food Price Index analysis: retrieval of a monthly price index series,
//! log and difference transforms, a battery of diagnostic tests, automatic
//! seasonal ARIMA order selection and 12-month forecasts with prediction
//! intervals on the original index scale.
//!
//! ```no_run
//! use fpi_forecast::prelude::*;
//! use fpi_forecast::data::CsvTableSource;
//!
//! let source = CsvTableSource::new("18100004.csv");
//! let report = Pipeline::new(PipelineConfig::default()).run(&source)?;
//! println!("{}", report.model.label);
//! for (date, value) in report.forecast.timestamps().iter().zip(report.forecast.point()) {
//!     println!("{date}: {value:.1}");
//! }
//! # Ok::<(), ForecastError>(())
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod seasonality;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, MissingValuePolicy, TimeSeries};
    pub use crate::data::{load_series, TableRequest, TableSource};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{AutoARIMA, AutoARIMAConfig, SARIMA};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{AnalysisReport, Pipeline, PipelineConfig};
    pub use crate::utils::quantile_normal;
}
