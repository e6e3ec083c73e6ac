//! Descriptive features of a series used by the diagnostic suite.
//!
//! # Example
//!
//! ```
//! use fpi_forecast::features::{acf, describe, histogram};
//!
//! let series = vec![1.0, 2.0, 3.0, 2.5, 2.0, 3.5, 4.0, 3.0];
//!
//! let stats = describe(&series).unwrap();
//! assert_eq!(stats.n, 8);
//!
//! let rho = acf(&series, 3);
//! assert_eq!(rho.len(), 4);
//!
//! let hist = histogram(&series, Some(4)).unwrap();
//! assert_eq!(hist.total(), 8);
//! ```

pub mod autocorrelation;
pub mod distribution;

pub use autocorrelation::{
    acf, autocorrelation, correlogram, default_max_lag, lag_pairs, pacf, Correlogram,
};
pub use distribution::{
    describe, histogram, kurtosis, moment_ratios, quantile, skewness, sturges_bins,
    DescriptiveStats, Histogram,
};
