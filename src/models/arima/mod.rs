//! Seasonal ARIMA models and automatic order selection.
//!
//! - [`SARIMA`]: (p, d, q)(P, D, Q)\[s\] estimated by conditional sum of squares
//! - [`AutoARIMA`]: order search minimising AIC, AICc or BIC
//! - Differencing helpers shared with the transform layer

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, CandidateScore, InformationCriterion};
pub use diff::{
    difference, differencing_polynomial, full_difference, integrate, inverse_difference,
    seasonal_difference,
};
pub use model::{is_invertible, is_stationary, SARIMASpec, SARIMA};
