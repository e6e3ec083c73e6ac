//! Numerical utilities shared by the models and the diagnostic tests.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{
    chi_squared_sf, mean, median, min_max, quantile_normal, std_dev, two_sided_z, variance,
};
