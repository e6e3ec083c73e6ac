//! Seasonal decomposition and the seasonal-differencing pre-test.
//!
//! # Example
//!
//! ```
//! use fpi_forecast::seasonality::{decompose, DecompositionType};
//!
//! let pattern = [2.0, -1.0, -3.0, 2.0];
//! let values: Vec<f64> = (0..40).map(|i| i as f64 + pattern[i % 4]).collect();
//! let d = decompose(&values, 4, DecompositionType::Additive).unwrap();
//! assert!(d.seasonal_strength() > 0.9);
//! ```

mod decompose;

pub use decompose::{
    centred_moving_average, decompose, nsdiffs, Decomposition, DecompositionType,
    SEASONAL_STRENGTH_THRESHOLD,
};
