//! Error types for the fpi-forecast library.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur anywhere in the data-to-forecast pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error (ordering, gaps, unparsable periods).
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// A value that must be strictly positive (e.g. before a logarithm) is not.
    #[error("non-positive value {value} at index {index}")]
    NonPositiveValue { index: usize, value: f64 },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Remote data source could not be reached or answered with a failure.
    #[error("network error: {0}")]
    Network(String),

    /// Payload from a data source could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested member is absent from the table.
    #[error("{dimension} {name:?} not found in table {table}")]
    CategoryNotFound {
        table: String,
        dimension: String,
        name: String,
    },

    /// Chart rendering failed.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Parse(err.to_string())
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ForecastError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ForecastError::Render(err.to_string())
    }
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ForecastError::Parse(err.to_string())
        } else {
            ForecastError::Network(err.to_string())
        }
    }
}
