//! TimeSeries data structure for regularly spaced period data.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampling frequency of a period series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One observation per calendar month.
    #[default]
    Monthly,
    /// One observation per calendar quarter.
    Quarterly,
    /// One observation per year.
    Annual,
}

impl Frequency {
    /// Number of calendar months between consecutive observations.
    pub fn months(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Annual => 12,
        }
    }

    /// Number of observations per year (the seasonal period).
    pub fn period(&self) -> usize {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annual => 1,
        }
    }

    /// Advance a period start date by `steps` observations.
    pub fn advance(&self, date: NaiveDate, steps: usize) -> Option<NaiveDate> {
        date.checked_add_months(Months::new(self.months() * steps as u32))
    }
}

/// Policy for handling missing values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Return error if missing values found.
    #[default]
    Error,
    /// Fill with a specific value.
    Fill(f64),
    /// Forward fill (use previous valid value).
    ForwardFill,
    /// Linear interpolation between neighbouring valid values.
    Interpolate,
}

/// A regularly spaced univariate time series.
///
/// Timestamps are the first day of each period and are strictly increasing
/// with exactly one period between neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
    frequency: Frequency,
    label: Option<String>,
    metadata: BTreeMap<String, String>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
    frequency: Frequency,
    label: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<NaiveDate>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Generate `n` consecutive period timestamps starting at `start`.
    pub fn start(mut self, start: NaiveDate, n: usize) -> Self {
        self.timestamps = (0..n)
            .filter_map(|i| self.frequency.advance(start, i))
            .collect();
        self
    }

    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let mut series = TimeSeries::with_frequency(self.timestamps, self.values, self.frequency)?;
        series.label = self.label;
        series.metadata = self.metadata;
        Ok(series)
    }
}

impl TimeSeries {
    /// Create a monthly series, validating length and spacing.
    pub fn monthly(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        Self::with_frequency(timestamps, values, Frequency::Monthly)
    }

    /// Create a series with the given frequency, validating length and spacing.
    pub fn with_frequency(
        timestamps: Vec<NaiveDate>,
        values: Vec<f64>,
        frequency: Frequency,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for t in &timestamps {
            if t.day() != 1 {
                return Err(ForecastError::TimestampError(format!(
                    "period timestamps must fall on the first of the month, got {t}"
                )));
            }
        }

        for w in timestamps.windows(2) {
            if w[1] <= w[0] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
            if frequency.advance(w[0], 1) != Some(w[1]) {
                return Err(ForecastError::TimestampError(format!(
                    "gap between {} and {}: expected one {:?} step",
                    w[0], w[1], frequency
                )));
            }
        }

        Ok(Self {
            timestamps,
            values,
            frequency,
            label: None,
            metadata: BTreeMap::new(),
        })
    }

    /// Create a monthly series from a start period and values.
    pub fn monthly_from(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        TimeSeriesBuilder::new()
            .start(start, values.len())
            .values(values)
            .build()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Seasonal period implied by the frequency.
    pub fn period(&self) -> usize {
        self.frequency.period()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Iterate over `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn first_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    /// Timestamps of the `horizon` periods following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<NaiveDate>> {
        let last = self.last_timestamp().ok_or(ForecastError::EmptyData)?;
        (1..=horizon)
            .map(|h| {
                self.frequency.advance(last, h).ok_or_else(|| {
                    ForecastError::TimestampError(format!("cannot advance {last} by {h} periods"))
                })
            })
            .collect()
    }

    /// A copy carrying new values over the same timestamps.
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        Ok(TimeSeries {
            timestamps: self.timestamps.clone(),
            values,
            frequency: self.frequency,
            label: self.label.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// A copy aligned to the last `values.len()` timestamps.
    ///
    /// Used by transforms that consume observations at the start.
    pub fn with_tail_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() > self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        let skip = self.len() - values.len();
        Ok(TimeSeries {
            timestamps: self.timestamps[skip..].to_vec(),
            values,
            frequency: self.frequency,
            label: self.label.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// Apply a function to every value.
    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> TimeSeries {
        TimeSeries {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
            frequency: self.frequency,
            label: self.label.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Extract a slice of the time series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            frequency: self.frequency,
            label: self.label.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// The last `n` observations (all of them if `n >= len`).
    pub fn tail(&self, n: usize) -> TimeSeries {
        let start = self.len().saturating_sub(n);
        TimeSeries {
            timestamps: self.timestamps[start..].to_vec(),
            values: self.values[start..].to_vec(),
            frequency: self.frequency,
            label: self.label.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Observations on or after `start`.
    pub fn since(&self, start: NaiveDate) -> TimeSeries {
        let idx = self.timestamps.partition_point(|t| *t < start);
        self.tail(self.len() - idx)
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Index and value of the first observation that is not strictly positive.
    pub fn first_non_positive(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .find(|(_, v)| !(**v > 0.0))
            .map(|(i, &v)| (i, v))
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        if !self.has_missing_values() {
            return Ok(self.clone());
        }
        let values = match policy {
            MissingValuePolicy::Error => return Err(ForecastError::MissingValues),
            MissingValuePolicy::Fill(fill_value) => self
                .values
                .iter()
                .map(|&v| if v.is_finite() { v } else { fill_value })
                .collect(),
            MissingValuePolicy::ForwardFill => {
                let mut result = Vec::with_capacity(self.len());
                let mut last_valid = None;
                for &v in &self.values {
                    if v.is_finite() {
                        last_valid = Some(v);
                        result.push(v);
                    } else {
                        result.push(last_valid.ok_or(ForecastError::MissingValues)?);
                    }
                }
                result
            }
            MissingValuePolicy::Interpolate => interpolate_series(&self.values)?,
        };
        self.with_values(values)
    }
}

/// Linear interpolation over interior gaps; edge gaps take the nearest valid value.
fn interpolate_series(values: &[f64]) -> Result<Vec<f64>> {
    let valid: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_finite()).collect();
    let (first, last) = match (valid.first(), valid.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Err(ForecastError::MissingValues),
    };

    let mut result = values.to_vec();
    for v in result.iter_mut().take(first) {
        *v = values[first];
    }
    for v in result.iter_mut().skip(last + 1) {
        *v = values[last];
    }
    for w in valid.windows(2) {
        let (l, r) = (w[0], w[1]);
        let span = (r - l) as f64;
        for i in (l + 1)..r {
            let frac = (i - l) as f64 / span;
            result[i] = values[l] + frac * (values[r] - values[l]);
        }
    }
    Ok(result)
}

/// Parse a period label such as `2024-03` or `2024-03-01` into its first day.
pub fn parse_period(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d"))
        .map_err(|_| ForecastError::TimestampError(format!("unparsable period {text:?}")))?;
    NaiveDate::from_ymd_opt(parsed.year(), parsed.month(), 1)
        .ok_or_else(|| ForecastError::TimestampError(format!("invalid period {text:?}")))
}
