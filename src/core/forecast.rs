//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Lower and upper prediction bounds at one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInterval {
    /// Confidence level in (0, 1), e.g. 0.95.
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl PredictionInterval {
    /// Width of the interval at each step.
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(self.lower.iter())
            .map(|(u, l)| u - l)
            .collect()
    }
}

/// A forecast result containing point predictions and optional intervals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Forecast {
    /// Period start dates of each step, when attached.
    timestamps: Vec<NaiveDate>,
    /// Point predictions.
    point: Vec<f64>,
    /// One interval per confidence level, sorted by level.
    intervals: Vec<PredictionInterval>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a forecast with a single prediction interval.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        level: f64,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Self {
        Self {
            timestamps: Vec::new(),
            point: values,
            intervals: vec![PredictionInterval {
                level,
                lower,
                upper,
            }],
        }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    /// Attach period timestamps, one per step.
    pub fn with_timestamps(mut self, timestamps: Vec<NaiveDate>) -> Result<Self> {
        if timestamps.len() != self.horizon() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.horizon(),
                got: timestamps.len(),
            });
        }
        self.timestamps = timestamps;
        Ok(self)
    }

    /// Add or replace the interval at `level`.
    pub fn push_interval(&mut self, level: f64, lower: Vec<f64>, upper: Vec<f64>) -> Result<()> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        for bounds in [&lower, &upper] {
            if bounds.len() != self.horizon() {
                return Err(ForecastError::DimensionMismatch {
                    expected: self.horizon(),
                    got: bounds.len(),
                });
            }
        }
        self.intervals.retain(|i| (i.level - level).abs() > 1e-12);
        self.intervals.push(PredictionInterval {
            level,
            lower,
            upper,
        });
        self.intervals
            .sort_by(|a, b| a.level.partial_cmp(&b.level).unwrap_or(std::cmp::Ordering::Equal));
        Ok(())
    }

    /// All intervals, sorted by increasing level.
    pub fn intervals(&self) -> &[PredictionInterval] {
        &self.intervals
    }

    pub fn has_intervals(&self) -> bool {
        !self.intervals.is_empty()
    }

    /// Interval at a specific level.
    pub fn interval(&self, level: f64) -> Option<&PredictionInterval> {
        self.intervals
            .iter()
            .find(|i| (i.level - level).abs() < 1e-9)
    }

    /// Lower bounds at a specific level.
    pub fn lower(&self, level: f64) -> Result<&[f64]> {
        self.interval(level)
            .map(|i| i.lower.as_slice())
            .ok_or_else(|| ForecastError::InvalidParameter(format!("no interval at level {level}")))
    }

    /// Upper bounds at a specific level.
    pub fn upper(&self, level: f64) -> Result<&[f64]> {
        self.interval(level)
            .map(|i| i.upper.as_slice())
            .ok_or_else(|| ForecastError::InvalidParameter(format!("no interval at level {level}")))
    }

    /// Apply a monotone increasing transform to points and bounds.
    ///
    /// This is how a forecast of a log series is returned to the original scale.
    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Forecast {
        Forecast {
            timestamps: self.timestamps.clone(),
            point: self.point.iter().map(|&v| f(v)).collect(),
            intervals: self
                .intervals
                .iter()
                .map(|i| PredictionInterval {
                    level: i.level,
                    lower: i.lower.iter().map(|&v| f(v)).collect(),
                    upper: i.upper.iter().map(|&v| f(v)).collect(),
                })
                .collect(),
        }
    }

    /// Replace the point predictions, keeping timestamps and intervals.
    pub fn with_point(mut self, point: Vec<f64>) -> Result<Self> {
        if point.len() != self.horizon() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.horizon(),
                got: point.len(),
            });
        }
        self.point = point;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_empty_state() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
        assert!(!forecast.has_intervals());

        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.horizon(), 3);
    }

    #[test]
    fn forecast_manages_prediction_intervals() {
        let mut forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert!(forecast.lower(0.95).is_err());

        forecast
            .push_interval(0.99, vec![0.0, 1.0, 2.0], vec![2.0, 3.0, 4.0])
            .unwrap();
        forecast
            .push_interval(0.95, vec![0.5, 1.5, 2.5], vec![1.5, 2.5, 3.5])
            .unwrap();

        let levels: Vec<f64> = forecast.intervals().iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![0.95, 0.99]);
        assert_eq!(forecast.lower(0.95).unwrap(), &[0.5, 1.5, 2.5]);
        assert_eq!(forecast.upper(0.99).unwrap(), &[2.0, 3.0, 4.0]);
        assert_eq!(forecast.interval(0.95).unwrap().widths(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn push_interval_validates() {
        let mut forecast = Forecast::from_values(vec![1.0, 2.0]);
        assert!(forecast.push_interval(1.5, vec![0.0; 2], vec![0.0; 2]).is_err());
        assert!(forecast.push_interval(0.9, vec![0.0; 3], vec![0.0; 2]).is_err());
    }

    #[test]
    fn push_interval_replaces_same_level() {
        let mut forecast = Forecast::from_values(vec![1.0]);
        forecast.push_interval(0.9, vec![0.0], vec![2.0]).unwrap();
        forecast.push_interval(0.9, vec![0.5], vec![1.5]).unwrap();
        assert_eq!(forecast.intervals().len(), 1);
        assert_eq!(forecast.lower(0.9).unwrap(), &[0.5]);
    }

    #[test]
    fn map_values_transforms_everything() {
        let forecast = Forecast::from_values_with_intervals(
            vec![0.0, 1.0],
            0.95,
            vec![-1.0, 0.0],
            vec![1.0, 2.0],
        );
        let exp = forecast.map_values(f64::exp);
        assert_eq!(exp.point()[0], 1.0);
        assert_eq!(exp.lower(0.95).unwrap()[0], (-1.0f64).exp());
        assert_eq!(exp.upper(0.95).unwrap()[1], 2.0f64.exp());
    }

    #[test]
    fn timestamps_must_match_horizon() {
        let forecast = Forecast::from_values(vec![1.0, 2.0]);
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(forecast.clone().with_timestamps(vec![date]).is_err());
        let next = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let stamped = forecast.with_timestamps(vec![date, next]).unwrap();
        assert_eq!(stamped.timestamps().len(), 2);
    }
}
