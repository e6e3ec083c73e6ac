//! Classical moving-average decomposition.
//!
//! The trend is a centred moving average (2×m for even periods), the seasonal
//! component the normalised average of the detrended values at each position
//! of the cycle, and the remainder what is left.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, variance};

/// How the components combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionType {
    /// `observed = trend + seasonal + remainder`
    #[default]
    Additive,
    /// `observed = trend * seasonal * remainder`
    Multiplicative,
}

/// Result of a classical decomposition.
///
/// `trend` and `remainder` are NaN over the first and last half-window where
/// the moving average is undefined.
#[derive(Debug, Clone, Serialize)]
pub struct Decomposition {
    pub kind: DecompositionType,
    pub period: usize,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
    /// One index per position in the cycle, aligned with the first observation.
    pub seasonal_indices: Vec<f64>,
}

impl Decomposition {
    /// Seasonal strength `max(0, 1 - Var(R) / Var(S + R))`.
    ///
    /// Values close to 1 indicate strong seasonality. Multiplicative
    /// components are compared on the log scale.
    pub fn seasonal_strength(&self) -> f64 {
        self.strength(&self.seasonal)
    }

    /// Trend strength `max(0, 1 - Var(R) / Var(T + R))`.
    pub fn trend_strength(&self) -> f64 {
        self.strength(&self.trend)
    }

    fn strength(&self, component: &[f64]) -> f64 {
        let (remainder, combined): (Vec<f64>, Vec<f64>) = component
            .iter()
            .zip(self.remainder.iter())
            .filter(|(c, r)| c.is_finite() && r.is_finite())
            .map(|(&c, &r)| match self.kind {
                DecompositionType::Additive => (r, c + r),
                DecompositionType::Multiplicative => (r.ln(), c.ln() + r.ln()),
            })
            .unzip();
        if remainder.len() < 2 {
            return 0.0;
        }
        let var_combined = variance(&combined);
        if var_combined < 1e-12 {
            return 0.0;
        }
        (1.0 - variance(&remainder) / var_combined).max(0.0)
    }

    /// Observed values with the seasonal component removed.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.observed
            .iter()
            .zip(self.seasonal.iter())
            .map(|(x, s)| match self.kind {
                DecompositionType::Additive => x - s,
                DecompositionType::Multiplicative => x / s,
            })
            .collect()
    }
}

/// Centred moving average of order `period` (2×m when `period` is even).
pub fn centred_moving_average(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n == 0 {
        return out;
    }
    let half = period / 2;
    if n < 2 * half + 1 {
        return out;
    }
    let m = period as f64;
    for t in half..n - half {
        let value = if period % 2 == 0 {
            let inner: f64 = values[t + 1 - half..t + half].iter().sum();
            (0.5 * values[t - half] + inner + 0.5 * values[t + half]) / m
        } else {
            values[t - half..=t + half].iter().sum::<f64>() / m
        };
        out[t] = value;
    }
    out
}

/// Decompose `values` with seasonal period `period`.
pub fn decompose(values: &[f64], period: usize, kind: DecompositionType) -> Result<Decomposition> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "decomposition needs a period of at least 2, got {period}"
        )));
    }
    let n = values.len();
    if n < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }
    if kind == DecompositionType::Multiplicative {
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(ForecastError::NonPositiveValue { index, value });
        }
    }

    let trend = centred_moving_average(values, period);
    let detrended: Vec<f64> = values
        .iter()
        .zip(trend.iter())
        .map(|(x, t)| match kind {
            DecompositionType::Additive => x - t,
            DecompositionType::Multiplicative => x / t,
        })
        .collect();

    let mut indices: Vec<f64> = (0..period)
        .map(|pos| {
            let cycle: Vec<f64> = detrended
                .iter()
                .skip(pos)
                .step_by(period)
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            mean(&cycle)
        })
        .collect();
    let level = mean(&indices);
    for idx in indices.iter_mut() {
        match kind {
            DecompositionType::Additive => *idx -= level,
            DecompositionType::Multiplicative => *idx /= level,
        }
    }

    let seasonal: Vec<f64> = (0..n).map(|t| indices[t % period]).collect();
    let remainder: Vec<f64> = values
        .iter()
        .zip(trend.iter().zip(seasonal.iter()))
        .map(|(x, (t, s))| match kind {
            DecompositionType::Additive => x - t - s,
            DecompositionType::Multiplicative => x / (t * s),
        })
        .collect();

    Ok(Decomposition {
        kind,
        period,
        observed: values.to_vec(),
        trend,
        seasonal,
        remainder,
        seasonal_indices: indices,
    })
}

/// Seasonal strength above which a seasonal difference is taken.
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Number of seasonal differences (0 or 1) from the seasonal-strength heuristic.
///
/// Returns 0 when the series is too short to decompose.
pub fn nsdiffs(values: &[f64], period: usize, threshold: f64) -> usize {
    if period < 2 || values.len() < 2 * period {
        return 0;
    }
    match decompose(values, period, DecompositionType::Additive) {
        Ok(d) if d.seasonal_strength() > threshold => 1,
        _ => 0,
    }
}
