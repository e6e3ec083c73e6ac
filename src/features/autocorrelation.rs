//! Autocorrelation structure of a series: ACF, PACF, correlograms and lag pairs.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, two_sided_z};

/// Returns the autocorrelation at a specific lag.
///
/// Uses the biased estimator (denominator over the full sample), which keeps
/// the sequence positive semi-definite.
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }

    let m = mean(series);
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &x) in series.iter().enumerate() {
        denominator += (x - m).powi(2);
        if i >= lag {
            numerator += (x - m) * (series[i - lag] - m);
        }
    }

    if denominator < 1e-300 {
        return 0.0;
    }

    numerator / denominator
}

/// Autocorrelations for lags `0..=max_lag`.
pub fn acf(series: &[f64], max_lag: usize) -> Vec<f64> {
    let max_lag = max_lag.min(series.len().saturating_sub(1));
    (0..=max_lag).map(|k| autocorrelation(series, k)).collect()
}

/// Partial autocorrelations for lags `1..=max_lag` via Durbin-Levinson.
pub fn pacf(series: &[f64], max_lag: usize) -> Vec<f64> {
    let rho = acf(series, max_lag);
    let max_lag = rho.len().saturating_sub(1);
    let mut out = Vec::with_capacity(max_lag);
    let mut phi: Vec<f64> = Vec::new();

    for k in 1..=max_lag {
        let num = rho[k] - (1..k).map(|j| phi[j - 1] * rho[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * rho[j]).sum::<f64>();
        let kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut next = Vec::with_capacity(k);
        for j in 1..k {
            next.push(phi[j - 1] - kk * phi[k - j - 1]);
        }
        next.push(kk);
        phi = next;
        out.push(kk);
    }
    out
}

/// Default number of lags for a correlogram: `10 log10(n)`, capped at `n - 1`.
pub fn default_max_lag(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let lags = (10.0 * (n as f64).log10()).floor() as usize;
    lags.clamp(1, n - 1)
}

/// ACF and PACF with the approximate white-noise band `±z/√n`.
#[derive(Debug, Clone, Serialize)]
pub struct Correlogram {
    /// Lags `1..=max_lag`.
    pub lags: Vec<usize>,
    /// Autocorrelation at each lag.
    pub acf: Vec<f64>,
    /// Partial autocorrelation at each lag.
    pub pacf: Vec<f64>,
    /// Half-width of the band.
    pub band: f64,
    /// Confidence level of the band.
    pub level: f64,
    /// Sample size.
    pub n: usize,
}

impl Correlogram {
    /// Lags whose autocorrelation falls outside the band.
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        self.outside_band(&self.acf)
    }

    /// Lags whose partial autocorrelation falls outside the band.
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        self.outside_band(&self.pacf)
    }

    fn outside_band(&self, values: &[f64]) -> Vec<usize> {
        self.lags
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| v.abs() > self.band)
            .map(|(l, _)| *l)
            .collect()
    }
}

/// Build the correlogram of `series` up to `max_lag` (default `10 log10 n`).
pub fn correlogram(series: &[f64], max_lag: Option<usize>, level: f64) -> Result<Correlogram> {
    let n = series.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData { needed: 3, got: n });
    }
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "band level must be in (0, 1), got {level}"
        )));
    }
    let max_lag = max_lag.unwrap_or_else(|| default_max_lag(n)).clamp(1, n - 1);
    let acf_values = acf(series, max_lag);

    Ok(Correlogram {
        lags: (1..=max_lag).collect(),
        acf: acf_values[1..].to_vec(),
        pacf: pacf(series, max_lag),
        band: two_sided_z(level) / (n as f64).sqrt(),
        level,
        n,
    })
}

/// `(x_{t-lag}, x_t)` pairs for a lag plot.
pub fn lag_pairs(series: &[f64], lag: usize) -> Vec<(f64, f64)> {
    if lag == 0 || lag >= series.len() {
        return Vec::new();
    }
    series
        .iter()
        .zip(series.iter().skip(lag))
        .map(|(&a, &b)| (a, b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lag_zero_is_one() {
        let values = vec![1.0, 3.0, 2.0, 5.0, 4.0];
        assert_relative_eq!(autocorrelation(&values, 0), 1.0, epsilon = 1e-12);
        assert!(autocorrelation(&values, 5).is_nan());
    }

    #[test]
    fn alternating_series_has_negative_lag_one() {
        let values: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let r = acf(&values, 2);
        assert!(r[1] < -0.9);
        assert!(r[2] > 0.9);
    }

    #[test]
    fn pacf_of_ar1_cuts_off() {
        // Deterministic AR(1)-like recursion with a pseudo-random driver.
        let mut x = vec![0.0];
        let mut state: u64 = 12345;
        for _ in 1..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            let prev = *x.last().unwrap();
            x.push(0.7 * prev + u);
        }
        let p = pacf(&x, 5);
        assert_eq!(p.len(), 5);
        assert_relative_eq!(p[0], autocorrelation(&x, 1), epsilon = 1e-12);
        assert!(p[0] > 0.6);
        for v in &p[1..] {
            assert!(v.abs() < 0.1);
        }
    }

    #[test]
    fn correlogram_band_and_lags() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.5).sin()).collect();
        let c = correlogram(&values, None, 0.95).unwrap();
        assert_eq!(c.lags.len(), 20);
        assert_eq!(c.acf.len(), 20);
        assert_eq!(c.pacf.len(), 20);
        assert_relative_eq!(c.band, 1.959964 / 10.0, epsilon = 1e-5);
        assert!(c.significant_acf_lags().contains(&1));

        assert!(correlogram(&[1.0, 2.0], None, 0.95).is_err());
        assert!(correlogram(&values, None, 1.5).is_err());
    }

    #[test]
    fn lag_pairs_align() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(lag_pairs(&values, 1), vec![(1.0, 2.0), (2.0, 3.0), (3.0, 4.0)]);
        assert_eq!(lag_pairs(&values, 3), vec![(1.0, 4.0)]);
        assert!(lag_pairs(&values, 4).is_empty());
    }

    #[test]
    fn default_lag_count() {
        assert_eq!(default_max_lag(100), 20);
        assert_eq!(default_max_lag(1000), 30);
        assert_eq!(default_max_lag(5), 4);
    }
}
