//! Distributional summaries of a series: moments, quantiles and histograms.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, median, min_max, std_dev};

/// Returns the sample skewness (adjusted Fisher-Pearson coefficient).
pub fn skewness(series: &[f64]) -> f64 {
    if series.len() < 3 {
        return f64::NAN;
    }
    let n = series.len() as f64;
    let m = mean(series);
    let s = std_dev(series);

    if s < 1e-300 {
        return 0.0;
    }

    let sum_cubed: f64 = series.iter().map(|x| ((x - m) / s).powi(3)).sum();
    (n / ((n - 1.0) * (n - 2.0))) * sum_cubed
}

/// Returns the sample excess kurtosis (normal distribution = 0).
pub fn kurtosis(series: &[f64]) -> f64 {
    if series.len() < 4 {
        return f64::NAN;
    }
    let n = series.len() as f64;
    let m = mean(series);
    let s = std_dev(series);

    if s < 1e-300 {
        return f64::NAN;
    }

    let sum_fourth: f64 = series.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let k = (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth;
    k - (3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0))
}

/// Central moment ratios `(m3 / m2^1.5, m4 / m2^2)` with population moments.
///
/// These are the `b1^0.5` and `b2` of the Jarque-Bera statistic.
pub fn moment_ratios(series: &[f64]) -> (f64, f64) {
    let n = series.len() as f64;
    if series.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let m = mean(series);
    let (m2, m3, m4) = series.iter().fold((0.0, 0.0, 0.0), |(a, b, c), x| {
        let d = x - m;
        (a + d * d, b + d * d * d, c + d * d * d * d)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    if m2 <= 0.0 {
        return (0.0, f64::NAN);
    }
    (m3 / m2.powf(1.5), m4 / (m2 * m2))
}

/// Returns the value at the given quantile (linear interpolation).
pub fn quantile(series: &[f64], q: f64) -> f64 {
    if series.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Descriptive statistics of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
}

/// Summarise a sample.
pub fn describe(series: &[f64]) -> Result<DescriptiveStats> {
    let (min, max) = min_max(series).ok_or(ForecastError::EmptyData)?;
    Ok(DescriptiveStats {
        n: series.len(),
        mean: mean(series),
        std_dev: std_dev(series),
        min,
        q1: quantile(series, 0.25),
        median: median(series),
        q3: quantile(series, 0.75),
        max,
        skewness: skewness(series),
        kurtosis: kurtosis(series),
    })
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` bin edges, increasing.
    pub edges: Vec<f64>,
    /// Count per bin; the last bin is closed on the right.
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.get(1)) {
            (Some(a), Some(b)) => b - a,
            _ => f64::NAN,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Bin heights scaled so the histogram integrates to one.
    pub fn densities(&self) -> Vec<f64> {
        let scale = self.total() as f64 * self.bin_width();
        self.counts
            .iter()
            .map(|&c| if scale > 0.0 { c as f64 / scale } else { 0.0 })
            .collect()
    }
}

/// Sturges' rule for the number of histogram bins.
pub fn sturges_bins(n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    ((n as f64).log2().ceil() as usize + 1).max(1)
}

/// Bin `series` into `bins` equal-width bins (Sturges' rule when `None`).
pub fn histogram(series: &[f64], bins: Option<usize>) -> Result<Histogram> {
    let (min, max) = min_max(series).ok_or(ForecastError::EmptyData)?;
    let bins = bins.unwrap_or_else(|| sturges_bins(series.len()));
    if bins == 0 {
        return Err(ForecastError::InvalidParameter(
            "histogram needs at least one bin".into(),
        ));
    }
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in series {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(Histogram { edges, counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn symmetric_sample_has_zero_skew() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(skewness(&values), 0.0, epsilon = 1e-12);
        let (b1, b2) = moment_ratios(&values);
        assert_relative_eq!(b1, 0.0, epsilon = 1e-12);
        // m2 = 2, m4 = 6.8
        assert_relative_eq!(b2, 1.7, epsilon = 1e-12);
    }

    #[test]
    fn right_tail_is_positive_skew() {
        let values = vec![1.0, 1.0, 1.0, 2.0, 10.0];
        assert!(skewness(&values) > 1.0);
        assert!(moment_ratios(&values).0 > 1.0);
    }

    #[test]
    fn quantiles_interpolate() {
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(quantile(&values, 0.0), 1.0);
        assert_relative_eq!(quantile(&values, 0.5), 2.5);
        assert_relative_eq!(quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn describe_summarises() {
        let stats = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.n, 8);
        assert_relative_eq!(stats.mean, 5.0);
        assert_relative_eq!(stats.median, 4.5);
        assert_eq!((stats.min, stats.max), (2.0, 9.0));
        assert!(describe(&[]).is_err());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let h = histogram(&values, Some(10)).unwrap();
        assert_eq!(h.counts, vec![10; 10]);
        assert_eq!(h.edges.len(), 11);
        assert_relative_eq!(h.bin_width(), 9.9, epsilon = 1e-12);
        let area: f64 = h.densities().iter().map(|d| d * h.bin_width()).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn histogram_of_constant_sample() {
        let h = histogram(&[3.0, 3.0, 3.0], None).unwrap();
        assert_eq!(h.total(), 3);
        assert_eq!(sturges_bins(3), 3);
        assert!(histogram(&[1.0], Some(0)).is_err());
    }
}
