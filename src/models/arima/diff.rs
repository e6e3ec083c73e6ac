//! Differencing utilities for seasonal ARIMA models.
//!
//! Polynomials in the backshift operator `B` are stored as coefficient vectors
//! with the constant term first, so `[1.0, -1.0]` is `1 - B`.

/// Apply `d` lag-1 differences.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply `d` lag-`period` differences.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result[period..]
            .iter()
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Seasonal then regular differencing, the order used by the model fitter.
pub fn full_difference(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    difference(&seasonal_difference(series, seasonal_d, period), d)
}

/// Product of two backshift polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Map values of the differenced process that follow `history` back to levels.
///
/// `history` is the undifferenced series; `differenced` continues its
/// differenced counterpart (typically forecasts). Each level is recovered from
/// `y_t = w_t - sum_{k>=1} c_k y_{t-k}` where `c` is the differencing
/// polynomial.
pub fn integrate(
    differenced: &[f64],
    history: &[f64],
    d: usize,
    seasonal_d: usize,
    period: usize,
) -> Vec<f64> {
    let poly = differencing_polynomial(d, seasonal_d, period);
    let mut levels = history.to_vec();
    let start = levels.len();
    for &w in differenced {
        let t = levels.len();
        let mut y = w;
        for (k, c) in poly.iter().enumerate().skip(1) {
            if *c != 0.0 && t >= k {
                y -= c * levels[t - k];
            }
        }
        levels.push(y);
    }
    levels.split_off(start)
}

/// Cumulative sum starting from `first`; inverse of a single lag-1 difference.
///
/// The result has one more element than `diffs` and starts with `first`.
pub fn inverse_difference(first: f64, diffs: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(diffs.len() + 1);
    let mut level = first;
    out.push(level);
    for d in diffs {
        level += d;
        out.push(level);
    }
    out
}
