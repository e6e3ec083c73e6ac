//! Unit-root and stationarity tests.
//!
//! The augmented Dickey-Fuller test has a unit root as its null; KPSS has
//! stationarity as its null. P-values are interpolated from the published
//! critical-value tables and clamped to the table range.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::arima::difference;
use crate::utils::ols::ols_fit;
use crate::validation::HypothesisTest;

/// Deterministic terms in the Dickey-Fuller regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdfRegression {
    /// Intercept only.
    Constant,
    /// Intercept and linear trend.
    #[default]
    ConstantTrend,
}

/// Null hypothesis of the KPSS test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpssType {
    /// Level stationarity.
    #[default]
    Level,
    /// Trend stationarity.
    Trend,
}

/// Which stationarity test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "test", content = "variant", rename_all = "snake_case")]
pub enum StationarityTest {
    Adf(AdfRegression),
    Kpss(KpssType),
}

/// Result of a stationarity test.
#[derive(Debug, Clone, Serialize)]
pub struct StationarityResult {
    /// Test and variant.
    pub test: StationarityTest,
    /// Test statistic
    pub statistic: f64,
    /// P-value interpolated from the critical-value table
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Whether the series appears stationary at the 5% level
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl HypothesisTest for StationarityResult {
    fn name(&self) -> &str {
        match self.test {
            StationarityTest::Adf(AdfRegression::Constant) => "Augmented Dickey-Fuller (constant)",
            StationarityTest::Adf(AdfRegression::ConstantTrend) => {
                "Augmented Dickey-Fuller (constant + trend)"
            }
            StationarityTest::Kpss(KpssType::Level) => "KPSS (level)",
            StationarityTest::Kpss(KpssType::Trend) => "KPSS (trend)",
        }
    }

    fn null_hypothesis(&self) -> &str {
        match self.test {
            StationarityTest::Adf(_) => "the series has a unit root",
            StationarityTest::Kpss(KpssType::Level) => "the series is level stationary",
            StationarityTest::Kpss(KpssType::Trend) => "the series is trend stationary",
        }
    }

    fn statistic(&self) -> f64 {
        self.statistic
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

const ADF_PROBS: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];
const ADF_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];

// Dickey-Fuller τ quantiles, rows follow ADF_PROBS, columns ADF_SIZES.
const ADF_TAU_CT: [[f64; 6]; 8] = [
    [-4.38, -4.15, -4.04, -3.99, -3.98, -3.96],
    [-3.95, -3.80, -3.73, -3.69, -3.68, -3.66],
    [-3.60, -3.50, -3.45, -3.43, -3.42, -3.41],
    [-3.24, -3.18, -3.15, -3.13, -3.13, -3.12],
    [-1.14, -1.19, -1.22, -1.23, -1.24, -1.25],
    [-0.80, -0.87, -0.90, -0.92, -0.93, -0.94],
    [-0.50, -0.58, -0.62, -0.64, -0.65, -0.66],
    [-0.15, -0.24, -0.28, -0.31, -0.32, -0.33],
];

const ADF_TAU_C: [[f64; 6]; 8] = [
    [-3.75, -3.58, -3.51, -3.46, -3.44, -3.43],
    [-3.33, -3.22, -3.17, -3.14, -3.13, -3.12],
    [-3.00, -2.93, -2.89, -2.88, -2.87, -2.86],
    [-2.63, -2.60, -2.58, -2.57, -2.57, -2.57],
    [-0.37, -0.40, -0.42, -0.42, -0.43, -0.44],
    [0.00, -0.03, -0.05, -0.06, -0.07, -0.07],
    [0.34, 0.29, 0.26, 0.24, 0.24, 0.23],
    [0.72, 0.66, 0.63, 0.62, 0.61, 0.60],
];

const KPSS_PROBS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_LEVEL: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_TREND: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// Piecewise-linear interpolation on increasing `xs`, clamped at both ends.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.partition_point(|v| *v <= x).max(1);
    let (x0, x1, y0, y1) = (xs[i - 1], xs[i], ys[i - 1], ys[i]);
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Default ADF lag order `trunc((n - 1)^(1/3))`.
pub fn adf_default_lags(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).powf(1.0 / 3.0).trunc() as usize
}

/// Augmented Dickey-Fuller test for a unit root.
///
/// Fits `Δy_t = α [+ β t] + γ y_{t-1} + Σ δ_i Δy_{t-i} + e_t` by OLS and
/// reports the t statistic of `γ`. Rejection implies stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `regression` - Deterministic terms
/// * `lags` - Augmentation lags (default: trunc((n-1)^(1/3)))
pub fn adf_test(
    series: &[f64],
    regression: AdfRegression,
    lags: Option<usize>,
) -> Result<StationarityResult> {
    let n = series.len();
    let k = lags.unwrap_or_else(|| adf_default_lags(n));
    let deterministic = match regression {
        AdfRegression::Constant => 1,
        AdfRegression::ConstantTrend => 2,
    };
    let needed = 2 * k + deterministic + 4;
    if n < needed {
        return Err(ForecastError::InsufficientData { needed, got: n });
    }

    let dy = difference(series, 1);
    let mut design = Vec::with_capacity(dy.len() - k);
    let mut response = Vec::with_capacity(dy.len() - k);
    for t in k..dy.len() {
        let mut row = vec![1.0, series[t]];
        if regression == AdfRegression::ConstantTrend {
            row.push((t + 1) as f64);
        }
        row.extend((1..=k).map(|i| dy[t - i]));
        design.push(row);
        response.push(dy[t]);
    }

    let fit = ols_fit(&response, &design)?;
    let statistic = fit.t_stat(1);
    if !statistic.is_finite() {
        return Err(ForecastError::ComputationError(
            "ADF regression is degenerate (constant series?)".into(),
        ));
    }

    let table = match regression {
        AdfRegression::Constant => &ADF_TAU_C,
        AdfRegression::ConstantTrend => &ADF_TAU_CT,
    };
    let size = dy.len() as f64;
    let at_size: Vec<f64> = table
        .iter()
        .map(|row| interpolate(&ADF_SIZES, row, size))
        .collect();
    let p_value = interpolate(&at_size, &ADF_PROBS, statistic);

    let critical_values = CriticalValues {
        cv_1pct: at_size[0],
        cv_5pct: at_size[2],
        cv_10pct: at_size[3],
    };

    Ok(StationarityResult {
        test: StationarityTest::Adf(regression),
        statistic,
        p_value,
        lags: k,
        is_stationary: statistic < critical_values.cv_5pct,
        critical_values,
    })
}

/// Default KPSS bandwidth `trunc(4 (n/100)^0.25)`.
pub fn kpss_default_lags(n: usize) -> usize {
    (4.0 * (n as f64 / 100.0).powf(0.25)).trunc() as usize
}

/// KPSS test for stationarity.
///
/// Tests the null hypothesis that the series is level (or trend) stationary.
/// Rejection implies non-stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `null` - Level or trend stationarity
/// * `lags` - Bartlett window for the long-run variance (default: 4*(n/100)^0.25)
pub fn kpss_test(
    series: &[f64],
    null: KpssType,
    lags: Option<usize>,
) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(ForecastError::InsufficientData { needed: 4, got: n });
    }
    let lags = lags.unwrap_or_else(|| kpss_default_lags(n)).min(n - 1);

    let residuals: Vec<f64> = match null {
        KpssType::Level => {
            let mean = series.iter().sum::<f64>() / n as f64;
            series.iter().map(|x| x - mean).collect()
        }
        KpssType::Trend => {
            let design: Vec<Vec<f64>> = (0..n).map(|t| vec![1.0, (t + 1) as f64]).collect();
            ols_fit(series, &design)?.residuals
        }
    };

    let mut partial = 0.0;
    let eta = residuals
        .iter()
        .map(|e| {
            partial += e;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = residuals.iter().map(|e| e * e).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov: f64 = residuals[j..]
            .iter()
            .zip(residuals.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= 0.0 {
        return Err(ForecastError::ComputationError(
            "KPSS long-run variance is not positive (constant series?)".into(),
        ));
    }

    let statistic = eta / long_run;
    let table = match null {
        KpssType::Level => &KPSS_LEVEL,
        KpssType::Trend => &KPSS_TREND,
    };
    let p_value = interpolate(table, &KPSS_PROBS, statistic);
    let critical_values = CriticalValues {
        cv_1pct: table[3],
        cv_5pct: table[1],
        cv_10pct: table[0],
    };

    Ok(StationarityResult {
        test: StationarityTest::Kpss(null),
        statistic,
        p_value,
        lags,
        is_stationary: statistic < critical_values.cv_5pct,
        critical_values,
    })
}

/// Joint reading of the ADF and KPSS tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationarityVerdict {
    /// ADF rejects a unit root and KPSS does not reject stationarity.
    Stationary,
    /// ADF does not reject a unit root and KPSS rejects stationarity.
    NonStationary,
    /// The two tests disagree.
    Inconclusive,
}

/// Combine ADF and KPSS at significance `alpha`.
pub fn stationarity_verdict(
    adf: &StationarityResult,
    kpss: &StationarityResult,
    alpha: f64,
) -> StationarityVerdict {
    match (adf.rejects_null(alpha), kpss.rejects_null(alpha)) {
        (true, false) => StationarityVerdict::Stationary,
        (false, true) => StationarityVerdict::NonStationary,
        _ => StationarityVerdict::Inconclusive,
    }
}

/// Number of lag-1 differences needed for KPSS level stationarity at `alpha`.
pub fn ndiffs(series: &[f64], alpha: f64, max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d {
        match kpss_test(&current, KpssType::Level, None) {
            Ok(result) if result.rejects_null(alpha) => {
                d += 1;
                current = difference(&current, 1);
            }
            _ => break,
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u1: f64 = rng.gen::<f64>().max(1e-12);
                let u2: f64 = rng.gen();
                (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
            })
            .collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let mut level = 0.0;
        noise(n, seed)
            .into_iter()
            .map(|e| {
                level += e;
                level
            })
            .collect()
    }

    #[test]
    fn interpolation_clamps_and_blends() {
        let xs = [1.0, 2.0, 4.0];
        let ys = [10.0, 20.0, 40.0];
        assert_eq!(interpolate(&xs, &ys, 0.0), 10.0);
        assert_eq!(interpolate(&xs, &ys, 9.0), 40.0);
        assert_relative_eq!(interpolate(&xs, &ys, 3.0), 30.0);
    }

    #[test]
    fn adf_rejects_for_white_noise() {
        let result = adf_test(&noise(300, 1), AdfRegression::ConstantTrend, None).unwrap();
        assert!(result.statistic < -3.5);
        assert_relative_eq!(result.p_value, 0.01);
        assert!(result.is_stationary);
        assert!(result.rejects_null(0.05));
        assert_eq!(result.lags, 6);
    }

    #[test]
    fn adf_does_not_reject_for_random_walk() {
        let result = adf_test(&random_walk(300, 2), AdfRegression::ConstantTrend, None).unwrap();
        assert!(result.p_value > 0.01);
        assert!(!result.rejects_null(0.01));
    }

    #[test]
    fn adf_constant_only_uses_its_table() {
        let result = adf_test(&noise(200, 3), AdfRegression::Constant, Some(2)).unwrap();
        assert_eq!(result.lags, 2);
        assert_relative_eq!(result.critical_values.cv_5pct, -2.883, epsilon = 1e-3);
        assert!(result.is_stationary);
        assert_eq!(result.name(), "Augmented Dickey-Fuller (constant)");
    }

    #[test]
    fn adf_critical_values_for_trend_model() {
        let result = adf_test(&noise(101, 4), AdfRegression::ConstantTrend, None).unwrap();
        // 100 differences: the n = 100 column.
        assert_relative_eq!(result.critical_values.cv_1pct, -4.04, epsilon = 1e-9);
        assert_relative_eq!(result.critical_values.cv_5pct, -3.45, epsilon = 1e-9);
        assert_relative_eq!(result.critical_values.cv_10pct, -3.15, epsilon = 1e-9);
    }

    #[test]
    fn adf_short_series() {
        assert!(matches!(
            adf_test(&[1.0, 2.0, 3.0], AdfRegression::ConstantTrend, None),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn kpss_accepts_white_noise() {
        let result = kpss_test(&noise(200, 5), KpssType::Level, None).unwrap();
        assert!(result.statistic < 0.739);
        assert!(!result.rejects_null(0.01));
        assert_eq!(result.lags, 4);
    }

    #[test]
    fn kpss_rejects_trend_and_random_walk() {
        let trend: Vec<f64> = (0..200).map(|i| i as f64 * 0.1).collect();
        let result = kpss_test(&trend, KpssType::Level, None).unwrap();
        assert_relative_eq!(result.p_value, 0.01);

        let result = kpss_test(&random_walk(300, 6), KpssType::Level, None).unwrap();
        assert!(result.rejects_null(0.05));
    }

    #[test]
    fn kpss_trend_null_accepts_trend_plus_noise() {
        let values: Vec<f64> = noise(200, 7)
            .iter()
            .enumerate()
            .map(|(i, e)| 0.5 * i as f64 + e)
            .collect();
        let result = kpss_test(&values, KpssType::Trend, None).unwrap();
        assert!(!result.rejects_null(0.01));
        assert_relative_eq!(result.critical_values.cv_5pct, 0.146);
    }

    #[test]
    fn kpss_constant_series_errors() {
        assert!(kpss_test(&[2.0; 20], KpssType::Level, None).is_err());
    }

    #[test]
    fn verdict_and_ndiffs() {
        let walk = random_walk(300, 8);
        let adf = adf_test(&walk, AdfRegression::ConstantTrend, None).unwrap();
        let kpss = kpss_test(&walk, KpssType::Level, None).unwrap();
        assert_eq!(
            stationarity_verdict(&adf, &kpss, 0.05),
            StationarityVerdict::NonStationary
        );

        assert_eq!(ndiffs(&walk, 0.05, 2), 1);
        assert_eq!(ndiffs(&noise(300, 9), 0.01, 2), 0);
    }
}
