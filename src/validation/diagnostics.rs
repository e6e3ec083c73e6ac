//! The fixed diagnostic battery run on a series before modelling.

use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::features::{
    correlogram, describe, histogram, lag_pairs, Correlogram, DescriptiveStats, Histogram,
};
use crate::validation::heteroscedasticity::{arch_test, ArchReport};
use crate::validation::normality::{jarque_bera, JarqueBeraResult};
use crate::validation::residual_tests::{ljung_box, LjungBoxResult};
use crate::validation::stationarity::{
    adf_test, kpss_test, stationarity_verdict, AdfRegression, KpssType, StationarityResult,
    StationarityVerdict,
};
use crate::validation::HypothesisTest;

fn default_alpha() -> f64 {
    0.05
}

fn default_arch_lags() -> usize {
    12
}

fn default_lag_plot_lags() -> usize {
    12
}

/// Settings for [`run_diagnostics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticConfig {
    /// Significance threshold used for the narrative.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Correlogram and Ljung-Box lags (default `10 log10 n`).
    #[serde(default)]
    pub acf_lags: Option<usize>,
    #[serde(default = "default_arch_lags")]
    pub arch_lags: usize,
    /// Histogram bins (Sturges' rule when unset).
    #[serde(default)]
    pub histogram_bins: Option<usize>,
    /// Lag plots are produced for lags `1..=lag_plot_lags`.
    #[serde(default = "default_lag_plot_lags")]
    pub lag_plot_lags: usize,
    #[serde(default)]
    pub adf_regression: AdfRegression,
    #[serde(default)]
    pub kpss_type: KpssType,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            acf_lags: None,
            arch_lags: default_arch_lags(),
            histogram_bins: None,
            lag_plot_lags: default_lag_plot_lags(),
            adf_regression: AdfRegression::default(),
            kpss_type: KpssType::default(),
        }
    }
}

/// Flattened view of one test for tables and JSON.
#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    pub name: String,
    pub null_hypothesis: String,
    pub statistic: f64,
    pub p_value: f64,
    pub rejects_null: bool,
}

impl TestSummary {
    pub fn from_test(test: &dyn HypothesisTest, alpha: f64) -> Self {
        Self {
            name: test.name().to_string(),
            null_hypothesis: test.null_hypothesis().to_string(),
            statistic: test.statistic(),
            p_value: test.p_value(),
            rejects_null: test.rejects_null(alpha),
        }
    }
}

/// Everything the diagnostic suite learns about one series.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Series label at the time of the run.
    pub label: Option<String>,
    pub alpha: f64,
    pub stats: DescriptiveStats,
    pub histogram: Histogram,
    pub normality: JarqueBeraResult,
    pub adf: StationarityResult,
    pub kpss: StationarityResult,
    pub verdict: StationarityVerdict,
    pub correlogram: Correlogram,
    pub ljung_box: LjungBoxResult,
    pub arch: ArchReport,
    /// `(lag, pairs)` for each lag plot.
    #[serde(skip)]
    pub lag_pairs: Vec<(usize, Vec<(f64, f64)>)>,
}

impl DiagnosticReport {
    /// Every hypothesis test in the report, in display order.
    pub fn tests(&self) -> Vec<&dyn HypothesisTest> {
        vec![
            &self.normality,
            &self.adf,
            &self.kpss,
            &self.ljung_box,
            &self.arch.portmanteau,
            &self.arch.lagrange_multiplier,
        ]
    }

    pub fn test_summaries(&self) -> Vec<TestSummary> {
        self.tests()
            .into_iter()
            .map(|t| TestSummary::from_test(t, self.alpha))
            .collect()
    }

    /// One sentence per test interpreting it at `alpha`.
    pub fn findings(&self, alpha: f64) -> Vec<String> {
        let mut out = Vec::new();

        out.push(if self.normality.rejects_null(alpha) {
            format!(
                "Jarque-Bera rejects normality (p = {:.4}); skewness {:.3}, kurtosis {:.3}.",
                self.normality.p_value, self.normality.skewness, self.normality.kurtosis
            )
        } else {
            format!(
                "Jarque-Bera does not reject normality (p = {:.4}).",
                self.normality.p_value
            )
        });

        out.push(if self.adf.rejects_null(alpha) {
            format!(
                "ADF rejects a unit root (statistic {:.3}, p = {:.4}).",
                self.adf.statistic, self.adf.p_value
            )
        } else {
            format!(
                "ADF cannot reject a unit root (statistic {:.3}, p = {:.4}).",
                self.adf.statistic, self.adf.p_value
            )
        });

        out.push(if self.kpss.rejects_null(alpha) {
            format!(
                "KPSS rejects stationarity (statistic {:.3}, p = {:.4}).",
                self.kpss.statistic, self.kpss.p_value
            )
        } else {
            format!(
                "KPSS does not reject stationarity (statistic {:.3}, p = {:.4}).",
                self.kpss.statistic, self.kpss.p_value
            )
        });

        let verdict = stationarity_verdict(&self.adf, &self.kpss, alpha);
        out.push(match verdict {
            StationarityVerdict::Stationary => "Both tests agree the series is stationary.".into(),
            StationarityVerdict::NonStationary => {
                "Both tests agree the series is non-stationary; differencing is indicated.".into()
            }
            StationarityVerdict::Inconclusive => {
                "ADF and KPSS disagree; stationarity is inconclusive.".into()
            }
        });

        let significant = self.correlogram.significant_acf_lags();
        out.push(if significant.is_empty() {
            "No autocorrelation falls outside the white-noise band.".into()
        } else {
            format!(
                "Autocorrelation is significant at lags {:?}.",
                significant
            )
        });

        out.push(if self.ljung_box.rejects_null(alpha) {
            format!(
                "Ljung-Box rejects white noise up to lag {} (p = {:.4}).",
                self.ljung_box.lags, self.ljung_box.p_value
            )
        } else {
            format!(
                "Ljung-Box is consistent with white noise up to lag {} (p = {:.4}).",
                self.ljung_box.lags, self.ljung_box.p_value
            )
        });

        let arch = &self.arch;
        out.push(
            if arch.portmanteau.rejects_null(alpha)
                || arch.lagrange_multiplier.rejects_null(alpha)
            {
                format!(
                    "ARCH effects detected (Q p = {:.4}, LM p = {:.4}); variance is not constant.",
                    arch.portmanteau.p_value, arch.lagrange_multiplier.p_value
                )
            } else {
                format!(
                    "No ARCH effects detected (Q p = {:.4}, LM p = {:.4}).",
                    arch.portmanteau.p_value, arch.lagrange_multiplier.p_value
                )
            },
        );

        out
    }
}

/// Run the full battery on `series`.
pub fn run_diagnostics(series: &TimeSeries, config: &DiagnosticConfig) -> Result<DiagnosticReport> {
    if !(config.alpha > 0.0 && config.alpha < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "alpha must be in (0, 1), got {}",
            config.alpha
        )));
    }
    let values = series.values();
    if series.has_missing_values() {
        return Err(ForecastError::MissingValues);
    }

    let correlogram = correlogram(values, config.acf_lags, 1.0 - config.alpha)?;
    let ljung_box = ljung_box(values, Some(correlogram.lags.len()), 0)?;
    let adf = adf_test(values, config.adf_regression, None)?;
    let kpss = kpss_test(values, config.kpss_type, None)?;
    let verdict = stationarity_verdict(&adf, &kpss, config.alpha);
    let lag_pairs = (1..=config.lag_plot_lags)
        .map(|lag| (lag, lag_pairs(values, lag)))
        .filter(|(_, pairs)| !pairs.is_empty())
        .collect();

    Ok(DiagnosticReport {
        label: series.label().map(str::to_string),
        alpha: config.alpha,
        stats: describe(values)?,
        histogram: histogram(values, config.histogram_bins)?,
        normality: jarque_bera(values)?,
        adf,
        kpss,
        verdict,
        correlogram,
        ljung_box,
        arch: arch_test(values, config.arch_lags)?,
        lag_pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise_series(n: usize, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let values: Vec<f64> = (0..n)
            .map(|_| {
                let u1: f64 = rng.gen::<f64>().max(1e-12);
                let u2: f64 = rng.gen();
                (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
            })
            .collect();
        TimeSeries::monthly_from(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn white_noise_battery() {
        let series = noise_series(240, 5);
        let report = run_diagnostics(&series, &DiagnosticConfig::default()).unwrap();
        assert_eq!(report.stats.n, 240);
        assert_eq!(report.histogram.total(), 240);
        assert_ne!(report.verdict, StationarityVerdict::NonStationary);
        assert!(report.adf.rejects_null(0.05));
        assert_eq!(report.lag_pairs.len(), 12);
        assert_eq!(report.lag_pairs[0].1.len(), 239);
        assert_eq!(report.correlogram.lags.len(), 23);
        assert_eq!(report.tests().len(), 6);
    }

    #[test]
    fn trending_series_is_flagged() {
        let noise = noise_series(200, 8);
        let series = noise.with_values(
            noise
                .values()
                .iter()
                .enumerate()
                .map(|(i, e)| 100.0 + i as f64 + e)
                .collect(),
        ).unwrap();
        let report = run_diagnostics(&series, &DiagnosticConfig::default()).unwrap();
        assert!(report.kpss.rejects_null(0.05));
        assert!(report.ljung_box.rejects_null(0.05));
        let findings = report.findings(0.05);
        assert_eq!(findings.len(), 7);
        assert!(findings[2].starts_with("KPSS rejects"));
    }

    #[test]
    fn summaries_follow_alpha() {
        let report = run_diagnostics(&noise_series(120, 6), &DiagnosticConfig::default()).unwrap();
        let summaries = report.test_summaries();
        assert_eq!(summaries[0].name, "Jarque-Bera");
        for s in &summaries {
            assert_eq!(s.rejects_null, s.p_value < 0.05);
        }
    }

    #[test]
    fn rejects_bad_alpha() {
        let config = DiagnosticConfig {
            alpha: 1.5,
            ..DiagnosticConfig::default()
        };
        assert!(run_diagnostics(&noise_series(60, 7), &config).is_err());
    }
}
