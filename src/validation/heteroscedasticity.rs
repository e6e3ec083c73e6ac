//! Tests for conditional heteroscedasticity (ARCH effects).

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::utils::ols::ols_fit;
use crate::utils::stats::{chi_squared_sf, mean};
use crate::validation::residual_tests::ljung_box;
use crate::validation::HypothesisTest;

/// Which ARCH statistic was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchStatistic {
    /// Ljung-Box Q on squared demeaned values (McLeod-Li).
    McLeodLi,
    /// Engle's Lagrange multiplier test, `n R²` of the squared-value autoregression.
    EngleLm,
}

/// One ARCH test result.
#[derive(Debug, Clone, Serialize)]
pub struct ArchTestResult {
    pub kind: ArchStatistic,
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
}

impl HypothesisTest for ArchTestResult {
    fn name(&self) -> &str {
        match self.kind {
            ArchStatistic::McLeodLi => "ARCH (McLeod-Li Q on squares)",
            ArchStatistic::EngleLm => "ARCH (Engle LM)",
        }
    }

    fn null_hypothesis(&self) -> &str {
        "no ARCH effects (constant conditional variance)"
    }

    fn statistic(&self) -> f64 {
        self.statistic
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

/// Both ARCH statistics for one series.
#[derive(Debug, Clone, Serialize)]
pub struct ArchReport {
    pub portmanteau: ArchTestResult,
    pub lagrange_multiplier: ArchTestResult,
}

/// McLeod-Li test: Ljung-Box Q on squared demeaned values, χ²(lags).
pub fn mcleod_li(values: &[f64], lags: usize) -> Result<ArchTestResult> {
    let m = mean(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - m).powi(2)).collect();
    let q = ljung_box(&squared, Some(lags), 0)?;
    Ok(ArchTestResult {
        kind: ArchStatistic::McLeodLi,
        statistic: q.statistic,
        p_value: q.p_value,
        lags: q.lags,
    })
}

/// Engle's LM test: regress `e_t²` on `lags` of itself, `n R²` against χ²(lags).
pub fn engle_lm(values: &[f64], lags: usize) -> Result<ArchTestResult> {
    if lags == 0 {
        return Err(ForecastError::InvalidParameter(
            "ARCH LM test needs at least one lag".into(),
        ));
    }
    let needed = 2 * lags + 3;
    if values.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: values.len(),
        });
    }
    let m = mean(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - m).powi(2)).collect();

    let mut design = Vec::with_capacity(squared.len() - lags);
    let mut response = Vec::with_capacity(squared.len() - lags);
    for t in lags..squared.len() {
        let mut row = Vec::with_capacity(lags + 1);
        row.push(1.0);
        row.extend((1..=lags).map(|i| squared[t - i]));
        design.push(row);
        response.push(squared[t]);
    }
    let fit = ols_fit(&response, &design)?;
    let statistic = response.len() as f64 * fit.r_squared.max(0.0);

    Ok(ArchTestResult {
        kind: ArchStatistic::EngleLm,
        statistic,
        p_value: chi_squared_sf(statistic, lags as f64),
        lags,
    })
}

/// Run both ARCH tests with the same lag count.
pub fn arch_test(values: &[f64], lags: usize) -> Result<ArchReport> {
    Ok(ArchReport {
        portmanteau: mcleod_li(values, lags)?,
        lagrange_multiplier: engle_lm(values, lags)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gaussian(rng: &mut StdRng) -> f64 {
        let u1: f64 = rng.gen::<f64>().max(1e-12);
        let u2: f64 = rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    #[test]
    fn homoscedastic_noise_passes() {
        let mut rng = StdRng::seed_from_u64(31);
        let values: Vec<f64> = (0..1000).map(|_| gaussian(&mut rng)).collect();
        let report = arch_test(&values, 5).unwrap();
        assert!(!report.portmanteau.rejects_null(0.001));
        assert!(!report.lagrange_multiplier.rejects_null(0.001));
    }

    #[test]
    fn arch_process_is_detected() {
        let mut rng = StdRng::seed_from_u64(32);
        let mut values = Vec::with_capacity(1000);
        let mut prev: f64 = 0.0;
        for _ in 0..1000 {
            let sigma2 = 0.2 + 0.7 * prev * prev;
            let e = sigma2.sqrt() * gaussian(&mut rng);
            values.push(e);
            prev = e;
        }
        let report = arch_test(&values, 5).unwrap();
        assert!(report.portmanteau.p_value < 0.01);
        assert!(report.lagrange_multiplier.p_value < 0.01);
        assert_eq!(report.lagrange_multiplier.lags, 5);
    }

    #[test]
    fn lm_requires_lags_and_data() {
        assert!(engle_lm(&[1.0, 2.0, 3.0], 0).is_err());
        assert!(matches!(
            engle_lm(&[1.0, 2.0, 3.0], 5),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
