//! Normality test.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::features::distribution::moment_ratios;
use crate::utils::stats::chi_squared_sf;
use crate::validation::HypothesisTest;

/// Jarque-Bera test result.
#[derive(Debug, Clone, Serialize)]
pub struct JarqueBeraResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Sample skewness `m3 / m2^1.5`.
    pub skewness: f64,
    /// Sample kurtosis `m4 / m2^2` (3 for a normal distribution).
    pub kurtosis: f64,
    pub n: usize,
}

impl HypothesisTest for JarqueBeraResult {
    fn name(&self) -> &str {
        "Jarque-Bera"
    }

    fn null_hypothesis(&self) -> &str {
        "the values are normally distributed"
    }

    fn statistic(&self) -> f64 {
        self.statistic
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

/// Jarque-Bera test `n (S²/6 + (K - 3)²/24)` against χ²(2).
pub fn jarque_bera(values: &[f64]) -> Result<JarqueBeraResult> {
    let n = values.len();
    if n < 4 {
        return Err(ForecastError::InsufficientData { needed: 4, got: n });
    }
    let (skewness, kurtosis) = moment_ratios(values);
    if !kurtosis.is_finite() {
        return Err(ForecastError::ComputationError(
            "Jarque-Bera is undefined for a constant sample".into(),
        ));
    }
    let statistic =
        n as f64 * (skewness * skewness / 6.0 + (kurtosis - 3.0).powi(2) / 24.0);
    Ok(JarqueBeraResult {
        statistic,
        p_value: chi_squared_sf(statistic, 2.0),
        skewness,
        kurtosis,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn statistic_for_uniform_grid() {
        // m2 = 2, m3 = 0, m4 = 6.8 => K = 1.7
        let result = jarque_bera(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let expected = 5.0 * (1.3f64.powi(2) / 24.0);
        assert_relative_eq!(result.statistic, expected, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, (-expected / 2.0).exp(), epsilon = 1e-9);
    }

    #[test]
    fn gaussian_sample_passes_and_exponential_fails() {
        let mut rng = StdRng::seed_from_u64(17);
        let gaussian: Vec<f64> = (0..2000)
            .map(|_| {
                let u1: f64 = rng.gen::<f64>().max(1e-12);
                let u2: f64 = rng.gen();
                (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
            })
            .collect();
        let result = jarque_bera(&gaussian).unwrap();
        assert!(!result.rejects_null(0.001));

        let exponential: Vec<f64> = (0..2000)
            .map(|_| -rng.gen::<f64>().max(1e-12).ln())
            .collect();
        let result = jarque_bera(&exponential).unwrap();
        assert!(result.rejects_null(0.05));
        assert!(result.skewness > 1.5);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(jarque_bera(&[1.0, 2.0]).is_err());
        assert!(jarque_bera(&[3.0; 10]).is_err());
    }
}
