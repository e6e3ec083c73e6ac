//! Seasonal ARIMA (p,d,q)(P,D,Q)[s] model.
//!
//! Estimation minimises the conditional sum of squares of the differenced
//! series with Nelder-Mead. The non-seasonal and seasonal AR and MA factors
//! are multiplied out into full backshift polynomials.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::{Forecast, Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{differencing_polynomial, full_difference, integrate, poly_mul};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, two_sided_z};

/// Seasonal ARIMA order specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period (s); 0 for a non-seasonal model.
    pub s: usize,
}

impl SARIMASpec {
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// Non-seasonal ARIMA(p, d, q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 0)
    }

    /// Whether any seasonal term is present.
    pub fn is_seasonal(&self) -> bool {
        self.cap_p + self.cap_d + self.cap_q > 0
    }

    /// Total differencing `d + D`.
    pub fn total_differencing(&self) -> usize {
        self.d + self.cap_d
    }

    /// Number of observations lost to differencing.
    pub fn differencing_lag(&self) -> usize {
        self.d + self.s * self.cap_d
    }

    /// Number of AR and MA coefficients, seasonal included.
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    /// Smallest conditioning offset on the differenced series.
    pub fn min_conditioning(&self) -> usize {
        self.p + self.s * self.cap_p
    }

    fn validate(&self) -> Result<()> {
        if self.is_seasonal() && self.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal terms need a period of at least 2, got {}",
                self.s
            )));
        }
        Ok(())
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::arima(1, 1, 1)
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}

/// Estimated coefficients unpacked from the optimiser's parameter vector.
#[derive(Debug, Clone, Default)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
    constant: f64,
}

impl Coefficients {
    fn unpack(spec: &SARIMASpec, with_constant: bool, params: &[f64]) -> Self {
        let mut it = params.iter().copied();
        let mut take = |n: usize| -> Vec<f64> { it.by_ref().take(n).collect() };
        let ar = take(spec.p);
        let ma = take(spec.q);
        let sar = take(spec.cap_p);
        let sma = take(spec.cap_q);
        let constant = if with_constant {
            take(1).first().copied().unwrap_or(0.0)
        } else {
            0.0
        };
        Self {
            ar,
            ma,
            sar,
            sma,
            constant,
        }
    }

    fn admissible(&self) -> bool {
        is_stationary(&self.ar)
            && is_stationary(&self.sar)
            && is_invertible(&self.ma)
            && is_invertible(&self.sma)
    }

    /// `φ(B)Φ(B^s)` with constant term first.
    fn ar_polynomial(&self, s: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar.iter().map(|c| -c))
            .collect();
        poly_mul(&regular, &seasonal_factor(&self.sar, s, -1.0))
    }

    /// `θ(B)Θ(B^s)` with constant term first.
    fn ma_polynomial(&self, s: usize) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0)
            .chain(self.ma.iter().copied())
            .collect();
        poly_mul(&regular, &seasonal_factor(&self.sma, s, 1.0))
    }
}

fn seasonal_factor(coefs: &[f64], s: usize, sign: f64) -> Vec<f64> {
    if coefs.is_empty() {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefs.len() * s + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * s] = sign * c;
    }
    poly
}

/// Whether `1 - a_1 z - ... - a_k z^k` has all roots outside the unit circle.
///
/// Runs the Levinson step-down recursion: the polynomial is stationary iff
/// every implied partial autocorrelation lies strictly inside (-1, 1).
pub fn is_stationary(coefs: &[f64]) -> bool {
    let mut a = coefs.to_vec();
    while let Some(&last) = a.last() {
        if last == 0.0 {
            a.pop();
        } else {
            break;
        }
    }
    for k in (1..=a.len()).rev() {
        let kappa = a[k - 1];
        if !kappa.is_finite() || kappa.abs() >= 1.0 - 1e-8 {
            return false;
        }
        let denom = 1.0 - kappa * kappa;
        let next: Vec<f64> = (0..k - 1)
            .map(|j| (a[j] + kappa * a[k - 2 - j]) / denom)
            .collect();
        a = next;
    }
    true
}

/// Whether `1 + b_1 z + ... + b_k z^k` has all roots outside the unit circle.
pub fn is_invertible(coefs: &[f64]) -> bool {
    let negated: Vec<f64> = coefs.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// CSS innovations of the demeaned differenced series `x`, zero before `offset`.
fn innovations(x: &[f64], ar: &[f64], ma: &[f64], offset: usize) -> Vec<f64> {
    let n = x.len();
    let mut e = vec![0.0; n];
    for t in offset..n {
        let mut value = x[t];
        for (k, c) in ar.iter().enumerate().skip(1) {
            if t >= k {
                value += c * x[t - k];
            }
        }
        for (k, c) in ma.iter().enumerate().skip(1) {
            if t >= k {
                value -= c * e[t - k];
            }
        }
        e[t] = value;
    }
    e
}

/// Seasonal ARIMA forecasting model.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    label: String,
    include_constant: bool,
    /// Requested conditioning offset; the effective one is never below the spec minimum.
    conditioning: Option<usize>,
    coefficients: Coefficients,
    /// Observations the model was fitted on.
    original: Option<Vec<f64>>,
    /// Differenced series.
    differenced: Option<Vec<f64>>,
    /// Innovations on the differenced scale (zeros before the offset).
    innovations: Option<Vec<f64>>,
    /// Fitted values on the original scale (NaN where conditioned away).
    fitted: Option<Vec<f64>>,
    /// Residuals on the original scale (NaN where conditioned away).
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    loglik: Option<f64>,
    aic: Option<f64>,
    aicc: Option<f64>,
    bic: Option<f64>,
    offset: usize,
    n_used: usize,
    converged: bool,
    last_timestamp: Option<NaiveDate>,
    frequency: Frequency,
}

impl SARIMA {
    /// Create a model. A mean term is included when the model has no differencing.
    pub fn new(spec: SARIMASpec) -> Self {
        Self {
            spec,
            label: spec.to_string(),
            include_constant: spec.total_differencing() == 0,
            conditioning: None,
            coefficients: Coefficients::default(),
            original: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            loglik: None,
            aic: None,
            aicc: None,
            bic: None,
            offset: 0,
            n_used: 0,
            converged: false,
            last_timestamp: None,
            frequency: Frequency::Monthly,
        }
    }

    /// Non-seasonal ARIMA(p, d, q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(SARIMASpec::arima(p, d, q))
    }

    /// Include a constant: the mean when `d + D = 0`, the drift when `d + D = 1`.
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    /// Condition the sum of squares on the first `offset` differenced values.
    pub fn with_conditioning(mut self, offset: usize) -> Self {
        self.conditioning = Some(offset);
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn include_constant(&self) -> bool {
        self.include_constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.sar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.sma
    }

    /// Mean or drift term, if the model carries one.
    pub fn constant(&self) -> Option<f64> {
        self.include_constant.then_some(self.coefficients.constant)
    }

    /// Named coefficients in estimation order (`ar1`, `ma1`, `sar1`, `sma1`, `mean`/`drift`).
    pub fn named_coefficients(&self) -> Vec<(String, f64)> {
        let c = &self.coefficients;
        let mut out = Vec::with_capacity(self.spec.num_coefficients() + 1);
        for (prefix, values) in [("ar", &c.ar), ("ma", &c.ma), ("sar", &c.sar), ("sma", &c.sma)] {
            for (i, v) in values.iter().enumerate() {
                out.push((format!("{prefix}{}", i + 1), *v));
            }
        }
        if let Some(constant) = self.constant() {
            let name = if self.spec.total_differencing() == 0 {
                "mean"
            } else {
                "drift"
            };
            out.push((name.to_string(), constant));
        }
        out
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    /// Gaussian conditional log-likelihood.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.loglik
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// AIC with small-sample correction.
    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Number of estimated parameters, innovation variance included.
    pub fn num_params(&self) -> usize {
        self.spec.num_coefficients() + usize::from(self.include_constant) + 1
    }

    /// Observations entering the sum of squares.
    pub fn n_used(&self) -> usize {
        self.n_used
    }

    /// Effective conditioning offset of the last fit.
    pub fn conditioning_offset(&self) -> usize {
        self.offset
    }

    /// Whether the optimiser reported convergence.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Innovations over the effective sample, without the conditioned-away start.
    pub fn innovations(&self) -> Option<&[f64]> {
        self.innovations.as_deref().map(|e| &e[self.offset.min(e.len())..])
    }

    /// Forecast error variance for steps `1..=horizon`.
    ///
    /// Computed as `σ² Σ_{j<h} ψ_j²` from the MA(∞) weights of the full model,
    /// differencing included.
    pub fn forecast_variances(&self, horizon: usize) -> Result<Vec<f64>> {
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;
        let psi = self.psi_weights(horizon);
        let mut acc = 0.0;
        Ok(psi
            .iter()
            .map(|w| {
                acc += w * w;
                sigma2 * acc
            })
            .collect())
    }

    /// First `n` ψ-weights, starting with ψ_0 = 1.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        let s = self.spec.s;
        let ar = poly_mul(
            &self.coefficients.ar_polynomial(s),
            &differencing_polynomial(self.spec.d, self.spec.cap_d, s),
        );
        let ma = self.coefficients.ma_polynomial(s);
        let mut psi: Vec<f64> = Vec::with_capacity(n);
        for j in 0..n {
            let mut w = if j == 0 {
                1.0
            } else {
                ma.get(j).copied().unwrap_or(0.0)
            };
            for k in 1..=j.min(ar.len().saturating_sub(1)) {
                w -= ar[k] * psi[j - k];
            }
            psi.push(w);
        }
        psi
    }

    fn objective(
        spec: &SARIMASpec,
        with_constant: bool,
        w: &[f64],
        offset: usize,
        params: &[f64],
    ) -> f64 {
        let coefs = Coefficients::unpack(spec, with_constant, params);
        if !coefs.admissible() {
            return f64::INFINITY;
        }
        let x: Vec<f64> = w.iter().map(|v| v - coefs.constant).collect();
        let e = innovations(
            &x,
            &coefs.ar_polynomial(spec.s),
            &coefs.ma_polynomial(spec.s),
            offset,
        );
        let css: f64 = e[offset..].iter().map(|v| v * v).sum();
        let n_eff = (w.len() - offset) as f64;
        0.5 * (css / n_eff).max(1e-300).ln()
    }

    fn estimate(&mut self, w: &[f64]) -> Result<()> {
        let spec = self.spec;
        let with_constant = self.include_constant;
        let offset = self.offset;

        let mut initial = vec![0.0; spec.num_coefficients()];
        if with_constant {
            initial.push(mean(w));
        }

        if initial.is_empty() {
            self.coefficients = Coefficients::default();
            self.converged = true;
            return Ok(());
        }

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            initial_step: 0.1,
            restarts: 1,
            ..Default::default()
        };
        let result = nelder_mead(
            |params| Self::objective(&spec, with_constant, w, offset, params),
            &initial,
            None,
            config,
        );

        if !result.optimal_value.is_finite() || result.optimal_value == f64::MAX {
            return Err(ForecastError::ComputationError(format!(
                "{} has no stationary and invertible solution",
                self.label
            )));
        }

        self.coefficients = Coefficients::unpack(&spec, with_constant, &result.optimal_point);
        self.converged = result.converged;
        Ok(())
    }

    fn forecast_differenced(&self, horizon: usize) -> Result<Vec<f64>> {
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let e = self.innovations.as_ref().ok_or(ForecastError::FitRequired)?;
        let s = self.spec.s;
        let mu = self.coefficients.constant;
        let ar = self.coefficients.ar_polynomial(s);
        let ma = self.coefficients.ma_polynomial(s);

        let mut x: Vec<f64> = w.iter().map(|v| v - mu).collect();
        let mut e = e.clone();
        let n = x.len();
        for _ in 0..horizon {
            let t = x.len();
            let mut pred = 0.0;
            for (k, c) in ar.iter().enumerate().skip(1) {
                if t >= k {
                    pred -= c * x[t - k];
                }
            }
            for (k, c) in ma.iter().enumerate().skip(1) {
                if t >= k {
                    pred += c * e[t - k];
                }
            }
            x.push(pred);
            e.push(0.0);
        }
        Ok(x[n..].iter().map(|v| v + mu).collect())
    }

    fn attach_timestamps(&self, forecast: Forecast) -> Result<Forecast> {
        let Some(last) = self.last_timestamp else {
            return Ok(forecast);
        };
        let stamps: Option<Vec<NaiveDate>> = (1..=forecast.horizon())
            .map(|h| self.frequency.advance(last, h))
            .collect();
        match stamps {
            Some(stamps) => forecast.with_timestamps(stamps),
            None => Err(ForecastError::TimestampError(format!(
                "cannot extend {last} by {} periods",
                forecast.horizon()
            ))),
        }
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::new(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.spec.validate()?;
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        if self.include_constant && self.spec.total_differencing() > 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} cannot carry a constant with d + D > 1",
                self.label
            )));
        }

        let values = series.values();
        let lag = self.spec.differencing_lag();
        self.offset = self
            .conditioning
            .unwrap_or(0)
            .max(self.spec.min_conditioning());
        let k = self.num_params();
        let needed = lag + self.offset + k + 2;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = full_difference(values, self.spec.d, self.spec.cap_d, self.spec.s);
        self.estimate(&w)?;

        let s = self.spec.s;
        let x: Vec<f64> = w.iter().map(|v| v - self.coefficients.constant).collect();
        let e = innovations(
            &x,
            &self.coefficients.ar_polynomial(s),
            &self.coefficients.ma_polynomial(s),
            self.offset,
        );

        let n_eff = w.len() - self.offset;
        let css: f64 = e[self.offset..].iter().map(|v| v * v).sum();
        let sigma2 = css / n_eff as f64;
        let n_f = n_eff as f64;
        let loglik = -0.5 * n_f * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let k_f = k as f64;
        let aic = -2.0 * loglik + 2.0 * k_f;
        let aicc = if n_f - k_f - 1.0 > 0.0 {
            aic + 2.0 * k_f * (k_f + 1.0) / (n_f - k_f - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = -2.0 * loglik + k_f * n_f.ln();

        let start = lag + self.offset;
        let mut fitted = vec![f64::NAN; values.len()];
        let mut residuals = vec![f64::NAN; values.len()];
        for t in start..values.len() {
            let innovation = e[t - lag];
            residuals[t] = innovation;
            fitted[t] = values[t] - innovation;
        }

        self.original = Some(values.to_vec());
        self.differenced = Some(w);
        self.innovations = Some(e);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.sigma2 = Some(sigma2);
        self.loglik = Some(loglik);
        self.aic = Some(aic);
        self.aicc = Some(aicc);
        self.bic = Some(bic);
        self.n_used = n_eff;
        self.last_timestamp = series.last_timestamp();
        self.frequency = series.frequency();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }
        let w_hat = self.forecast_differenced(horizon)?;
        let point = integrate(
            &w_hat,
            original,
            self.spec.d,
            self.spec.cap_d,
            self.spec.s,
        );
        self.attach_timestamps(Forecast::from_values(point))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.predict_with_levels(horizon, &[level])
    }

    fn predict_with_levels(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        let mut forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }
        let se: Vec<f64> = self
            .forecast_variances(horizon)?
            .into_iter()
            .map(f64::sqrt)
            .collect();
        for &level in levels {
            let z = two_sided_z(level);
            let (lower, upper): (Vec<f64>, Vec<f64>) = forecast
                .point()
                .iter()
                .zip(se.iter())
                .map(|(p, s)| (p - z * s, p + z * s))
                .unzip();
            forecast.push_interval(level, lower, upper)?;
        }
        Ok(forecast)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        &self.label
    }
}
