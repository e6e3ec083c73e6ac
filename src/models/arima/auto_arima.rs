//! Automatic SARIMA order selection.
//!
//! Differencing orders are chosen first (seasonal strength for `D`, repeated
//! KPSS tests for `d`), then the ARMA orders are searched either stepwise
//! from four starting models or exhaustively within the configured bounds.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::seasonal_difference;
use crate::models::arima::model::{SARIMASpec, SARIMA};
use crate::models::Forecaster;
use crate::seasonality::{nsdiffs, SEASONAL_STRENGTH_THRESHOLD};
use crate::validation::ndiffs;

/// Information criterion minimised by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    Aic,
    /// AIC with small-sample correction.
    #[default]
    Aicc,
    Bic,
}

impl InformationCriterion {
    /// Criterion value of a fitted model.
    pub fn score(&self, model: &SARIMA) -> Option<f64> {
        match self {
            Self::Aic => model.aic(),
            Self::Aicc => model.aicc(),
            Self::Bic => model.bic(),
        }
    }
}

impl fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aic => "AIC",
            Self::Aicc => "AICc",
            Self::Bic => "BIC",
        };
        f.write_str(name)
    }
}

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Maximum non-seasonal AR order to consider.
    pub max_p: usize,
    /// Maximum non-seasonal MA order to consider.
    pub max_q: usize,
    /// Maximum non-seasonal differencing order.
    pub max_d: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Maximum of `p + q + P + Q`.
    pub max_order: usize,
    /// Seasonal period (0 or 1 for non-seasonal).
    pub seasonal_period: usize,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
    /// Selection criterion.
    pub criterion: InformationCriterion,
    /// Upper bound on the number of models fitted.
    pub max_models: usize,
    /// Consider a mean or drift term when `d + D <= 1`.
    pub allow_constant: bool,
    /// Fixed `d`, skipping the KPSS tests.
    pub d: Option<usize>,
    /// Fixed `D`, skipping the seasonal-strength test.
    pub cap_d: Option<usize>,
    /// Significance of the KPSS tests choosing `d`.
    pub kpss_alpha: f64,
    /// Seasonal strength above which `D = 1`.
    pub seasonal_threshold: f64,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_cap_p: 2,
            max_cap_q: 2,
            max_cap_d: 1,
            max_order: 5,
            seasonal_period: 0,
            stepwise: true,
            criterion: InformationCriterion::default(),
            max_models: 94,
            allow_constant: true,
            d: None,
            cap_d: None,
            kpss_alpha: 0.05,
            seasonal_threshold: SEASONAL_STRENGTH_THRESHOLD,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    /// Set seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    pub fn with_criterion(mut self, criterion: InformationCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_models(mut self, max_models: usize) -> Self {
        self.max_models = max_models;
        self
    }

    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }

    /// Fix both differencing orders instead of testing for them.
    pub fn with_differencing(mut self, d: usize, cap_d: usize) -> Self {
        self.d = Some(d);
        self.cap_d = Some(cap_d);
        self
    }

    pub fn without_constant(mut self) -> Self {
        self.allow_constant = false;
        self
    }
}

/// One evaluated candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub spec: SARIMASpec,
    pub include_constant: bool,
    pub score: f64,
}

impl fmt::Display for CandidateScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec)?;
        if self.include_constant {
            f.write_str(" with constant")?;
        }
        Ok(())
    }
}

/// Order bounds actually searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrderBounds {
    max_p: usize,
    max_q: usize,
    max_cap_p: usize,
    max_cap_q: usize,
    max_order: usize,
}

impl OrderBounds {
    fn new(config: &AutoARIMAConfig, s: usize) -> Self {
        let seasonal = s > 1;
        Self {
            max_p: config.max_p,
            max_q: config.max_q,
            max_cap_p: if seasonal { config.max_cap_p } else { 0 },
            max_cap_q: if seasonal { config.max_cap_q } else { 0 },
            max_order: config.max_order,
        }
    }

    /// Conditioning offset shared by every candidate.
    fn offset(&self, s: usize) -> usize {
        self.max_p + s * self.max_cap_p
    }

    /// Observations needed by the largest candidate within the bounds.
    fn needed(&self, s: usize, lag: usize, constant: bool) -> usize {
        let coefficients = self
            .max_order
            .min(self.max_p + self.max_q + self.max_cap_p + self.max_cap_q);
        lag + self.offset(s) + coefficients + usize::from(constant) + 1 + 2
    }

    /// Shrink the bounds until every candidate fits in `n` observations.
    ///
    /// Seasonal AR terms go first, then non-seasonal AR terms, then the total
    /// order. Returns `None` when even the null model does not fit.
    fn shrink_to(mut self, n: usize, s: usize, lag: usize, constant: bool) -> Option<Self> {
        while self.needed(s, lag, constant) > n {
            if self.max_cap_p > 0 {
                self.max_cap_p -= 1;
            } else if self.max_p > 0 {
                self.max_p -= 1;
            } else if self.max_order > 0 {
                self.max_order -= 1;
            } else {
                return None;
            }
        }
        Some(self)
    }

    fn contains(&self, p: usize, q: usize, cap_p: usize, cap_q: usize) -> bool {
        p <= self.max_p
            && q <= self.max_q
            && cap_p <= self.max_cap_p
            && cap_q <= self.max_cap_q
            && p + q + cap_p + cap_q <= self.max_order
    }
}

/// Search state shared by the stepwise and exhaustive strategies.
struct Search<'a> {
    config: &'a AutoARIMAConfig,
    series: &'a TimeSeries,
    d: usize,
    cap_d: usize,
    s: usize,
    bounds: OrderBounds,
    offset: usize,
    visited: HashSet<(SARIMASpec, bool)>,
    scores: Vec<CandidateScore>,
    best: Option<(SARIMA, f64)>,
}

impl<'a> Search<'a> {
    fn budget_left(&self) -> bool {
        self.visited.len() < self.config.max_models
    }

    /// Fit one candidate; returns true when it became the incumbent.
    fn consider(&mut self, p: usize, q: usize, cap_p: usize, cap_q: usize, constant: bool) -> bool {
        if !self.bounds.contains(p, q, cap_p, cap_q) || !self.budget_left() {
            return false;
        }
        let spec = SARIMASpec::new(p, self.d, q, cap_p, self.cap_d, cap_q, self.s);
        if !self.visited.insert((spec, constant)) {
            return false;
        }

        let mut model = SARIMA::new(spec)
            .with_constant(constant)
            .with_conditioning(self.offset);
        if let Err(err) = model.fit(self.series) {
            debug!(model = %spec, constant, error = %err, "candidate rejected");
            return false;
        }
        let Some(score) = self.config.criterion.score(&model).filter(|s| s.is_finite()) else {
            debug!(model = %spec, constant, "candidate has no finite criterion");
            return false;
        };
        debug!(
            model = %spec,
            constant,
            score,
            criterion = %self.config.criterion,
            "candidate fitted"
        );
        self.scores.push(CandidateScore {
            spec,
            include_constant: constant,
            score,
        });

        let improves = match &self.best {
            Some((_, best)) => score < *best,
            None => true,
        };
        if improves {
            self.best = Some((model, score));
        }
        improves
    }

    fn incumbent(&self) -> Option<(SARIMASpec, bool)> {
        self.best
            .as_ref()
            .map(|(m, _)| (m.spec(), m.include_constant()))
    }

    fn stepwise(&mut self, allow_constant: bool) {
        let seasonal = self.s > 1;
        let (sp, sq) = if seasonal { (1, 1) } else { (0, 0) };
        let starts = [
            (2, 2, sp, sq),
            (0, 0, 0, 0),
            (1, 0, sp, 0),
            (0, 1, 0, sq),
        ];
        for (p, q, cap_p, cap_q) in starts {
            self.consider(p, q, cap_p, cap_q, allow_constant);
        }
        if allow_constant {
            self.consider(0, 0, 0, 0, false);
        }

        const MOVES: [(isize, isize); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];

        'search: while self.budget_left() {
            let Some((spec, constant)) = self.incumbent() else {
                break;
            };

            if seasonal {
                for (dp, dq) in MOVES {
                    if let (Some(cap_p), Some(cap_q)) =
                        (spec.cap_p.checked_add_signed(dp), spec.cap_q.checked_add_signed(dq))
                    {
                        if self.consider(spec.p, spec.q, cap_p, cap_q, constant) {
                            continue 'search;
                        }
                    }
                }
            }
            for (dp, dq) in MOVES {
                if let (Some(p), Some(q)) =
                    (spec.p.checked_add_signed(dp), spec.q.checked_add_signed(dq))
                {
                    if self.consider(p, q, spec.cap_p, spec.cap_q, constant) {
                        continue 'search;
                    }
                }
            }
            if allow_constant
                && self.consider(spec.p, spec.q, spec.cap_p, spec.cap_q, !constant)
            {
                continue 'search;
            }
            break;
        }
    }

    fn exhaustive(&mut self, allow_constant: bool) {
        let b = self.bounds;
        let constants: &[bool] = if allow_constant { &[true, false] } else { &[false] };
        for p in 0..=b.max_p {
            for q in 0..=b.max_q {
                for cap_p in 0..=b.max_cap_p {
                    for cap_q in 0..=b.max_cap_q {
                        for &constant in constants {
                            self.consider(p, q, cap_p, cap_q, constant);
                        }
                    }
                }
            }
        }
    }
}

/// Automatic SARIMA model selection.
///
/// Selects the SARIMA(p, d, q)(P, D, Q)\[s\] specification that minimises
/// the configured information criterion.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    /// Configuration.
    config: AutoARIMAConfig,
    /// Selected and fitted model.
    selected: Option<SARIMA>,
    /// All fitted candidates, best first.
    model_scores: Vec<CandidateScore>,
    /// Differencing orders `(d, D)` used by the search.
    differencing: Option<(usize, usize)>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected: None,
            model_scores: Vec::new(),
            differencing: None,
        }
    }

    /// Create AutoARIMA with seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::default().with_seasonal_period(period))
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Get the full selected order including seasonal components.
    pub fn selected_spec(&self) -> Option<SARIMASpec> {
        self.selected.as_ref().map(SARIMA::spec)
    }

    /// The fitted winning model.
    pub fn selected_model(&self) -> Option<&SARIMA> {
        self.selected.as_ref()
    }

    /// Differencing orders `(d, D)` chosen before the order search.
    pub fn differencing(&self) -> Option<(usize, usize)> {
        self.differencing
    }

    /// All evaluated candidates sorted by score, ties in visiting order.
    pub fn model_scores(&self) -> &[CandidateScore] {
        &self.model_scores
    }

    /// Choose `(d, D)` for `values`.
    fn choose_differencing(&self, values: &[f64], s: usize) -> (usize, usize) {
        let c = &self.config;
        let cap_d = match c.cap_d {
            Some(cap_d) => cap_d.min(c.max_cap_d),
            None if s > 1 => nsdiffs(values, s, c.seasonal_threshold).min(c.max_cap_d),
            None => 0,
        };
        let d = match c.d {
            Some(d) => d.min(c.max_d),
            None => {
                let adjusted = seasonal_difference(values, cap_d, s);
                ndiffs(&adjusted, c.kpss_alpha, c.max_d)
            }
        };
        (d.min(2usize.saturating_sub(cap_d)), cap_d)
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        let requested = self.config.seasonal_period;
        let s = if requested > 1 && values.len() > 2 * requested {
            requested
        } else {
            0
        };
        let min_required = if s > 1 { 2 * s + 1 } else { 10 };
        if values.len() < min_required {
            return Err(ForecastError::InsufficientData {
                needed: min_required,
                got: values.len(),
            });
        }

        let (d, cap_d) = self.choose_differencing(values, s);
        let allow_constant = self.config.allow_constant && d + cap_d <= 1;
        let lag = d + s * cap_d;
        let requested_bounds = OrderBounds::new(&self.config, s);
        let bounds = requested_bounds
            .shrink_to(values.len(), s, lag, allow_constant)
            .ok_or(ForecastError::InsufficientData {
                needed: lag + 3 + usize::from(allow_constant),
                got: values.len(),
            })?;
        if bounds != requested_bounds {
            debug!(?bounds, n = values.len(), "order bounds reduced to the series length");
        }
        let offset = bounds.offset(s);
        debug!(d, cap_d, s, offset, "differencing chosen");

        let mut search = Search {
            config: &self.config,
            series,
            d,
            cap_d,
            s,
            bounds,
            offset,
            visited: HashSet::new(),
            scores: Vec::new(),
            best: None,
        };
        if self.config.stepwise {
            search.stepwise(allow_constant);
        } else {
            search.exhaustive(allow_constant);
        }

        let Search { scores, best, .. } = search;
        let mut scores = scores;
        scores.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        self.model_scores = scores;
        self.differencing = Some((d, cap_d));

        match best {
            Some((model, _)) => {
                self.selected = Some(model);
                Ok(())
            }
            None => {
                self.selected = None;
                Err(ForecastError::ComputationError(
                    "no SARIMA candidate could be fitted".to_string(),
                ))
            }
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn predict_with_levels(&self, horizon: usize, levels: &[f64]) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_levels(horizon, levels)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        match &self.selected {
            Some(model) => model.name(),
            None => "AutoARIMA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gaussian(rng: &mut StdRng) -> f64 {
        let u1: f64 = rng.gen::<f64>().max(1e-12);
        let u2: f64 = rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::monthly_from(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), values).unwrap()
    }

    fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = vec![10.0];
        for _ in 1..n {
            let prev = *values.last().unwrap();
            values.push(10.0 + phi * (prev - 10.0) + gaussian(&mut rng));
        }
        values
    }

    fn seasonal_trend(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let pattern = [0.0, -1.0, 2.0, 3.0, 1.0, 0.5, -0.5, -2.0, 1.5, 2.5, -1.5, -4.5];
        (0..n)
            .map(|i| 20.0 + 0.1 * i as f64 + pattern[i % 12] + 0.2 * gaussian(&mut rng))
            .collect()
    }

    #[test]
    fn auto_arima_selects_ar_component() {
        let ts = series(ar1(0.7, 300, 4));
        let mut model = AutoARIMA::new();
        model.fit(&ts).unwrap();

        let spec = model.selected_spec().unwrap();
        assert_eq!(spec.d, 0);
        assert!(spec.p >= 1);
        assert!(!model.model_scores().is_empty());
        assert_eq!(model.differencing(), Some((0, 0)));

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn auto_arima_differences_random_walk() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut level = 50.0;
        let values: Vec<f64> = (0..300)
            .map(|_| {
                level += gaussian(&mut rng);
                level
            })
            .collect();
        let mut model = AutoARIMA::new();
        model.fit(&series(values)).unwrap();
        assert_eq!(model.selected_spec().unwrap().d, 1);
    }

    #[test]
    fn auto_arima_model_scores_sorted() {
        let mut model = AutoARIMA::new();
        model.fit(&series(ar1(0.5, 200, 8))).unwrap();

        let scores = model.model_scores();
        for i in 1..scores.len() {
            assert!(scores[i].score >= scores[i - 1].score);
        }
        let best = model.selected_model().unwrap();
        assert_eq!(scores[0].spec, best.spec());
        assert_eq!(scores[0].include_constant, best.include_constant());
    }

    #[test]
    fn stepwise_respects_budget_and_order_bounds() {
        let config = AutoARIMAConfig::default()
            .with_max_models(6)
            .with_max_order(3);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(ar1(0.5, 200, 9))).unwrap();
        assert!(model.model_scores().len() <= 6);
        for c in model.model_scores() {
            assert!(c.spec.p + c.spec.q + c.spec.cap_p + c.spec.cap_q <= 3);
        }
    }

    #[test]
    fn exhaustive_covers_grid() {
        let config = AutoARIMAConfig::default()
            .with_max_orders(2, 1, 2)
            .with_differencing(0, 0)
            .exhaustive();
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(ar1(0.5, 200, 10))).unwrap();
        // 3 x 3 orders, with and without a mean.
        assert_eq!(model.model_scores().len(), 18);
    }

    #[test]
    fn selection_is_deterministic() {
        let ts = series(seasonal_trend(144, 3));
        let config = AutoARIMAConfig::default()
            .with_seasonal_period(12)
            .with_max_orders(2, 1, 2)
            .with_seasonal_orders(1, 1, 1);
        let mut a = AutoARIMA::with_config(config.clone());
        let mut b = AutoARIMA::with_config(config);
        a.fit(&ts).unwrap();
        b.fit(&ts).unwrap();
        assert_eq!(a.selected_spec(), b.selected_spec());
        assert_eq!(
            a.selected_model().unwrap().named_coefficients(),
            b.selected_model().unwrap().named_coefficients()
        );
    }

    #[test]
    fn seasonal_series_is_seasonally_differenced() {
        let ts = series(seasonal_trend(144, 5));
        let config = AutoARIMAConfig::default()
            .with_seasonal_period(12)
            .with_max_orders(2, 1, 2)
            .with_seasonal_orders(1, 1, 1);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&ts).unwrap();

        let spec = model.selected_spec().unwrap();
        assert_eq!(spec.cap_d, 1);
        assert_eq!(spec.s, 12);
        assert!(spec.d + spec.cap_d <= 2);

        let forecast = model.predict_with_levels(12, &[0.95, 0.99]).unwrap();
        assert_eq!(forecast.horizon(), 12);
        assert_eq!(forecast.intervals().len(), 2);
    }

    #[test]
    fn short_series_drops_seasonality() {
        let ts = series(ar1(0.3, 20, 2));
        let mut model = AutoARIMA::seasonal(12).with_small_search();
        model.fit(&ts).unwrap();
        assert!(!model.selected_spec().unwrap().is_seasonal());
    }

    #[test]
    fn short_seasonal_series_shrinks_the_search() {
        for n in [25, 36] {
            let ts = series(seasonal_trend(n, 6).into_iter().map(f64::ln).collect());
            let mut model = AutoARIMA::seasonal(12);
            model.fit(&ts).unwrap();

            let best = model.selected_model().unwrap();
            let spec = best.spec();
            assert_eq!(spec.s, 12, "n = {n}");
            assert!(
                spec.differencing_lag() + best.conditioning_offset() + best.num_params() + 2 <= n,
                "n = {n}, selected {spec}"
            );
            assert!(!model.model_scores().is_empty());
            assert_eq!(model.predict(12).unwrap().horizon(), 12);
        }
    }

    #[test]
    fn order_bounds_shrink_seasonal_ar_first() {
        let config = AutoARIMAConfig::default();
        let full = OrderBounds::new(&config, 12);
        assert_eq!(full.offset(12), 29);
        assert_eq!(full.shrink_to(200, 12, 13, false), Some(full));

        let shrunk = full.shrink_to(36, 12, 13, false).unwrap();
        assert_eq!(shrunk.max_cap_p, 0);
        assert!(shrunk.needed(12, 13, false) <= 36);
        assert_eq!(full.shrink_to(15, 12, 13, false), None);
    }

    #[test]
    fn stepwise_fits_null_model_without_constant() {
        let config = AutoARIMAConfig::default().with_differencing(0, 0);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&series(ar1(0.5, 200, 11))).unwrap();
        let null = SARIMASpec::new(0, 0, 0, 0, 0, 0, 0);
        let scores = model.model_scores();
        assert!(scores.iter().any(|c| c.spec == null && c.include_constant));
        assert!(scores.iter().any(|c| c.spec == null && !c.include_constant));
    }

    #[test]
    fn auto_arima_insufficient_data() {
        let ts = series(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut model = AutoARIMA::new();
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn auto_arima_requires_fit() {
        let model = AutoARIMA::new();
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert_eq!(model.name(), "AutoARIMA");
    }

    #[test]
    fn auto_arima_config() {
        let config = AutoARIMAConfig::default()
            .with_max_orders(3, 1, 3)
            .with_criterion(InformationCriterion::Bic)
            .exhaustive();

        assert_eq!(config.max_p, 3);
        assert_eq!(config.max_d, 1);
        assert_eq!(config.max_q, 3);
        assert_eq!(config.criterion, InformationCriterion::Bic);
        assert!(!config.stepwise);
        assert_eq!(InformationCriterion::default().to_string(), "AICc");
    }

    impl AutoARIMA {
        fn with_small_search(mut self) -> Self {
            self.config = self.config.clone().with_max_orders(1, 1, 1);
            self
        }
    }
}
