//! The analysis pipeline: load, transform, diagnose, select a model, forecast.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{Forecast, MissingValuePolicy, TimeSeries};
use crate::data::{load_series, TableRequest, TableSource};
use crate::error::{ForecastError, Result};
use crate::models::arima::{
    AutoARIMA, AutoARIMAConfig, CandidateScore, InformationCriterion, SARIMASpec, SARIMA,
};
use crate::models::Forecaster;
use crate::seasonality::{decompose, Decomposition, DecompositionType};
use crate::transform::{diff, exp, log};
use crate::validation::{
    arch_test, ljung_box, run_diagnostics, ArchReport, DiagnosticConfig, DiagnosticReport,
    LjungBoxResult,
};

/// Forecast horizon and interval levels.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    pub horizon: usize,
    /// Confidence levels of the prediction intervals.
    pub levels: Vec<f64>,
    /// Report the mean `exp(μ)(1 + σ²/2)` instead of the median `exp(μ)`.
    pub bias_adjust: bool,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon: 12,
            levels: vec![0.95, 0.99],
            bias_adjust: false,
        }
    }
}

/// Everything the pipeline needs besides the data source.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub request: TableRequest,
    pub missing_values: MissingValuePolicy,
    pub diagnostics: DiagnosticConfig,
    pub model: AutoARIMAConfig,
    pub forecast: ForecastSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request: TableRequest::default(),
            missing_values: MissingValuePolicy::Error,
            diagnostics: DiagnosticConfig::default(),
            model: AutoARIMAConfig::default().with_seasonal_period(12),
            forecast: ForecastSettings::default(),
        }
    }
}

/// The selected model and how it was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub label: String,
    pub spec: SARIMASpec,
    pub include_constant: bool,
    pub coefficients: Vec<(String, f64)>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    /// Observations entering the sum of squares.
    pub n_used: usize,
    pub criterion: InformationCriterion,
    /// Every evaluated candidate, best first.
    pub candidates: Vec<CandidateScore>,
    /// Ljung-Box on the innovations, when enough lags remain.
    pub residual_test: Option<LjungBoxResult>,
    /// Conditional heteroscedasticity left in the innovations.
    pub residual_arch: Option<ArchReport>,
    /// Innovations over the effective sample.
    #[serde(skip)]
    pub innovations: Vec<f64>,
}

impl ModelSummary {
    fn from_search(search: &AutoARIMA) -> Result<Self> {
        let model: &SARIMA = search.selected_model().ok_or(ForecastError::FitRequired)?;
        let innovations = model.innovations().unwrap_or_default().to_vec();
        let fitted_params = model.spec().num_coefficients();
        let lags = (innovations.len() / 5).min(24).max(fitted_params + 1);
        let residual_test = ljung_box(&innovations, Some(lags), fitted_params).ok();
        let residual_arch = arch_test(&innovations, lags.min(12)).ok();

        Ok(Self {
            label: model.name().to_string(),
            spec: model.spec(),
            include_constant: model.include_constant(),
            coefficients: model.named_coefficients(),
            sigma2: model.sigma2().unwrap_or(f64::NAN),
            log_likelihood: model.log_likelihood().unwrap_or(f64::NAN),
            aic: model.aic().unwrap_or(f64::NAN),
            aicc: model.aicc().unwrap_or(f64::NAN),
            bic: model.bic().unwrap_or(f64::NAN),
            n_used: model.n_used(),
            criterion: search.config().criterion,
            candidates: search.model_scores().to_vec(),
            residual_test,
            residual_arch,
            innovations,
        })
    }
}

/// All artifacts of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// The series as loaded.
    pub series: TimeSeries,
    pub log_series: TimeSeries,
    /// First difference of the log series (monthly log growth).
    pub log_diff: TimeSeries,
    pub log_diagnostics: DiagnosticReport,
    pub diff_diagnostics: DiagnosticReport,
    /// Additive decomposition of the log series, when it spans two cycles.
    pub decomposition: Option<Decomposition>,
    pub model: ModelSummary,
    /// Forecast of the log series.
    pub log_forecast: Forecast,
    /// Forecast on the index scale.
    pub forecast: Forecast,
    /// In-sample one-step predictions on the index scale, NaN where undefined.
    pub fitted: Vec<f64>,
    pub settings: ForecastSettings,
}

/// Runs the analysis stages in order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured series from `source` and analyse it.
    pub fn run(&self, source: &dyn TableSource) -> Result<AnalysisReport> {
        let series = load_series(source, &self.config.request, self.config.missing_values)?;
        self.analyze(series)
    }

    /// Analyse an already loaded series.
    pub fn analyze(&self, series: TimeSeries) -> Result<AnalysisReport> {
        let settings = &self.config.forecast;
        if settings.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be positive".into(),
            ));
        }
        if let Some(level) = settings.levels.iter().find(|l| !(**l > 0.0 && **l < 1.0)) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        info!(observations = series.len(), "transforming series");
        let log_series = log(&series)?;
        let log_diff = diff(&log_series, 1)?;

        info!("running diagnostics");
        let log_diagnostics = run_diagnostics(&log_series, &self.config.diagnostics)?;
        let diff_diagnostics = run_diagnostics(&log_diff, &self.config.diagnostics)?;

        let period = self.config.model.seasonal_period;
        let decomposition = if period >= 2 {
            match decompose(log_series.values(), period, DecompositionType::Additive) {
                Ok(d) => {
                    info!(
                        seasonal_strength = d.seasonal_strength(),
                        trend_strength = d.trend_strength(),
                        "decomposed log series"
                    );
                    Some(d)
                }
                Err(err) => {
                    warn!(error = %err, "decomposition skipped");
                    None
                }
            }
        } else {
            None
        };

        info!(
            criterion = %self.config.model.criterion,
            stepwise = self.config.model.stepwise,
            "selecting model"
        );
        let mut search = AutoARIMA::with_config(self.config.model.clone());
        search.fit(&log_series)?;
        let model = ModelSummary::from_search(&search)?;
        info!(
            model = %model.label,
            candidates = model.candidates.len(),
            aicc = model.aicc,
            "model selected"
        );

        info!(horizon = settings.horizon, levels = ?settings.levels, "forecasting");
        let log_forecast = search.predict_with_levels(settings.horizon, &settings.levels)?;
        let mut forecast = log_forecast.map_values(f64::exp);
        if settings.bias_adjust {
            let variances = search
                .selected_model()
                .ok_or(ForecastError::FitRequired)?
                .forecast_variances(settings.horizon)?;
            let adjusted: Vec<f64> = log_forecast
                .point()
                .iter()
                .zip(variances.iter())
                .map(|(mu, v)| mu.exp() * (1.0 + v / 2.0))
                .collect();
            forecast = forecast.with_point(adjusted)?;
        }
        let fitted = search
            .fitted_values()
            .map(|f| f.iter().map(|v| v.exp()).collect())
            .unwrap_or_default();

        Ok(AnalysisReport {
            series,
            log_series,
            log_diff,
            log_diagnostics,
            diff_diagnostics,
            decomposition,
            model,
            log_forecast,
            forecast,
            fitted,
            settings: settings.clone(),
        })
    }
}

impl AnalysisReport {
    /// The loaded series back-transformed from the log series.
    pub fn reconstructed(&self) -> TimeSeries {
        exp(&self.log_series)
    }

    /// Periods covered by the loaded series and the forecast.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.series.first_timestamp()?;
        let end = self
            .forecast
            .timestamps()
            .last()
            .copied()
            .or_else(|| self.series.last_timestamp())?;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn synthetic(n: usize, seed: u64) -> TimeSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let pattern = [0.0, 0.4, 0.9, 1.2, 0.6, 0.1, -0.3, -0.8, -1.1, -0.6, -0.2, -0.2];
        let values: Vec<f64> = (0..n)
            .map(|i| {
                let noise: f64 = rng.gen::<f64>() - 0.5;
                100.0 + 0.25 * i as f64 + pattern[i % 12] + 0.2 * noise
            })
            .collect();
        let mut series =
            TimeSeries::monthly_from(NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(), values).unwrap();
        series.set_label("Food");
        series
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            model: AutoARIMAConfig::default()
                .with_seasonal_period(12)
                .with_max_orders(2, 2, 2)
                .with_seasonal_orders(1, 1, 1),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn analyze_produces_every_artifact() {
        let report = Pipeline::new(small_config()).analyze(synthetic(168, 1)).unwrap();

        assert_eq!(report.log_series.len(), 168);
        assert_eq!(report.log_diff.len(), 167);
        assert!(report.decomposition.is_some());
        assert_eq!(report.forecast.horizon(), 12);
        assert_eq!(report.forecast.intervals().len(), 2);
        assert_eq!(
            report.forecast.timestamps()[0],
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
        );
        assert!(!report.model.candidates.is_empty());
        assert_eq!(report.model.spec.s, 12);
        assert_eq!(report.fitted.len(), 168);
        assert_eq!(
            report.span(),
            Some((
                NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 12, 1).unwrap()
            ))
        );
        for (a, b) in report.reconstructed().values().iter().zip(report.series.values()) {
            approx::assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn index_forecast_is_exp_of_log_forecast() {
        let report = Pipeline::new(small_config()).analyze(synthetic(168, 2)).unwrap();
        for (p, l) in report.forecast.point().iter().zip(report.log_forecast.point()) {
            approx::assert_relative_eq!(*p, l.exp(), max_relative = 1e-12);
        }
        let wide = report.forecast.interval(0.99).unwrap();
        let narrow = report.forecast.interval(0.95).unwrap();
        for h in 0..12 {
            assert!(wide.lower[h] <= narrow.lower[h]);
            assert!(wide.upper[h] >= narrow.upper[h]);
        }
    }

    #[test]
    fn bias_adjustment_raises_point_forecast() {
        let mut config = small_config();
        config.forecast.bias_adjust = true;
        let adjusted = Pipeline::new(config).analyze(synthetic(168, 3)).unwrap();
        let plain = Pipeline::new(small_config()).analyze(synthetic(168, 3)).unwrap();
        for (a, p) in adjusted.forecast.point().iter().zip(plain.forecast.point()) {
            assert!(a > p);
        }
    }

    #[test]
    fn rejects_bad_forecast_settings() {
        let mut config = small_config();
        config.forecast.levels = vec![0.95, 1.0];
        assert!(Pipeline::new(config).analyze(synthetic(60, 4)).is_err());

        let mut config = small_config();
        config.forecast.horizon = 0;
        assert!(Pipeline::new(config).analyze(synthetic(60, 4)).is_err());
    }

    #[test]
    fn non_positive_series_fails_before_modelling() {
        let series = synthetic(60, 5).map_values(|v| v - 200.0);
        assert!(matches!(
            Pipeline::new(small_config()).analyze(series),
            Err(ForecastError::NonPositiveValue { .. })
        ));
    }
}
