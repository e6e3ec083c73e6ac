//! Pure conversion functions: TOML config structs -> library config types.

use std::path::Path;

use anyhow::{bail, Context, Result};

use fpi_forecast::core::parse_period;
use fpi_forecast::data::{CsvTableSource, TableRequest, TableSource};
use fpi_forecast::models::arima::AutoARIMAConfig;
use fpi_forecast::pipeline::{ForecastSettings, PipelineConfig};

use crate::config::*;

/// Which series to take from the table.
pub fn build_request(source: &SourceToml) -> Result<TableRequest> {
    let mut request = TableRequest::new(&source.table, source.language)
        .with_category(&source.category)
        .with_geography(&source.geography);
    if let Some(start) = &source.start {
        let period =
            parse_period(start).with_context(|| format!("invalid [source].start {start:?}"))?;
        request = request.since(period);
    }
    Ok(request)
}

/// Order search limits; the seasonal period applies to the search only.
pub fn build_model_config(model: &ModelToml) -> Result<AutoARIMAConfig> {
    if model.max_seasonal_d > 1 {
        bail!("max_seasonal_d must be 0 or 1, got {}", model.max_seasonal_d);
    }
    let mut config = AutoARIMAConfig::default()
        .with_seasonal_period(model.seasonal_period)
        .with_max_orders(model.max_p, model.max_d, model.max_q)
        .with_seasonal_orders(model.max_seasonal_p, model.max_seasonal_d, model.max_seasonal_q)
        .with_max_order(model.max_order)
        .with_criterion(model.criterion)
        .with_max_models(model.max_models);
    if !model.stepwise {
        config = config.exhaustive();
    }
    if !model.allow_constant {
        config = config.without_constant();
    }
    config.d = model.d;
    config.cap_d = model.seasonal_d;
    Ok(config)
}

pub fn build_forecast_settings(forecast: &ForecastToml) -> Result<ForecastSettings> {
    if forecast.horizon == 0 {
        bail!("[forecast].horizon must be positive");
    }
    if let Some(level) = forecast.levels.iter().find(|l| !(**l > 0.0 && **l < 1.0)) {
        bail!("[forecast].levels must lie in (0, 1), got {level}");
    }
    Ok(ForecastSettings {
        horizon: forecast.horizon,
        levels: forecast.levels.clone(),
        bias_adjust: forecast.bias_adjust,
    })
}

pub fn build_pipeline_config(config: &FpiConfig) -> Result<PipelineConfig> {
    Ok(PipelineConfig {
        request: build_request(&config.source)?,
        missing_values: config.transform.missing_values,
        diagnostics: config.diagnostics.clone(),
        model: build_model_config(&config.model)?,
        forecast: build_forecast_settings(&config.forecast)?,
    })
}

/// The table source: `input` overrides the configured one with a CSV export.
pub fn build_source(source: &SourceToml, input: Option<&Path>) -> Result<Box<dyn TableSource>> {
    if let Some(path) = input {
        return Ok(Box::new(CsvTableSource::new(path).with_columns(source.columns.clone())));
    }
    match source.kind {
        SourceKind::Csv => {
            let path = source
                .path
                .as_ref()
                .ok_or_else(|| {
                    anyhow::anyhow!("no CSV path: set [source].path in config or use --input")
                })?;
            Ok(Box::new(CsvTableSource::new(path).with_columns(source.columns.clone())))
        }
        SourceKind::Statcan => build_remote(source),
    }
}

#[cfg(feature = "fetch")]
fn build_remote(source: &SourceToml) -> Result<Box<dyn TableSource>> {
    use fpi_forecast::data::StatCanClient;
    use std::time::Duration;

    Ok(Box::new(
        StatCanClient::new()
            .with_base_url(&source.base_url)
            .with_timeout(Duration::from_secs(source.timeout_secs)),
    ))
}

#[cfg(not(feature = "fetch"))]
fn build_remote(_source: &SourceToml) -> Result<Box<dyn TableSource>> {
    bail!("remote retrieval needs the `fetch` feature; use a CSV source or --input")
}
