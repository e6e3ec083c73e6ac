//! Markdown and JSON summaries of a pipeline run.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::pipeline::{AnalysisReport, ModelSummary};
use crate::validation::{DiagnosticReport, TestSummary};

/// Format a confidence level as a percentage without trailing zeros.
pub fn level_label(level: f64) -> String {
    let pct = level * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{pct:.0}")
    } else {
        format!("{pct}")
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesSummary<'a> {
    pub label: Option<&'a str>,
    pub observations: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub metadata: &'a BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsSummary<'a> {
    pub tests: Vec<TestSummary>,
    pub findings: Vec<String>,
    pub report: &'a DiagnosticReport,
}

impl<'a> DiagnosticsSummary<'a> {
    fn new(report: &'a DiagnosticReport) -> Self {
        Self {
            tests: report.test_summaries(),
            findings: report.findings(report.alpha),
            report,
        }
    }
}

/// Serializable view of an [`AnalysisReport`], written as `summary.json`.
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub series: SeriesSummary<'a>,
    pub log_diagnostics: DiagnosticsSummary<'a>,
    pub log_diff_diagnostics: DiagnosticsSummary<'a>,
    pub seasonal_strength: Option<f64>,
    pub trend_strength: Option<f64>,
    pub model: &'a ModelSummary,
    pub bias_adjusted: bool,
    pub forecast: &'a Forecast,
    pub log_forecast: &'a Forecast,
}

impl<'a> ReportSummary<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self {
            series: SeriesSummary {
                label: report.series.label(),
                observations: report.series.len(),
                start: report.series.first_timestamp(),
                end: report.series.last_timestamp(),
                metadata: report.series.metadata(),
            },
            log_diagnostics: DiagnosticsSummary::new(&report.log_diagnostics),
            log_diff_diagnostics: DiagnosticsSummary::new(&report.diff_diagnostics),
            seasonal_strength: report.decomposition.as_ref().map(|d| d.seasonal_strength()),
            trend_strength: report.decomposition.as_ref().map(|d| d.trend_strength()),
            model: &report.model,
            bias_adjusted: report.settings.bias_adjust,
            forecast: &report.forecast,
            log_forecast: &report.log_forecast,
        }
    }
}

fn decision(rejects: bool) -> &'static str {
    if rejects {
        "reject H0"
    } else {
        "do not reject H0"
    }
}

fn write_diagnostics(
    out: &mut String,
    heading: &str,
    report: &DiagnosticReport,
) -> std::fmt::Result {
    writeln!(out, "## Diagnostics: {heading}")?;
    writeln!(out)?;
    let s = &report.stats;
    writeln!(
        out,
        "n = {}, mean = {:.5}, sd = {:.5}, min = {:.5}, max = {:.5}, skewness = {:.3}, excess kurtosis = {:.3}",
        s.n, s.mean, s.std_dev, s.min, s.max, s.skewness, s.kurtosis
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "| Test | Null hypothesis | Statistic | p-value | Decision (α = {}) |",
        report.alpha
    )?;
    writeln!(out, "|---|---|---:|---:|---|")?;
    for test in report.tests() {
        writeln!(
            out,
            "| {} | {} | {:.4} | {:.4} | {} |",
            test.name(),
            test.null_hypothesis(),
            test.statistic(),
            test.p_value(),
            decision(test.rejects_null(report.alpha))
        )?;
    }
    writeln!(out)?;
    for finding in report.findings(report.alpha) {
        writeln!(out, "- {finding}")?;
    }
    let acf_lags = report.correlogram.significant_acf_lags();
    if !acf_lags.is_empty() {
        writeln!(
            out,
            "- ACF outside the {:.0}% band at lags {acf_lags:?}.",
            report.correlogram.level * 100.0
        )?;
    }
    let pacf_lags = report.correlogram.significant_pacf_lags();
    if !pacf_lags.is_empty() {
        writeln!(
            out,
            "- PACF outside the {:.0}% band at lags {pacf_lags:?}.",
            report.correlogram.level * 100.0
        )?;
    }
    writeln!(out)
}

fn write_model(out: &mut String, model: &ModelSummary) -> std::fmt::Result {
    writeln!(out, "## Model")?;
    writeln!(out)?;
    writeln!(
        out,
        "Selected **{}** by {} among {} candidates.",
        model.label,
        model.criterion,
        model.candidates.len()
    )?;
    writeln!(out)?;
    writeln!(out, "| Coefficient | Estimate |")?;
    writeln!(out, "|---|---:|")?;
    for (name, value) in &model.coefficients {
        writeln!(out, "| {name} | {value:.5} |")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "σ² = {:.6e}, log-likelihood = {:.3}, AIC = {:.3}, AICc = {:.3}, BIC = {:.3}, n = {}",
        model.sigma2, model.log_likelihood, model.aic, model.aicc, model.bic, model.n_used
    )?;
    writeln!(out)?;
    if let Some(lb) = &model.residual_test {
        writeln!(
            out,
            "Innovations: Ljung-Box Q({}) = {:.3}, p = {:.4} ({}).",
            lb.lags,
            lb.statistic,
            lb.p_value,
            if lb.is_white_noise(0.05) {
                "consistent with white noise"
            } else {
                "autocorrelation remains"
            }
        )?;
    }
    if let Some(arch) = &model.residual_arch {
        writeln!(
            out,
            "Innovations: ARCH LM = {:.3}, p = {:.4}.",
            arch.lagrange_multiplier.statistic, arch.lagrange_multiplier.p_value
        )?;
    }
    writeln!(out)?;
    writeln!(out, "| Rank | Candidate | {} |", model.criterion)?;
    writeln!(out, "|---:|---|---:|")?;
    for (rank, candidate) in model.candidates.iter().take(10).enumerate() {
        writeln!(
            out,
            "| {} | {}{} | {:.3} |",
            rank + 1,
            candidate.spec,
            if candidate.include_constant { " with constant" } else { "" },
            candidate.score
        )?;
    }
    writeln!(out)
}

fn write_forecast(out: &mut String, forecast: &Forecast, bias_adjusted: bool) -> std::fmt::Result {
    writeln!(out, "## Forecast")?;
    writeln!(out)?;
    if bias_adjusted {
        writeln!(out, "Point forecasts are bias-adjusted means on the index scale.")?;
        writeln!(out)?;
    }
    write!(out, "| Period | Forecast |")?;
    for interval in forecast.intervals() {
        let pct = level_label(interval.level);
        write!(out, " {pct}% low | {pct}% high |")?;
    }
    writeln!(out)?;
    write!(out, "|---|---:|")?;
    for _ in forecast.intervals() {
        write!(out, "---:|---:|")?;
    }
    writeln!(out)?;
    for h in 0..forecast.horizon() {
        let period = forecast
            .timestamps()
            .get(h)
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| format!("h+{}", h + 1));
        write!(out, "| {period} | {:.2} |", forecast.point()[h])?;
        for interval in forecast.intervals() {
            write!(out, " {:.2} | {:.2} |", interval.lower[h], interval.upper[h])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Render the run as a markdown document.
pub fn render_markdown(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();
    write_document(&mut out, report).map_err(|e| ForecastError::Render(e.to_string()))?;
    Ok(out)
}

fn write_document(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    let label = report.series.label().unwrap_or("Series");
    writeln!(out, "# {label}: analysis and forecast")?;
    writeln!(out)?;
    for (key, value) in report.series.metadata() {
        writeln!(out, "- {key}: {value}")?;
    }
    if let (Some(start), Some(end)) = (
        report.series.first_timestamp(),
        report.series.last_timestamp(),
    ) {
        writeln!(
            out,
            "- observations: {} ({} to {})",
            report.series.len(),
            start.format("%Y-%m"),
            end.format("%Y-%m")
        )?;
    }
    writeln!(out)?;

    write_diagnostics(out, &format!("log({label})"), &report.log_diagnostics)?;
    write_diagnostics(out, &format!("Δlog({label})"), &report.diff_diagnostics)?;

    if let Some(d) = &report.decomposition {
        writeln!(out, "## Decomposition")?;
        writeln!(out)?;
        writeln!(
            out,
            "Additive decomposition of log({label}) with period {}: seasonal strength {:.3}, trend strength {:.3}.",
            d.period,
            d.seasonal_strength(),
            d.trend_strength()
        )?;
        writeln!(out)?;
    }

    write_model(out, &report.model)?;
    write_forecast(out, &report.forecast, report.settings.bias_adjust)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_labels() {
        assert_eq!(level_label(0.95), "95");
        assert_eq!(level_label(0.99), "99");
        assert_eq!(level_label(0.975), "97.5");
    }

    #[test]
    fn forecast_table_has_one_column_pair_per_level() {
        let mut forecast = Forecast::from_values(vec![100.0, 101.0]);
        forecast.push_interval(0.99, vec![90.0, 89.0], vec![110.0, 113.0]).unwrap();
        forecast.push_interval(0.95, vec![95.0, 94.0], vec![105.0, 108.0]).unwrap();
        let mut out = String::new();
        write_forecast(&mut out, &forecast, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], "| Period | Forecast | 95% low | 95% high | 99% low | 99% high |");
        assert_eq!(lines[4], "| h+1 | 100.00 | 95.00 | 105.00 | 90.00 | 110.00 |");
        assert_eq!(lines.len(), 6);
    }
}
