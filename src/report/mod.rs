//! Rendered artifacts of a pipeline run.
//!
//! [`write_report`] creates the output directory and writes:
//!
//! - `forecast.csv`: one row per forecast period on the index scale
//! - `summary.json`: tests, model and forecasts as JSON
//! - `summary.md`: the same as a readable document
//! - `charts/*.svg` when charts are enabled

pub mod charts;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::pipeline::AnalysisReport;

pub use charts::render_charts;
pub use summary::{level_label, render_markdown, ReportSummary};

fn default_output_dir() -> PathBuf {
    PathBuf::from("report")
}

fn default_charts() -> bool {
    true
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    640
}

/// Where and how to write the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_charts")]
    pub charts: bool,
    /// Chart width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Base chart height in pixels; multi-panel charts are taller.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            charts: default_charts(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Write `forecast` as CSV: period, point, then a lower/upper pair per level.
///
/// `log_point` adds the log-scale point forecast as a final column.
pub fn write_forecast_csv(
    forecast: &Forecast,
    log_point: Option<&[f64]>,
    path: &Path,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["period".to_string(), "forecast".to_string()];
    for interval in forecast.intervals() {
        let pct = level_label(interval.level);
        header.push(format!("lower_{pct}"));
        header.push(format!("upper_{pct}"));
    }
    if log_point.is_some() {
        header.push("log_forecast".to_string());
    }
    writer.write_record(&header)?;

    for h in 0..forecast.horizon() {
        let mut record = vec![
            forecast
                .timestamps()
                .get(h)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_else(|| (h + 1).to_string()),
            forecast.point()[h].to_string(),
        ];
        for interval in forecast.intervals() {
            record.push(interval.lower[h].to_string());
            record.push(interval.upper[h].to_string());
        }
        if let Some(log) = log_point {
            record.push(log.get(h).copied().unwrap_or(f64::NAN).to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every artifact of `report` and return the paths written.
pub fn write_report(report: &AnalysisReport, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let dir = &config.output_dir;
    fs::create_dir_all(dir).map_err(|e| ForecastError::Io(format!("{}: {e}", dir.display())))?;
    let mut written = Vec::new();

    let forecast_path = dir.join("forecast.csv");
    write_forecast_csv(&report.forecast, Some(report.log_forecast.point()), &forecast_path)?;
    written.push(forecast_path);

    let json_path = dir.join("summary.json");
    let json = serde_json::to_string_pretty(&ReportSummary::new(report))?;
    fs::write(&json_path, json)?;
    written.push(json_path);

    let md_path = dir.join("summary.md");
    fs::write(&md_path, render_markdown(report)?)?;
    written.push(md_path);

    if config.charts {
        let chart_dir = dir.join("charts");
        fs::create_dir_all(&chart_dir)?;
        written.extend(render_charts(report, &chart_dir, (config.width, config.height))?);
    }

    info!(files = written.len(), dir = %dir.display(), "report written");
    Ok(written)
}
