use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use fpi_forecast::core::MissingValuePolicy;
use fpi_forecast::data::{CsvColumns, Language, DEFAULT_BASE_URL, DEFAULT_TABLE};
use fpi_forecast::models::arima::InformationCriterion;
use fpi_forecast::report::ReportConfig;
use fpi_forecast::validation::DiagnosticConfig;

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FpiConfig {
    /// Where the table comes from and which series to take.
    #[serde(default)]
    pub source: SourceToml,

    /// Preprocessing before the log transform.
    #[serde(default)]
    pub transform: TransformToml,

    /// Diagnostic suite settings.
    #[serde(default)]
    pub diagnostics: DiagnosticConfig,

    /// Order search settings.
    #[serde(default)]
    pub model: ModelToml,

    /// Horizon and interval levels.
    #[serde(default)]
    pub forecast: ForecastToml,

    /// Output directory and charts.
    #[serde(default)]
    pub report: ReportConfig,
}

impl FpiConfig {
    /// Read `path`, or fall back to the built-in defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Statcan,
    Csv,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceToml {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_geography")]
    pub geography: String,
    /// CSV export, required when `kind = "csv"`.
    pub path: Option<PathBuf>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub columns: CsvColumns,
    /// First period kept, as `YYYY-MM`.
    pub start: Option<String>,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_category() -> String {
    "Food".to_string()
}

fn default_geography() -> String {
    "Canada".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SourceToml {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            table: default_table(),
            language: Language::default(),
            category: default_category(),
            geography: default_geography(),
            path: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            columns: CsvColumns::default(),
            start: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformToml {
    /// `error`, `forward_fill`, `interpolate` or `{ fill = <value> }`.
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_seasonal_period")]
    pub seasonal_period: usize,
    #[serde(default = "default_max_pq")]
    pub max_p: usize,
    #[serde(default = "default_max_d")]
    pub max_d: usize,
    #[serde(default = "default_max_pq")]
    pub max_q: usize,
    #[serde(default = "default_max_seasonal_pq")]
    pub max_seasonal_p: usize,
    #[serde(default = "default_max_seasonal_d")]
    pub max_seasonal_d: usize,
    #[serde(default = "default_max_seasonal_pq")]
    pub max_seasonal_q: usize,
    #[serde(default = "default_max_order")]
    pub max_order: usize,
    #[serde(default)]
    pub criterion: InformationCriterion,
    #[serde(default = "default_true")]
    pub stepwise: bool,
    #[serde(default = "default_max_models")]
    pub max_models: usize,
    #[serde(default = "default_true")]
    pub allow_constant: bool,
    /// Fixed non-seasonal differencing order.
    pub d: Option<usize>,
    /// Fixed seasonal differencing order.
    pub seasonal_d: Option<usize>,
}

fn default_seasonal_period() -> usize {
    12
}

fn default_max_pq() -> usize {
    5
}

fn default_max_d() -> usize {
    2
}

fn default_max_seasonal_pq() -> usize {
    2
}

fn default_max_seasonal_d() -> usize {
    1
}

fn default_max_order() -> usize {
    5
}

fn default_max_models() -> usize {
    94
}

fn default_true() -> bool {
    true
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            seasonal_period: default_seasonal_period(),
            max_p: default_max_pq(),
            max_d: default_max_d(),
            max_q: default_max_pq(),
            max_seasonal_p: default_max_seasonal_pq(),
            max_seasonal_d: default_max_seasonal_d(),
            max_seasonal_q: default_max_seasonal_pq(),
            max_order: default_max_order(),
            criterion: InformationCriterion::default(),
            stepwise: true,
            max_models: default_max_models(),
            allow_constant: true,
            d: None,
            seasonal_d: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastToml {
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_levels")]
    pub levels: Vec<f64>,
    #[serde(default)]
    pub bias_adjust: bool,
}

fn default_horizon() -> usize {
    12
}

fn default_levels() -> Vec<f64> {
    vec![0.95, 0.99]
}

impl Default for ForecastToml {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            levels: default_levels(),
            bias_adjust: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: FpiConfig = toml::from_str("").unwrap();
        assert_eq!(config.source.kind, SourceKind::Statcan);
        assert_eq!(config.source.table, "18-10-0004-01");
        assert_eq!(config.model.seasonal_period, 12);
        assert_eq!(config.model.max_models, 94);
        assert_eq!(config.forecast.levels, vec![0.95, 0.99]);
        assert!(config.report.charts);
    }

    #[test]
    fn sections_override_defaults() {
        let config: FpiConfig = toml::from_str(
            r#"
            [source]
            kind = "csv"
            path = "data/18100004.csv"
            language = "fr"
            category = "Aliments"
            start = "1990-01"

            [source.columns]
            category = "Produits et groupes de produits"

            [transform]
            missing_values = "interpolate"

            [diagnostics]
            alpha = 0.01

            [model]
            criterion = "bic"
            stepwise = false

            [forecast]
            horizon = 24
            bias_adjust = true

            [report]
            output_dir = "out"
            charts = false
            "#,
        )
        .unwrap();
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.source.language, Language::Fr);
        assert_eq!(config.source.columns.category, "Produits et groupes de produits");
        assert_eq!(config.source.columns.date, "REF_DATE");
        assert_eq!(config.transform.missing_values, MissingValuePolicy::Interpolate);
        assert_eq!(config.diagnostics.alpha, 0.01);
        assert_eq!(config.model.criterion, InformationCriterion::Bic);
        assert!(!config.model.stepwise);
        assert_eq!(config.forecast.horizon, 24);
        assert!(!config.report.charts);
        assert_eq!(config.report.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn bundled_example_parses() {
        let config: FpiConfig = toml::from_str(include_str!("../fpi.toml")).unwrap();
        assert_eq!(config.source.kind, SourceKind::Statcan);
        assert_eq!(config.model.criterion, InformationCriterion::Aicc);
        assert_eq!(config.report.width, 1024);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<FpiConfig>("[model]\nmax_pp = 3\n").is_err());
        assert!(toml::from_str::<FpiConfig>("[extra]\n").is_err());
    }

    #[test]
    fn fill_policy_parses() {
        let config: FpiConfig =
            toml::from_str("[transform]\nmissing_values = { fill = 100.0 }\n").unwrap();
        assert_eq!(config.transform.missing_values, MissingValuePolicy::Fill(100.0));
    }
}
