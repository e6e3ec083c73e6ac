//! Retrieval of a single category series from a statistical table.
//!
//! A [`TableSource`] returns raw rows for a table; [`load_series`] narrows
//! them to one category and geography and validates the result as a
//! contiguous, strictly positive monthly [`TimeSeries`].

mod csv_source;
mod statcan;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{MissingValuePolicy, TimeSeries};
use crate::error::{ForecastError, Result};

pub use csv_source::{CsvColumns, CsvTableSource};
#[cfg(feature = "fetch")]
pub use statcan::StatCanClient;
pub use statcan::{
    product_id, resolve_coordinate, CubeMetadata, DataPoint, Dimension, Member, DEFAULT_BASE_URL,
};

/// Default table: Consumer Price Index, monthly, not seasonally adjusted.
pub const DEFAULT_TABLE: &str = "18-10-0004-01";

/// Language of member names in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            other => Err(ForecastError::InvalidParameter(format!(
                "unsupported language code {other:?}"
            ))),
        }
    }
}

/// Which table, and which slice of it, to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub table_id: String,
    pub language: Language,
    pub category: String,
    pub geography: String,
    /// Drop observations before this period.
    pub since: Option<NaiveDate>,
}

impl Default for TableRequest {
    fn default() -> Self {
        Self {
            table_id: DEFAULT_TABLE.to_string(),
            language: Language::En,
            category: "Food".to_string(),
            geography: "Canada".to_string(),
            since: None,
        }
    }
}

impl TableRequest {
    pub fn new(table_id: impl Into<String>, language: Language) -> Self {
        Self {
            table_id: table_id.into(),
            language,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = geography.into();
        self
    }

    pub fn since(mut self, start: NaiveDate) -> Self {
        self.since = Some(start);
        self
    }
}

/// One observation of one table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub ref_date: NaiveDate,
    pub geography: String,
    pub category: String,
    /// `None` where the agency suppressed or has not published the value.
    pub value: Option<f64>,
}

/// A provider of table rows.
pub trait TableSource {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Rows for `request`. Sources may return rows of other categories; they
    /// are filtered by [`load_series`].
    fn fetch(&self, request: &TableRequest) -> Result<Vec<TableRow>>;
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Load the requested category as a monthly series.
pub fn load_series(
    source: &dyn TableSource,
    request: &TableRequest,
    policy: MissingValuePolicy,
) -> Result<TimeSeries> {
    info!(
        source = %source.describe(),
        table = %request.table_id,
        category = %request.category,
        "loading series"
    );
    let rows = source.fetch(request)?;
    debug!(rows = rows.len(), "rows received");

    let in_category: Vec<&TableRow> = rows
        .iter()
        .filter(|r| same_name(&r.category, &request.category))
        .collect();
    if in_category.is_empty() {
        return Err(ForecastError::CategoryNotFound {
            table: request.table_id.clone(),
            dimension: "category".to_string(),
            name: request.category.clone(),
        });
    }
    let mut selected: Vec<&TableRow> = in_category
        .into_iter()
        .filter(|r| same_name(&r.geography, &request.geography))
        .collect();
    if selected.is_empty() {
        return Err(ForecastError::CategoryNotFound {
            table: request.table_id.clone(),
            dimension: "geography".to_string(),
            name: request.geography.clone(),
        });
    }

    selected.sort_by_key(|r| r.ref_date);
    if let Some(w) = selected.windows(2).find(|w| w[0].ref_date == w[1].ref_date) {
        return Err(ForecastError::TimestampError(format!(
            "duplicate period {}",
            w[0].ref_date
        )));
    }

    let timestamps: Vec<NaiveDate> = selected.iter().map(|r| r.ref_date).collect();
    let values: Vec<f64> = selected
        .iter()
        .map(|r| r.value.unwrap_or(f64::NAN))
        .collect();

    let mut series = TimeSeries::monthly(timestamps, values)?;
    if let Some(start) = request.since {
        series = series.since(start);
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
    }
    let mut series = series.sanitized(policy)?;
    if let Some((index, value)) = series.first_non_positive() {
        return Err(ForecastError::NonPositiveValue { index, value });
    }

    series.set_label(request.category.clone());
    series.set_metadata("table", request.table_id.clone());
    series.set_metadata("category", request.category.clone());
    series.set_metadata("geography", request.geography.clone());
    series.set_metadata("language", request.language.code());
    series.set_metadata("source", source.describe());

    info!(
        observations = series.len(),
        first = ?series.first_timestamp(),
        last = ?series.last_timestamp(),
        "series loaded"
    );
    Ok(series)
}

/// Write `series` as a CSV table readable by [`CsvTableSource`] with default columns.
pub fn write_series_csv(series: &TimeSeries, request: &TableRequest, path: &Path) -> Result<()> {
    let columns = CsvColumns::default();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        columns.date.as_str(),
        columns.geography.as_str(),
        columns.category.as_str(),
        columns.value.as_str(),
    ])?;
    for (date, value) in series.iter() {
        writer.write_record([
            date.format("%Y-%m").to_string(),
            request.geography.clone(),
            request.category.clone(),
            value.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
