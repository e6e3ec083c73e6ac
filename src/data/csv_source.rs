//! Offline rows from a CSV export of a table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::parse_period;
use crate::data::{TableRequest, TableRow, TableSource};
use crate::error::{ForecastError, Result};

fn default_date() -> String {
    "REF_DATE".into()
}

fn default_geography() -> String {
    "GEO".into()
}

fn default_category() -> String {
    "Products and product groups".into()
}

fn default_value() -> String {
    "VALUE".into()
}

/// Column names of the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvColumns {
    #[serde(default = "default_date")]
    pub date: String,
    #[serde(default = "default_geography")]
    pub geography: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_value")]
    pub value: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            date: default_date(),
            geography: default_geography(),
            category: default_category(),
            value: default_value(),
        }
    }
}

/// Reads rows from a CSV file on every fetch.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    path: PathBuf,
    columns: CsvColumns,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: CsvColumns::default(),
        }
    }

    pub fn with_columns(mut self, columns: CsvColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<TableRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| ForecastError::Io(format!("{}: {e}", self.path.display())))?;

        let headers = reader.headers()?.clone();
        let index_of = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| {
                    ForecastError::Parse(format!(
                        "column {name:?} missing from {}",
                        self.path.display()
                    ))
                })
        };
        let date_idx = index_of(&self.columns.date)?;
        let geo_idx = index_of(&self.columns.geography)?;
        let cat_idx = index_of(&self.columns.category)?;
        let value_idx = index_of(&self.columns.value)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();
            let raw_value = field(value_idx);
            let value = match raw_value {
                "" | ".." | "..." | "x" | "F" => None,
                text => Some(text.parse::<f64>().map_err(|_| {
                    ForecastError::Parse(format!(
                        "line {}: invalid value {text:?}",
                        line + 2
                    ))
                })?),
            };
            rows.push(TableRow {
                ref_date: parse_period(field(date_idx))?,
                geography: field(geo_idx).to_string(),
                category: field(cat_idx).to_string(),
                value,
            });
        }
        Ok(rows)
    }
}

impl TableSource for CsvTableSource {
    fn describe(&self) -> String {
        format!("CSV {}", self.path.display())
    }

    fn fetch(&self, _request: &TableRequest) -> Result<Vec<TableRow>> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MissingValuePolicy;
    use crate::data::{load_series, write_series_csv};
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_statcan_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "table.csv",
            "\u{feff}\"REF_DATE\",\"GEO\",\"DGUID\",\"Products and product groups\",\"UOM\",\"VALUE\"\n\
             \"2023-11\",\"Canada\",\"2016A000011124\",\"Food\",\"2002=100\",\"187.1\"\n\
             \"2023-12\",\"Canada\",\"2016A000011124\",\"Food\",\"2002=100\",\"188.0\"\n\
             \"2023-12\",\"Canada\",\"2016A000011124\",\"Shelter\",\"2002=100\",\"..\"\n",
        );
        let rows = CsvTableSource::new(&path).fetch(&TableRequest::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].value, Some(188.0));
        assert_eq!(rows[2].value, None);
        assert_eq!(rows[2].category, "Shelter");
    }

    #[test]
    fn custom_columns_and_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let text = "month,region,item,index\n2020-01-01,Canada,Food,1.5\n";
        let path = write_file(&dir, "t.csv", text);
        let columns = CsvColumns {
            date: "month".into(),
            geography: "region".into(),
            category: "item".into(),
            value: "index".into(),
        };
        let rows = CsvTableSource::new(&path)
            .with_columns(columns)
            .fetch(&TableRequest::default())
            .unwrap();
        assert_eq!(rows[0].value, Some(1.5));

        let err = CsvTableSource::new(&path).fetch(&TableRequest::default()).unwrap_err();
        assert!(matches!(err, ForecastError::Parse(msg) if msg.contains("REF_DATE")));
    }

    #[test]
    fn written_series_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "in.csv",
            "REF_DATE,GEO,Products and product groups,VALUE\n\
             2020-01,Canada,Food,100\n2020-02,Canada,Food,101.5\n2020-03,Canada,Food,99.25\n",
        );
        let request = TableRequest::default();
        let series =
            load_series(&CsvTableSource::new(&path), &request, MissingValuePolicy::Error).unwrap();

        let out = dir.path().join("out.csv");
        write_series_csv(&series, &request, &out).unwrap();
        let again =
            load_series(&CsvTableSource::new(&out), &request, MissingValuePolicy::Error).unwrap();
        assert_eq!(again.values(), series.values());
        assert_eq!(again.timestamps(), series.timestamps());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CsvTableSource::new("/nonexistent/table.csv")
            .fetch(&TableRequest::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::Io(_)));
    }
}
