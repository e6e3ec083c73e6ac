//! Pipeline runs from a table export through to the written report.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{Months, NaiveDate};
use fpi_forecast::core::MissingValuePolicy;
use fpi_forecast::data::{CsvTableSource, TableRequest, TableRow, TableSource};
use fpi_forecast::error::{ForecastError, Result};
use fpi_forecast::models::arima::AutoARIMAConfig;
use fpi_forecast::pipeline::{Pipeline, PipelineConfig};
use fpi_forecast::report::{write_report, ReportConfig};

const PATTERN: [f64; 12] = [-0.8, -0.5, 0.1, 0.6, 1.2, 1.5, 1.0, 0.4, -0.3, -0.9, -1.3, -1.0];

fn month(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2004, 1, 1).unwrap() + Months::new(i as u32)
}

fn food(i: usize) -> f64 {
    110.0 + 0.3 * i as f64 + PATTERN[i % 12] + 0.1 * (((i * 37) % 11) as f64 - 5.0) / 5.0
}

/// A table export with two categories and two geographies.
fn write_table(path: &Path, months: usize, gap_at: Option<usize>) {
    let mut text = String::from(
        "\u{feff}\"REF_DATE\",\"GEO\",\"DGUID\",\"Products and product groups\",\"UOM\",\"VALUE\"\n",
    );
    for i in 0..months {
        let date = month(i).format("%Y-%m");
        let value = if Some(i) == gap_at {
            "..".to_string()
        } else {
            format!("{:.1}", food(i))
        };
        let shelter = 90.0 + i as f64;
        let quebec = 105.0 + 0.2 * i as f64;
        for (geo, dguid, category, value) in [
            ("Canada", "2016A000011124", "Food", value),
            ("Canada", "2016A000011124", "Shelter", format!("{shelter:.1}")),
            ("Quebec", "2016A000224", "Food", format!("{quebec:.1}")),
        ] {
            writeln!(
                text,
                "\"{date}\",\"{geo}\",\"{dguid}\",\"{category}\",\"2002=100\",\"{value}\""
            )
            .unwrap();
        }
    }
    fs::write(path, text).unwrap();
}

fn small_model() -> AutoARIMAConfig {
    AutoARIMAConfig::default()
        .with_seasonal_period(12)
        .with_max_orders(2, 2, 2)
        .with_seasonal_orders(1, 1, 1)
}

#[test]
fn csv_export_to_report() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("18100004.csv");
    write_table(&table, 180, None);

    let config = PipelineConfig {
        model: small_model(),
        ..PipelineConfig::default()
    };
    let report = Pipeline::new(config).run(&CsvTableSource::new(&table)).unwrap();

    assert_eq!(report.series.len(), 180);
    assert_eq!(report.series.label(), Some("Food"));
    assert_eq!(report.series.metadata().get("geography").map(String::as_str), Some("Canada"));
    assert_eq!(report.forecast.timestamps()[0], month(180));
    assert_eq!(report.forecast.timestamps()[11], month(191));
    for (p, l) in report.forecast.point().iter().zip(report.log_forecast.point()) {
        assert!((p - l.exp()).abs() < 1e-9 * p);
    }

    let out = dir.path().join("report");
    let written = write_report(
        &report,
        &ReportConfig {
            output_dir: out.clone(),
            width: 480,
            height: 320,
            ..ReportConfig::default()
        },
    )
    .unwrap();
    assert!(written.len() > 3);
    let csv = fs::read_to_string(out.join("forecast.csv")).unwrap();
    let first_row = csv.lines().nth(1).unwrap();
    assert!(first_row.starts_with("2019-01,"), "{first_row}");
}

#[test]
fn gaps_follow_the_missing_value_policy() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("gappy.csv");
    write_table(&table, 120, Some(60));
    let source = CsvTableSource::new(&table);

    let strict = Pipeline::new(PipelineConfig {
        model: small_model(),
        ..PipelineConfig::default()
    });
    assert!(matches!(strict.run(&source), Err(ForecastError::MissingValues)));

    let lenient = Pipeline::new(PipelineConfig {
        model: small_model(),
        missing_values: MissingValuePolicy::Interpolate,
        ..PipelineConfig::default()
    });
    let report = lenient.run(&source).unwrap();
    let filled = report.series.values()[60];
    let neighbours = (report.series.values()[59] + report.series.values()[61]) / 2.0;
    assert!((filled - neighbours).abs() < 1e-9);
}

#[test]
fn unknown_category_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("t.csv");
    write_table(&table, 36, None);

    let config = PipelineConfig {
        request: TableRequest::default().with_category("Energy"),
        ..PipelineConfig::default()
    };
    match Pipeline::new(config).run(&CsvTableSource::new(&table)) {
        Err(ForecastError::CategoryNotFound { dimension, name, .. }) => {
            assert_eq!(dimension, "category");
            assert_eq!(name, "Energy");
        }
        other => panic!("expected CategoryNotFound, got {other:?}"),
    }
}

/// Serves rows from memory.
struct InMemory(Vec<TableRow>);

impl TableSource for InMemory {
    fn describe(&self) -> String {
        "memory".into()
    }

    fn fetch(&self, _request: &TableRequest) -> Result<Vec<TableRow>> {
        Ok(self.0.clone())
    }
}

#[test]
fn any_table_source_drives_the_pipeline() {
    let rows: Vec<TableRow> = (0..96)
        .map(|i| TableRow {
            ref_date: month(i),
            geography: "Canada".into(),
            category: "Food".into(),
            value: Some(food(i)),
        })
        .collect();
    let config = PipelineConfig {
        request: TableRequest::default().since(month(24)),
        model: small_model(),
        ..PipelineConfig::default()
    };
    let report = Pipeline::new(config).run(&InMemory(rows)).unwrap();
    assert_eq!(report.series.len(), 72);
    assert_eq!(report.series.first_timestamp(), Some(month(24)));
}
