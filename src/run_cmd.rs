use anyhow::{Context, Result};
use tracing::info;

use fpi_forecast::pipeline::Pipeline;
use fpi_forecast::report::{level_label, write_report};

use crate::cli::RunArgs;
use crate::config::FpiConfig;
use crate::convert;

/// Run the full analysis and write the report.
pub fn run(args: RunArgs) -> Result<()> {
    let mut config = FpiConfig::load(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.report.output_dir = output;
    }
    if let Some(horizon) = args.horizon {
        config.forecast.horizon = horizon;
    }
    if args.no_charts {
        config.report.charts = false;
    }

    let pipeline_config = convert::build_pipeline_config(&config)?;
    let source = convert::build_source(&config.source, args.input.as_deref())?;
    info!(source = %source.describe(), "loading series");

    let report = Pipeline::new(pipeline_config)
        .run(source.as_ref())
        .with_context(|| format!("analysis failed for {}", source.describe()))?;
    let written = write_report(&report, &config.report).with_context(|| {
        format!("failed to write report to {}", config.report.output_dir.display())
    })?;

    println!(
        "{}: {} observations, selected {}",
        report.series.label().unwrap_or("series"),
        report.series.len(),
        report.model.label
    );
    let widest = report.forecast.intervals().last();
    for (h, value) in report.forecast.point().iter().enumerate() {
        let period = report
            .forecast
            .timestamps()
            .get(h)
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| format!("h+{}", h + 1));
        match widest {
            Some(interval) => println!(
                "  {period}  {value:8.2}  [{:.2}, {:.2}] {}%",
                interval.lower[h],
                interval.upper[h],
                level_label(interval.level)
            ),
            None => println!("  {period}  {value:8.2}"),
        }
    }
    println!("{} files written to {}", written.len(), config.report.output_dir.display());
    Ok(())
}
