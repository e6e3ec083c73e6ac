use anyhow::{Context, Result};
use tracing::info;

use fpi_forecast::data::{load_series, write_series_csv};

use crate::cli::FetchArgs;
use crate::config::FpiConfig;
use crate::convert;

/// Load the configured series and write it as CSV.
pub fn run(args: FetchArgs) -> Result<()> {
    let config = FpiConfig::load(args.config.as_deref())?;
    let request = convert::build_request(&config.source)?;
    let source = convert::build_source(&config.source, args.input.as_deref())?;
    info!(source = %source.describe(), table = %request.table_id, "fetching series");

    let series = load_series(source.as_ref(), &request, config.transform.missing_values)
        .with_context(|| {
            format!("failed to load {} from {}", request.category, source.describe())
        })?;
    write_series_csv(&series, &request, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "{} observations of {} written to {}",
        series.len(),
        request.category,
        args.output.display()
    );
    Ok(())
}
