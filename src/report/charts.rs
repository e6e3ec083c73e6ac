//! SVG charts of the analysis artifacts.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use statrs::distribution::{Continuous, Normal};
use tracing::debug;

use crate::core::Forecast;
use crate::error::Result;
use crate::features::{correlogram, Correlogram, DescriptiveStats, Histogram};
use crate::pipeline::AnalysisReport;
use crate::seasonality::Decomposition;

type Panel<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const PALETTE: [RGBColor; 4] = [
    RGBColor(0, 92, 171),
    RGBColor(214, 69, 65),
    RGBColor(46, 139, 87),
    RGBColor(120, 120, 120),
];

/// Observations of history shown before the forecast.
const FAN_HISTORY: usize = 60;

/// Month start as a fractional year, the x coordinate of every time chart.
pub fn decimal_year(date: NaiveDate) -> f64 {
    date.year() as f64 + date.month0() as f64 / 12.0
}

fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad, hi + pad)
}

fn finite_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect()
}

fn line_panel(area: &Panel<'_>, title: &str, x: &[f64], lines: &[(&str, &[f64])]) -> Result<()> {
    let (x0, x1) = padded_range(x.iter().copied());
    let (y0, y1) = padded_range(lines.iter().flat_map(|(_, y)| y.iter().copied()));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(6)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.3}"))
        .draw()?;

    for (i, (name, y)) in lines.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(finite_points(x, y), color.stroke_width(2)))?
            .label(*name)
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], color));
    }
    if lines.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }
    Ok(())
}

fn bar_panel(
    area: &Panel<'_>,
    title: &str,
    lags: &[usize],
    values: &[f64],
    band: f64,
) -> Result<()> {
    let max_lag = lags.last().copied().unwrap_or(1) as f64;
    let extent = values
        .iter()
        .filter(|v| v.is_finite())
        .fold(band * 1.5, |acc, v| acc.max(v.abs()))
        .min(1.0)
        * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..max_lag + 1.0, -extent..extent)?;
    chart
        .configure_mesh()
        .x_labels(12)
        .y_labels(5)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    chart.draw_series(lags.iter().zip(values.iter()).map(|(&lag, &v)| {
        let x = lag as f64;
        Rectangle::new([(x - 0.2, 0.0), (x + 0.2, v)], PALETTE[0].filled())
    }))?;
    for level in [band, -band] {
        chart.draw_series(LineSeries::new(
            vec![(0.0, level), (max_lag + 1.0, level)],
            PALETTE[1].stroke_width(1),
        ))?;
    }
    chart.draw_series(LineSeries::new(
        vec![(0.0, 0.0), (max_lag + 1.0, 0.0)],
        BLACK.stroke_width(1),
    ))?;
    Ok(())
}

/// Line chart of one or more aligned series over decimal years.
pub fn line_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x: &[f64],
    lines: &[(&str, &[f64])],
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    line_panel(&root, title, x, lines)?;
    root.present()?;
    Ok(())
}

/// Density histogram with the normal density of matching mean and spread.
pub fn histogram_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    histogram: &Histogram,
    stats: &DescriptiveStats,
) -> Result<()> {
    let densities = histogram.densities();
    let lo = histogram.edges.first().copied().unwrap_or(0.0);
    let hi = histogram.edges.last().copied().unwrap_or(1.0);
    let curve: Vec<(f64, f64)> = match Normal::new(stats.mean, stats.std_dev) {
        Ok(normal) => (0..=200)
            .map(|i| {
                let x = lo + (hi - lo) * i as f64 / 200.0;
                (x, normal.pdf(x))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    let top = densities
        .iter()
        .copied()
        .chain(curve.iter().map(|(_, y)| *y))
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
        * 1.1;
    let (x0, x1) = padded_range([lo, hi]);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, 0.0..top)?;
    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|v| format!("{v:.3}"))
        .y_desc("Density")
        .draw()?;

    chart
        .draw_series(densities.iter().enumerate().map(|(i, &d)| {
            Rectangle::new(
                [(histogram.edges[i], 0.0), (histogram.edges[i + 1], d)],
                PALETTE[0].mix(0.6).filled(),
            )
        }))?
        .label("observed")
        .legend(|(lx, ly)| {
            Rectangle::new([(lx, ly - 5), (lx + 20, ly + 5)], PALETTE[0].mix(0.6).filled())
        });
    chart
        .draw_series(LineSeries::new(curve, PALETTE[1].stroke_width(2)))?
        .label("normal")
        .legend(|(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], PALETTE[1]));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// ACF above PACF, each with its white-noise band.
pub fn correlogram_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    correlogram: &Correlogram,
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));
    bar_panel(
        &panels[0],
        &format!("{title}: ACF"),
        &correlogram.lags,
        &correlogram.acf,
        correlogram.band,
    )?;
    bar_panel(
        &panels[1],
        &format!("{title}: PACF"),
        &correlogram.lags,
        &correlogram.pacf,
        correlogram.band,
    )?;
    root.present()?;
    Ok(())
}

/// Grid of `x_{t-k}` against `x_t` scatter plots, four per row.
pub fn lag_plot_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    lag_pairs: &[(usize, Vec<(f64, f64)>)],
) -> Result<()> {
    let cols = 4;
    let rows = lag_pairs.len().div_ceil(cols).max(1);
    let (lo, hi) = padded_range(
        lag_pairs
            .iter()
            .flat_map(|(_, pairs)| pairs.iter().flat_map(|(a, b)| [*a, *b])),
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 22).into_font())?;
    for (area, (lag, pairs)) in root.split_evenly((rows, cols)).iter().zip(lag_pairs.iter()) {
        let mut chart = ChartBuilder::on(area)
            .caption(format!("lag {lag}"), ("sans-serif", 14).into_font())
            .margin(5)
            .x_label_area_size(20)
            .y_label_area_size(40)
            .build_cartesian_2d(lo..hi, lo..hi)?;
        chart
            .configure_mesh()
            .x_labels(3)
            .y_labels(3)
            .x_label_formatter(&|v| format!("{v:.2}"))
            .y_label_formatter(&|v| format!("{v:.2}"))
            .draw()?;
        chart.draw_series(
            pairs
                .iter()
                .filter(|(a, b)| a.is_finite() && b.is_finite())
                .map(|&(a, b)| Circle::new((a, b), 2, PALETTE[0].mix(0.7).filled())),
        )?;
    }
    root.present()?;
    Ok(())
}

/// Observed, trend, seasonal and remainder panels.
pub fn decomposition_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x: &[f64],
    decomposition: &Decomposition,
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 22).into_font())?;
    let panels = root.split_evenly((4, 1));
    let components: [(&str, &[f64]); 4] = [
        ("observed", decomposition.observed.as_slice()),
        ("trend", decomposition.trend.as_slice()),
        ("seasonal", decomposition.seasonal.as_slice()),
        ("remainder", decomposition.remainder.as_slice()),
    ];
    for (area, (name, values)) in panels.iter().zip(components.iter()) {
        line_panel(area, name, x, &[(*name, *values)])?;
    }
    root.present()?;
    Ok(())
}

/// Recent history, point forecast and one shaded band per interval level.
pub fn forecast_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    history: (&[f64], &[f64]),
    forecast: &Forecast,
) -> Result<()> {
    let (hx, hy) = history;
    let start = hx.len().saturating_sub(FAN_HISTORY);
    let (hx, hy) = (&hx[start..], &hy[start..]);
    let fx: Vec<f64> = forecast.timestamps().iter().map(|d| decimal_year(*d)).collect();

    let (x0, x1) = padded_range(hx.iter().chain(fx.iter()).copied());
    let (y0, y1) = padded_range(
        hy.iter()
            .chain(forecast.point().iter())
            .chain(forecast.intervals().iter().flat_map(|i| i.lower.iter().chain(i.upper.iter())))
            .copied(),
    );

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(8)
        .x_label_formatter(&|v| format!("{v:.1}"))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    // widest band first so narrower ones stay visible
    for (k, interval) in forecast.intervals().iter().rev().enumerate() {
        let mut outline: Vec<(f64, f64)> =
            fx.iter().copied().zip(interval.upper.iter().copied()).collect();
        outline.extend(fx.iter().copied().zip(interval.lower.iter().copied()).rev());
        let shade = PALETTE[1].mix(0.15 + 0.15 * k as f64);
        chart
            .draw_series(std::iter::once(Polygon::new(outline, shade.filled())))?
            .label(format!("{:.0}% interval", interval.level * 100.0))
            .legend(move |(lx, ly)| {
                Rectangle::new([(lx, ly - 5), (lx + 20, ly + 5)], shade.filled())
            });
    }
    chart
        .draw_series(LineSeries::new(finite_points(hx, hy), PALETTE[0].stroke_width(2)))?
        .label("observed")
        .legend(|(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], PALETTE[0]));
    chart
        .draw_series(LineSeries::new(
            finite_points(&fx, forecast.point()),
            PALETTE[1].stroke_width(2),
        ))?
        .label("forecast")
        .legend(|(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], PALETTE[1]));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Innovations over time above their correlogram.
pub fn residual_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x: &[f64],
    innovations: &[f64],
    correlogram: &Correlogram,
) -> Result<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));
    line_panel(&panels[0], title, x, &[("innovations", innovations)])?;
    bar_panel(
        &panels[1],
        "Innovation ACF",
        &correlogram.lags,
        &correlogram.acf,
        correlogram.band,
    )?;
    root.present()?;
    Ok(())
}

/// Render every chart of `report` into `dir` and return the written paths.
pub fn render_charts(
    report: &AnalysisReport,
    dir: &Path,
    size: (u32, u32),
) -> Result<Vec<PathBuf>> {
    let label = report.series.label().unwrap_or("Series");
    let years =
        |dates: &[NaiveDate]| -> Vec<f64> { dates.iter().map(|d| decimal_year(*d)).collect() };
    let x_level = years(report.series.timestamps());
    let x_diff = years(report.log_diff.timestamps());
    let mut written = Vec::new();
    let mut target = |name: &str| -> PathBuf {
        let path = dir.join(name);
        written.push(path.clone());
        path
    };

    line_chart(&target("index.svg"), size, label, &x_level, &[(label, report.series.values())])?;
    line_chart(
        &target("log_index.svg"),
        size,
        &format!("log({label})"),
        &x_level,
        &[("log", report.log_series.values())],
    )?;
    line_chart(
        &target("log_diff.svg"),
        size,
        &format!("Monthly change in log({label})"),
        &x_diff,
        &[("Δlog", report.log_diff.values())],
    )?;

    for (name, diagnostics) in [
        ("log", &report.log_diagnostics),
        ("log_diff", &report.diff_diagnostics),
    ] {
        histogram_chart(
            &target(&format!("histogram_{name}.svg")),
            size,
            &format!("Histogram of {name}"),
            &diagnostics.histogram,
            &diagnostics.stats,
        )?;
        correlogram_chart(
            &target(&format!("correlogram_{name}.svg")),
            (size.0, size.1 * 3 / 2),
            name,
            &diagnostics.correlogram,
        )?;
        lag_plot_chart(
            &target(&format!("lag_plot_{name}.svg")),
            (size.0, size.1 * 3 / 2),
            &format!("Lag plots of {name}"),
            &diagnostics.lag_pairs,
        )?;
    }

    if let Some(decomposition) = &report.decomposition {
        decomposition_chart(
            &target("decomposition.svg"),
            (size.0, size.1 * 2),
            &format!("Decomposition of log({label})"),
            &x_level,
            decomposition,
        )?;
    }

    if let Ok(acf) = correlogram(&report.model.innovations, None, 0.95) {
        let x_resid = &x_level[x_level.len().saturating_sub(report.model.innovations.len())..];
        residual_chart(
            &target("residuals.svg"),
            (size.0, size.1 * 3 / 2),
            &format!("{} innovations", report.model.label),
            x_resid,
            &report.model.innovations,
            &acf,
        )?;
    }

    forecast_chart(
        &target("forecast.svg"),
        size,
        &format!("{label}: {} forecast", report.model.label),
        (&x_level, report.series.values()),
        &report.forecast,
    )?;

    debug!(charts = written.len(), dir = %dir.display(), "charts rendered");
    Ok(written)
}
