//! One render pass of the dashboard.
//!
//! [`render`] is a pure function of the loaded [`Dataset`] and the current
//! [`Selection`]: it filters, builds the chart series, and computes every table.
//! Front ends call it again whenever the selection changes.

use crate::dataset::Dataset;
use crate::filter::{SnapshotRow, filter_countries};
use crate::models::{CountrySeries, Selection};
use crate::stats::{CorrelationMatrix, Summary, correlation_matrix, grouped_summary};
use crate::trend::{TrendError, TrendResult, fit_trend};
use crate::viz::{self, ChartOptions};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything derived from one selection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selection: Selection,
    /// Number of rows matching the selected countries.
    pub rows: usize,
    /// One entry per selected country, in selection order.
    pub series: Vec<CountrySeries>,
    pub snapshot: Vec<SnapshotRow>,
    pub summaries: Vec<Summary>,
    /// Only computed when the selection asks for it.
    pub correlation: Option<CorrelationMatrix>,
    pub trend_country: Option<String>,
    pub trend_points: Vec<(NaiveDate, f64)>,
    pub trend: Result<TrendResult, TrendError>,
}

impl DashboardView {
    /// The fitted trend evaluated on each observed trend date; empty when the fit failed.
    pub fn trend_line(&self) -> Vec<(NaiveDate, f64)> {
        match &self.trend {
            Ok(fit) => fit.line(self.trend_points.iter().map(|p| p.0)),
            Err(_) => Vec::new(),
        }
    }
}

pub fn render(dataset: &Dataset, selection: &Selection) -> DashboardView {
    let metric = selection.metric;
    let view = filter_countries(dataset, selection.countries());

    let series: Vec<CountrySeries> = selection
        .countries()
        .iter()
        .map(|c| CountrySeries {
            country: c.clone(),
            points: view.series(c, metric).collect(),
        })
        .collect();

    let correlation = selection.show_correlation.then(|| correlation_matrix(&view));

    let trend_country = selection.trend_country().map(str::to_string);
    let trend_points: Vec<(NaiveDate, f64)> = trend_country
        .as_deref()
        .map(|c| view.series(c, metric).collect())
        .unwrap_or_default();
    let trend = fit_trend(&trend_points);

    debug!(
        "rendered {} rows for {} countries, metric {}",
        view.len(),
        selection.countries().len(),
        metric
    );

    DashboardView {
        selection: selection.clone(),
        rows: view.len(),
        series,
        snapshot: view.latest_snapshot(),
        summaries: grouped_summary(&view, metric),
        correlation,
        trend_country,
        trend_points,
        trend,
    }
}

/// Write the charts of `view` into `dir` and return the files written.
///
/// A chart with nothing to draw is skipped with a warning; only I/O and
/// drawing failures abort.
pub fn write_charts(view: &DashboardView, dir: &Path, opts: &ChartOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let ext = opts.format.extension();
    let metric = view.selection.metric;
    let mut written = Vec::new();

    let has_points = view.series.iter().any(|s| !s.points.is_empty());
    if has_points {
        let path = dir.join(format!("timeseries.{ext}"));
        viz::plot_time_series(&view.series, metric, &path, opts)
            .with_context(|| format!("drawing {}", path.display()))?;
        written.push(path);
    } else {
        warn!("no {} values for the selected countries; skipping time series chart", metric);
    }

    if view.snapshot.is_empty() {
        warn!("no latest total vaccinations to show; skipping bar chart");
    } else {
        let path = dir.join(format!("latest.{ext}"));
        viz::plot_latest_snapshot(&view.snapshot, &path, opts)
            .with_context(|| format!("drawing {}", path.display()))?;
        written.push(path);
    }

    match (&view.trend, view.trend_country.as_deref()) {
        (Ok(fit), Some(country)) => {
            let path = dir.join(format!("trend.{ext}"));
            viz::plot_trend(country, metric, &view.trend_points, fit, &path, opts)
                .with_context(|| format!("drawing {}", path.display()))?;
            written.push(path);
        }
        (Err(e), _) => warn!("skipping trend chart: {e}"),
        (Ok(_), None) => {}
    }

    if let Some(matrix) = &view.correlation {
        if matrix.rows_used < 2 {
            warn!("only {} complete rows; skipping correlation chart", matrix.rows_used);
        } else {
            let path = dir.join(format!("correlation.{ext}"));
            viz::plot_correlation(matrix, &path, opts)
                .with_context(|| format!("drawing {}", path.display()))?;
            written.push(path);
        }
    }

    for p in &written {
        info!("wrote {}", p.display());
    }
    Ok(written)
}
