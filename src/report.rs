//! Plain-text rendering of the dashboard tables.

use crate::dashboard::DashboardView;
use crate::models::Metric;
use crate::stats::{CorrelationMatrix, Summary};
use crate::trend::{TrendError, TrendResult};
use std::fmt::Write;

/// Format with a fixed number of decimals; absent values print as `NA`.
pub fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.*}", decimals, x),
        Some(x) => x.to_string(),
        None => "NA".to_string(),
    }
}

/// Summary statistics table, two decimals per cell.
pub fn summary_table(summaries: &[Summary]) -> String {
    let header = ["country", "count", "mean", "std", "min", "median", "max"];
    let rows: Vec<[String; 7]> = summaries
        .iter()
        .map(|s| {
            [
                s.country.clone(),
                s.count.to_string(),
                fmt_opt(s.mean, 2),
                fmt_opt(s.std, 2),
                fmt_opt(s.min, 2),
                fmt_opt(s.median, 2),
                fmt_opt(s.max, 2),
            ]
        })
        .collect();
    render_grid(&header.map(String::from), &rows)
}

/// Correlation matrix with metric column names on both axes, three decimals.
pub fn correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut header: [String; 4] = Default::default();
    for (i, m) in matrix.metrics.iter().enumerate() {
        header[i + 1] = m.column().to_string();
    }
    let rows: Vec<[String; 4]> = matrix
        .metrics
        .iter()
        .enumerate()
        .map(|(i, m)| {
            [
                m.column().to_string(),
                fmt_opt(matrix.values[i][0], 3),
                fmt_opt(matrix.values[i][1], 3),
                fmt_opt(matrix.values[i][2], 3),
            ]
        })
        .collect();
    render_grid(&header, &rows)
}

/// The slope and fit-quality lines shown under the trend heading.
pub fn trend_lines(
    country: Option<&str>,
    metric: Metric,
    trend: &Result<TrendResult, TrendError>,
) -> Vec<String> {
    let country = country.unwrap_or("(no country selected)");
    match trend {
        Ok(fit) => vec![
            format!(
                "Trend Line Slope for {} in {}: {:.2}",
                metric.words(),
                country,
                fit.slope
            ),
            format!(
                "R-squared: {:.3} | P-value: {:.4}",
                fit.r_squared, fit.p_value
            ),
        ],
        Err(e @ TrendError::NonFinite { .. }) => {
            vec![format!("Trend analysis of {} failed: {}", country, e)]
        }
        Err(e) => vec![format!(
            "Insufficient data for trend analysis of {} ({} point(s))",
            country,
            e.points()
        )],
    }
}

/// The full text report of one render pass.
pub fn render_text(view: &DashboardView) -> String {
    let metric = view.selection.metric;
    let mut out = String::new();

    let _ = writeln!(out, "{} Over Time", metric.label());
    for s in &view.series {
        let _ = writeln!(out, "  {}: {} point(s)", s.country, s.points.len());
    }

    let _ = writeln!(out, "\nLatest Total Vaccinations");
    if view.snapshot.is_empty() {
        let _ = writeln!(out, "  (no data)");
    }
    for row in &view.snapshot {
        let _ = writeln!(
            out,
            "  {} {}: {}",
            row.date.format("%Y-%m-%d"),
            row.country,
            fmt_opt(Some(row.total_vaccinations), 0)
        );
    }

    let _ = writeln!(out, "\nSummary Statistics ({})", metric.column());
    out.push_str(&summary_table(&view.summaries));

    if let Some(matrix) = &view.correlation {
        let _ = writeln!(out, "\nCorrelation Matrix ({} complete rows)", matrix.rows_used);
        out.push_str(&correlation_table(matrix));
    }

    let _ = writeln!(out, "\nTrend Analysis");
    for line in trend_lines(view.trend_country.as_deref(), metric, &view.trend) {
        let _ = writeln!(out, "  {line}");
    }
    out
}

/// Left-align the first column, right-align the rest.
fn render_grid<const N: usize>(header: &[String; N], rows: &[[String; N]]) -> String {
    let mut widths = [0usize; N];
    for row in std::iter::once(header).chain(rows.iter()) {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(header).chain(rows.iter()) {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i == 0 {
                let _ = write!(line, "{:<w$}", cell, w = widths[i]);
            } else {
                let _ = write!(line, "  {:>w$}", cell, w = widths[i]);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_aligns_columns() {
        let header = ["a".to_string(), "bb".to_string()];
        let rows = vec![["long".to_string(), "1".to_string()]];
        assert_eq!(render_grid(&header, &rows), "a     bb\nlong   1\n");
    }

    #[test]
    fn insufficient_trend_is_one_line() {
        let lines = trend_lines(
            Some("Chile"),
            Metric::DailyVaccinations,
            &Err(TrendError::InsufficientData { points: 1 }),
        );
        assert_eq!(
            lines,
            vec!["Insufficient data for trend analysis of Chile (1 point(s))".to_string()]
        );
    }

    #[test]
    fn overflowing_trend_names_the_failure() {
        let lines = trend_lines(
            Some("Chile"),
            Metric::TotalVaccinations,
            &Err(TrendError::NonFinite { points: 4 }),
        );
        assert_eq!(
            lines,
            vec![
                "Trend analysis of Chile failed: cannot fit 4 point(s): values are not finite or overflow"
                    .to_string()
            ]
        );
    }
}
