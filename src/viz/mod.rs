//! Visualization: render dashboard charts to **SVG** or **PNG**.
//!
//! - Time series: one line per selected country, shared axes, date X axis
//! - Latest snapshot: one bar per country at the most recent date
//! - Trend overlay: observed series plus the dashed least-squares line
//! - Correlation heatmap: 3×3 Pearson matrix with annotated cells
//!
//! The file extension picks the backend (`.svg` → SVG, otherwise bitmap).
//! Y values are scaled to thousands/millions/… and the scale is named in the
//! axis title; per-hundred metrics are left as they are.

pub mod text;
pub mod types;
pub mod util;

pub use types::{ChartFormat, ChartOptions, DEFAULT_HEIGHT, DEFAULT_WIDTH};

use crate::filter::SnapshotRow;
use crate::models::{CountrySeries, Metric};
use crate::stats::CorrelationMatrix;
use crate::trend::{TrendResult, ordinal};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use num_format::ToFormattedString;

use plotters::backend::DrawingBackend;
use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use text::truncate_to_width;
use util::{
    compute_left_label_area_px, date_range, diverging_color, format_ordinal_date, format_scaled,
    map_locale, metric_axis, office_color, value_range,
};

const MARGIN: u32 = 16;
const Y_LABELS: usize = 10;
const X_LABELS: usize = 8;

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Open the right backend for `out_path` and hand its root area to `$draw`.
macro_rules! with_backend {
    ($out_path:expr, $opts:expr, |$root:ident| $draw:expr) => {{
        ensure_fonts_registered();
        let out_path: &Path = $out_path.as_ref();
        let path_string = out_path.to_string_lossy().into_owned();
        let size = ($opts.width, $opts.height);
        match ChartFormat::from_path(out_path) {
            ChartFormat::Svg => {
                let $root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
                $draw
            }
            ChartFormat::Png => {
                let $root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
                $draw
            }
        }
    }};
}

/// Multi-series line chart of one metric, one line per country.
///
/// Countries without values still appear in the legend with an empty line.
/// Fails only when no country has a single value.
pub fn plot_time_series<P: AsRef<Path>>(
    series: &[CountrySeries],
    metric: Metric,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let (x_min, x_max) = date_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)))
        .ok_or_else(|| anyhow!("no data to plot"))?;
    let (y_min, y_max) = value_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)))
        .ok_or_else(|| anyhow!("no data to plot"))?;
    let (y_min, y_max) = (y_min.min(0.0), y_max);
    let title = format!("{} Over Time", metric.label());

    with_backend!(out_path, opts, |root| draw_time_series(
        root,
        series,
        metric,
        &title,
        (x_min, x_max),
        (y_min, y_max)
    ))
}

fn draw_time_series<DB>(
    root: DrawingArea<DB, Shift>,
    series: &[CountrySeries],
    metric: Metric,
    title: &str,
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let (yscale, y_title) = metric_axis(metric, y_min.abs().max(y_max.abs()));
    let left = compute_left_label_area_px(y_min / yscale, y_max / yscale, Y_LABELS, 12);

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(title, (FontFamily::SansSerif, 24))
        .set_label_area_size(LabelAreaPosition::Left, left)
        .set_label_area_size(LabelAreaPosition::Bottom, 56)
        .build_cartesian_2d(x_min..x_max, (y_min / yscale)..(y_max / yscale))
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_title)
        .x_labels(X_LABELS)
        .y_labels(Y_LABELS)
        .x_label_formatter(&|x: &f64| format_ordinal_date(*x))
        .y_label_formatter(&|v: &f64| format_scaled(*v))
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    for (idx, s) in series.iter().enumerate() {
        let color = office_color(idx);
        let style = ShapeStyle {
            color,
            filled: false,
            stroke_width: 2,
        };
        let mut pts: Vec<(f64, f64)> = s
            .points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(d, v)| (ordinal(*d) as f64, *v / yscale))
            .collect();
        pts.sort_by(|a, b| a.0.total_cmp(&b.0));
        chart
            .draw_series(LineSeries::new(pts, style))
            .map_err(|e| anyhow!("{:?}", e))?
            .label(s.country.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(2)));
    }

    draw_legend(&mut chart)?;
    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Bar chart of `total_vaccinations` at the latest date, one bar per row.
pub fn plot_latest_snapshot<P: AsRef<Path>>(
    rows: &[SnapshotRow],
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    if rows.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let (num_locale, _dec_sep) = map_locale(&opts.locale);
    with_backend!(out_path, opts, |root| draw_snapshot(root, rows, num_locale))
}

fn draw_snapshot<DB>(
    root: DrawingArea<DB, Shift>,
    rows: &[SnapshotRow],
    num_locale: &num_format::Locale,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let n = rows.len() as u32;
    let y_max = rows
        .iter()
        .map(|r| r.total_vaccinations)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max)
        .max(1.0);
    let (yscale, y_title) = metric_axis(Metric::TotalVaccinations, y_max);
    // headroom for the value annotations
    let y_top = y_max * 1.12 / yscale;
    let left = compute_left_label_area_px(0.0, y_top, Y_LABELS, 12);

    let (w, _h) = root.dim_in_pixel();
    let slot_px = (w.saturating_sub(left + 2 * MARGIN) / n.max(1)).max(24);

    let caption = match rows.first() {
        Some(r) => format!("Latest Total Vaccinations ({})", r.date.format("%Y-%m-%d")),
        None => "Latest Total Vaccinations".to_string(),
    };

    // one unit per bar; a discrete axis collapses when there is a single row
    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(caption, (FontFamily::SansSerif, 24))
        .set_label_area_size(LabelAreaPosition::Left, left)
        .set_label_area_size(LabelAreaPosition::Bottom, 48)
        .build_cartesian_2d(0.0..n as f64, 0.0..y_top)
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Country")
        .y_desc(y_title)
        .x_labels(0)
        .y_labels(Y_LABELS)
        .y_label_formatter(&|v: &f64| format_scaled(*v))
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let country_style = TextStyle::from((FontFamily::SansSerif, 12).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (idx, row) in rows.iter().enumerate() {
        let center = idx as f64 + 0.5;
        let (px, py) = chart.backend_coord(&(center, 0.0));
        root.draw(&Text::new(
            truncate_to_width(&row.country, 12, slot_px.saturating_sub(4)),
            (px, py + 6),
            country_style.clone(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;

        if !row.total_vaccinations.is_finite() {
            continue;
        }
        let v = row.total_vaccinations / yscale;
        let bar = Rectangle::new(
            [(idx as f64 + 0.1, 0.0), (idx as f64 + 0.9, v)],
            office_color(idx).filled(),
        );
        chart
            .draw_series(std::iter::once(bar))
            .map_err(|e| anyhow!("{:?}", e))?;

        let label = (row.total_vaccinations.round() as i64).to_formatted_string(num_locale);
        let style = TextStyle::from((FontFamily::SansSerif, 12).into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(std::iter::once(Text::new(label, (center, v), style)))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Observed series of one country with its fitted trend line drawn dashed on top.
pub fn plot_trend<P: AsRef<Path>>(
    country: &str,
    metric: Metric,
    points: &[(NaiveDate, f64)],
    trend: &TrendResult,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let (x_min, x_max) =
        date_range(points.iter().map(|p| p.0)).ok_or_else(|| anyhow!("no data to plot"))?;
    let fitted = trend.line([trend.first_date, trend.last_date]);
    let (y_min, y_max) = value_range(points.iter().map(|p| p.1).chain(fitted.iter().map(|p| p.1)))
        .ok_or_else(|| anyhow!("no data to plot"))?;
    let title = format!("Trend of {} in {}", metric.words(), country);

    with_backend!(out_path, opts, |root| draw_trend(
        root,
        &title,
        metric,
        points,
        &fitted,
        (x_min, x_max),
        (y_min, y_max)
    ))
}

fn draw_trend<DB>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    metric: Metric,
    points: &[(NaiveDate, f64)],
    fitted: &[(NaiveDate, f64)],
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let (yscale, y_title) = metric_axis(metric, y_min.abs().max(y_max.abs()));
    let left = compute_left_label_area_px(y_min / yscale, y_max / yscale, Y_LABELS, 12);

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(title, (FontFamily::SansSerif, 22))
        .set_label_area_size(LabelAreaPosition::Left, left)
        .set_label_area_size(LabelAreaPosition::Bottom, 56)
        .build_cartesian_2d(x_min..x_max, (y_min / yscale)..(y_max / yscale))
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_title)
        .x_labels(X_LABELS)
        .y_labels(Y_LABELS)
        .x_label_formatter(&|x: &f64| format_ordinal_date(*x))
        .y_label_formatter(&|v: &f64| format_scaled(*v))
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let actual_color = office_color(0);
    let mut actual: Vec<(f64, f64)> = points
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(d, v)| (ordinal(*d) as f64, *v / yscale))
        .collect();
    actual.sort_by(|a, b| a.0.total_cmp(&b.0));
    chart
        .draw_series(LineSeries::new(actual, actual_color.stroke_width(2)))
        .map_err(|e| anyhow!("{:?}", e))?
        .label("Actual")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 24, y)], actual_color.stroke_width(2))
        });

    let trend_color = office_color(1);
    let line: Vec<(f64, f64)> = fitted
        .iter()
        .map(|(d, v)| (ordinal(*d) as f64, *v / yscale))
        .collect();
    chart
        .draw_series(dashes(&line, 48).into_iter().map(|seg| {
            PathElement::new(seg, trend_color.stroke_width(2))
        }))
        .map_err(|e| anyhow!("{:?}", e))?
        .label("Trend")
        .legend(move |(x, y)| {
            EmptyElement::at((x, y))
                + PathElement::new(vec![(0, 0), (9, 0)], trend_color.stroke_width(2))
                + PathElement::new(vec![(15, 0), (24, 0)], trend_color.stroke_width(2))
        });

    draw_legend(&mut chart)?;
    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Split a two-point line into `pieces` parts and keep every other one.
fn dashes(line: &[(f64, f64)], pieces: usize) -> Vec<Vec<(f64, f64)>> {
    let (Some(&(x0, y0)), Some(&(x1, y1))) = (line.first(), line.last()) else {
        return Vec::new();
    };
    let pieces = pieces.max(1);
    let at = |t: f64| (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
    (0..pieces)
        .step_by(2)
        .map(|i| {
            vec![
                at(i as f64 / pieces as f64),
                at((i + 1) as f64 / pieces as f64),
            ]
        })
        .collect()
}

/// Heatmap of the correlation matrix. Absent entries are drawn grey and labelled `NA`.
pub fn plot_correlation<P: AsRef<Path>>(
    matrix: &CorrelationMatrix,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    if matrix.rows_used < 2 {
        return Err(anyhow!("not enough complete rows to correlate"));
    }
    with_backend!(out_path, opts, |root| draw_correlation(root, matrix))
}

fn draw_correlation<DB>(root: DrawingArea<DB, Shift>, matrix: &CorrelationMatrix) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let names: Vec<&str> = matrix.metrics.iter().map(|m| m.column()).collect();
    let n = names.len() as u32;
    let label_px = 12u32;
    let left = names
        .iter()
        .map(|s| text::estimate_text_width_px(s, label_px))
        .max()
        .unwrap_or(0)
        + 20;

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(
            format!("Correlation Matrix ({} rows)", matrix.rows_used),
            (FontFamily::SansSerif, 22),
        )
        .set_label_area_size(LabelAreaPosition::Left, left)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d((0u32..n - 1).into_segmented(), (0u32..n - 1).into_segmented())
        .map_err(|e| anyhow!("{:?}", e))?;

    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => names.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };
    // row 0 at the top, like a printed table
    let row_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) if *i < n => names[(n - 1 - *i) as usize].to_string(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&label_of)
        .y_label_formatter(&row_label)
        .label_style((FontFamily::SansSerif, label_px))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    for i in 0..n {
        for j in 0..n {
            let value = matrix.values[i as usize][j as usize];
            let y = n - 1 - i;
            let fill = match value {
                Some(r) => diverging_color(r).filled(),
                None => RGBColor(200, 200, 200).filled(),
            };
            let cell = Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                fill,
            );
            let text = value.map_or_else(|| "NA".to_string(), |r| format!("{r:.3}"));
            let text_color = match value {
                Some(r) if r.abs() > 0.6 => WHITE,
                _ => BLACK,
            };
            let style = TextStyle::from((FontFamily::SansSerif, 18).into_font())
                .color(&text_color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart
                .draw_series(std::iter::once(cell))
                .map_err(|e| anyhow!("{:?}", e))?;
            chart
                .draw_series(std::iter::once(Text::new(
                    text,
                    (SegmentValue::CenterOf(j), SegmentValue::CenterOf(y)),
                    style,
                )))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .label_font((FontFamily::SansSerif, 14))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
