//! Utility functions for visualization: colors, scaling, locale mapping, date ticks.

use crate::models::Metric;
use crate::trend::ordinal;
use chrono::NaiveDate;
use num_format::Locale;
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

/// Get a color from the Office palette.
#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    OFFICE10[idx % OFFICE10.len()].to_rgba()
}

/// Diverging blue-white-red ramp for correlation cells; `r` is clamped to [-1, 1].
pub fn diverging_color(r: f64) -> RGBColor {
    let blue = (59.0, 76.0, 192.0);
    let white = (245.0, 245.0, 245.0);
    let red = (180.0, 4.0, 38.0);
    let t = r.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 {
        (white, blue, -t)
    } else {
        (white, red, t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Pick a single Y-axis scale and its human label based on the overall magnitude.
/// Returns (scale, label), e.g. (1e6, "millions").
pub fn choose_axis_scale(max_abs: f64) -> (f64, &'static str) {
    if max_abs >= 1.0e12 {
        (1.0e12, "trillions")
    } else if max_abs >= 1.0e9 {
        (1.0e9, "billions")
    } else if max_abs >= 1.0e6 {
        (1.0e6, "millions")
    } else if max_abs >= 1.0e3 {
        (1.0e3, "thousands")
    } else {
        (1.0, "")
    }
}

/// Axis scale for a metric. Per-hundred shares are never scaled.
pub fn metric_axis(metric: Metric, max_abs: f64) -> (f64, String) {
    let (scale, word) = if metric.is_per_hundred() {
        (1.0, "")
    } else {
        choose_axis_scale(max_abs)
    };
    let title = if word.is_empty() {
        metric.label().to_string()
    } else {
        format!("{} ({word})", metric.label())
    };
    (scale, title)
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'), // default
    }
}

/// Tick label for a scaled Y value: fewer decimals for larger magnitudes.
pub fn format_scaled(v: f64) -> String {
    let a = v.abs();
    let prec = if a >= 100.0 {
        0
    } else if a >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", prec, v)
}

/// X positions are ordinal days; render them back as ISO dates.
pub fn format_ordinal_date(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Ordinal-day X range covering `dates`, padded by a day on each side when degenerate.
pub fn date_range<I>(dates: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut it = dates.into_iter();
    let first = ordinal(it.next()?);
    let (min, max) = it.fold((first, first), |(lo, hi), d| {
        let o = ordinal(d);
        (lo.min(o), hi.max(o))
    });
    if min == max {
        Some(((min - 1) as f64, (max + 1) as f64))
    } else {
        Some((min as f64, max as f64))
    }
}

/// Range over the finite `values`, widened when every value is the same.
pub fn value_range<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    if (hi - lo).abs() < f64::EPSILON {
        Some((lo - 1.0, hi + 1.0))
    } else {
        Some((lo, hi))
    }
}

/// Compute a tight left label area width for the Y axis (in pixels),
/// based on the formatted tick labels that will appear.
/// - `ymin_scaled..ymax_scaled`: the **scaled** Y range you pass to Plotters
/// - `ticks`: how many Y labels you plan to show (e.g., 10)
/// - `font_px`: font size used for axis labels (e.g., 12)
///
/// Returns a width clamped to a sensible range to avoid extremes.
pub fn compute_left_label_area_px(
    ymin_scaled: f64,
    ymax_scaled: f64,
    ticks: usize,
    font_px: u32,
) -> u32 {
    let mut max_px = 0u32;
    // Sample the same number of tick positions as you request from Plotters.
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = ymin_scaled + (ymax_scaled - ymin_scaled) * t;
        max_px = max_px.max(estimate_text_width_px(&format_scaled(v), font_px));
    }

    // Room for tick marks plus the rotated axis title.
    let with_padding = max_px.saturating_add(40);
    with_padding.clamp(60, 160)
}
