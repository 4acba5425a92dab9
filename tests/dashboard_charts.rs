use chrono::{Duration, NaiveDate};
use tempfile::tempdir;
use vaxdash::dashboard::{render, write_charts};
use vaxdash::models::VaccinationRecord;
use vaxdash::viz::{ChartFormat, ChartOptions};
use vaxdash::{Dataset, Metric, Selection, report};

fn sample() -> Dataset {
    let start = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
    let mut records = Vec::new();
    for i in 0..6 {
        let d = start + Duration::days(i);
        let f = i as f64;
        records.push(
            VaccinationRecord::new("Chile", d)
                .with(Metric::TotalVaccinations, Some(1_000.0 + 500.0 * f))
                .with(Metric::PeopleVaccinatedPerHundred, Some(1.0 + 0.4 * f))
                .with(Metric::DailyVaccinations, Some(400.0 + 20.0 * f + (i % 2) as f64 * 15.0)),
        );
        records.push(
            VaccinationRecord::new("Israel", d)
                .with(Metric::TotalVaccinations, Some(10_000.0 + 900.0 * f))
                .with(Metric::PeopleVaccinatedPerHundred, Some(10.0 + 0.8 * f))
                .with(Metric::DailyVaccinations, Some(900.0 - 10.0 * f)),
        );
    }
    Dataset::from_records(records)
}

#[test]
fn render_fills_every_section() {
    let ds = sample();
    let sel = Selection::new(["Israel", "Chile"], Metric::DailyVaccinations)
        .with_correlation(true)
        .with_trend_country("Chile");
    let view = render(&ds, &sel);

    assert_eq!(view.rows, 12);
    assert_eq!(view.series.len(), 2);
    assert_eq!(view.series[0].country, "Israel");
    assert_eq!(view.snapshot.len(), 2);
    assert_eq!(view.summaries.len(), 2);
    assert_eq!(view.correlation.as_ref().map(|m| m.rows_used), Some(12));
    assert_eq!(view.trend_country.as_deref(), Some("Chile"));
    assert_eq!(view.trend_points.len(), 6);
    assert!(view.trend.as_ref().unwrap().slope > 0.0);

    let line = view.trend_line();
    assert_eq!(line.len(), view.trend_points.len());
    assert_eq!(line[0].0, view.trend_points[0].0);
    assert!(line.windows(2).all(|w| w[1].1 > w[0].1));

    let text = report::render_text(&view);
    assert!(text.contains("Daily Vaccinations Over Time"));
    assert!(text.contains("Summary Statistics (daily_vaccinations)"));
    assert!(text.contains("Correlation Matrix (12 complete rows)"));
    assert!(text.contains("Trend Line Slope for daily vaccinations in Chile:"));
    assert!(text.contains("R-squared:"));
}

#[test]
fn deselected_trend_country_falls_back_to_first_selected() {
    let ds = sample();
    let sel = Selection::new(["Israel"], Metric::TotalVaccinations).with_trend_country("Chile");
    let view = render(&ds, &sel);
    assert_eq!(view.trend_country.as_deref(), Some("Israel"));
}

#[test]
fn write_charts_writes_all_four() {
    let ds = sample();
    let sel = Selection::new(["Chile", "Israel"], Metric::TotalVaccinations).with_correlation(true);
    let view = render(&ds, &sel);

    let dir = tempdir().unwrap();
    let out = dir.path().join("charts");
    let written = write_charts(&view, &out, &ChartOptions::default()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["timeseries.svg", "latest.svg", "trend.svg", "correlation.svg"]
    );
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn write_charts_skips_what_cannot_be_drawn() {
    let ds = sample();
    let sel = Selection::new(["Atlantis"], Metric::TotalVaccinations);
    let view = render(&ds, &sel);

    let dir = tempdir().unwrap();
    let opts = ChartOptions {
        format: ChartFormat::Png,
        ..ChartOptions::default()
    };
    let written = write_charts(&view, dir.path(), &opts).unwrap();
    assert!(written.is_empty());
}

#[test]
fn infinite_value_does_not_break_the_render() {
    let start = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
    let ds = Dataset::from_records(
        [1.0, f64::INFINITY, 3.0]
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                VaccinationRecord::new("Chile", start + Duration::days(i as i64))
                    .with(Metric::TotalVaccinations, Some(v))
            })
            .collect(),
    );
    let view = render(&ds, &Selection::new(["Chile"], Metric::TotalVaccinations));
    assert_eq!(view.trend, Err(vaxdash::TrendError::NonFinite { points: 3 }));
    assert!(view.trend_line().is_empty());
    assert!(report::render_text(&view).contains("Trend analysis of Chile failed"));

    let dir = tempdir().unwrap();
    let written = write_charts(&view, dir.path(), &ChartOptions::default()).unwrap();
    assert_eq!(written.len(), 2);
}
