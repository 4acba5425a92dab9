use chrono::NaiveDate;
use vaxdash::models::VaccinationRecord;
use vaxdash::{Dataset, Metric, filter_countries};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
}

fn rec(country: &str, d: u32, total: Option<f64>, daily: Option<f64>) -> VaccinationRecord {
    VaccinationRecord::new(country, day(d))
        .with(Metric::TotalVaccinations, total)
        .with(Metric::DailyVaccinations, daily)
}

fn sample() -> Dataset {
    Dataset::from_records(vec![
        rec("Chile", 1, Some(100.0), None),
        rec("Israel", 1, Some(1000.0), Some(10.0)),
        rec("Chile", 2, Some(150.0), Some(50.0)),
        rec("Wales", 2, Some(5.0), Some(1.0)),
        rec("Israel", 3, None, Some(12.0)),
        rec("Chile", 3, Some(210.0), Some(55.0)),
    ])
}

#[test]
fn rows_are_exactly_the_selected_countries_in_input_order() {
    let ds = sample();
    let view = filter_countries(&ds, &["Israel", "Chile"]);
    let expected: Vec<&VaccinationRecord> = ds
        .records()
        .iter()
        .filter(|r| r.country == "Chile" || r.country == "Israel")
        .collect();
    assert_eq!(view.rows(), expected.as_slice());
    assert_eq!(view.len(), 5);
}

#[test]
fn filtering_again_with_the_same_set_changes_nothing() {
    let ds = sample();
    let once = filter_countries(&ds, &["Chile", "Wales"]);
    let twice = once.refilter(&["Chile", "Wales"]);
    assert_eq!(once.rows(), twice.rows());
}

#[test]
fn empty_or_unknown_selection_yields_empty_view() {
    let ds = sample();
    let none: [&str; 0] = [];
    assert!(filter_countries(&ds, &none).is_empty());

    let unknown = filter_countries(&ds, &["Atlantis"]);
    assert!(unknown.is_empty());
    assert!(unknown.latest_snapshot().is_empty());
    assert_eq!(unknown.max_date(), None);
}

#[test]
fn series_skip_absent_values() {
    let ds = sample();
    let view = filter_countries(&ds, &["Chile", "Israel"]);
    for country in ["Chile", "Israel"] {
        for metric in Metric::ALL {
            let present = ds
                .records()
                .iter()
                .filter(|r| r.country == country && metric.value(r).is_some())
                .count();
            assert_eq!(view.series(country, metric).count(), present, "{country} {metric}");
        }
    }
    let chile: Vec<(NaiveDate, f64)> = view.series("Chile", Metric::DailyVaccinations).collect();
    assert_eq!(chile, vec![(day(2), 50.0), (day(3), 55.0)]);
}

#[test]
fn snapshot_only_holds_the_latest_date() {
    let ds = sample();
    let view = filter_countries(&ds, &["Chile", "Israel"]);
    let snap = view.latest_snapshot();
    // Israel is at the latest date too, but its total is absent
    assert_eq!(snap.len(), 1);
    assert!(snap.iter().all(|r| Some(r.date) == view.max_date()));
    assert_eq!(snap[0].country, "Chile");
    assert_eq!(snap[0].total_vaccinations, 210.0);
}
