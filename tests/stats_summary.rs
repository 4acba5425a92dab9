use approx::assert_relative_eq;
use chrono::NaiveDate;
use vaxdash::models::VaccinationRecord;
use vaxdash::stats::{correlation_matrix, grouped_summary};
use vaxdash::{Dataset, Metric, filter_countries};

fn rec(country: &str, d: u32, total: Option<f64>, share: Option<f64>, daily: Option<f64>) -> VaccinationRecord {
    VaccinationRecord::new(country, NaiveDate::from_ymd_opt(2021, 4, d).unwrap())
        .with(Metric::TotalVaccinations, total)
        .with(Metric::PeopleVaccinatedPerHundred, share)
        .with(Metric::DailyVaccinations, daily)
}

#[test]
fn grouped_stats_handle_missing_and_median_even_odd() {
    // Peru: [10, 20, 30] -> mean 20, median 20, sample std 10
    // Chile: [1, 2, 3, 4] plus one absent -> median 2.5, missing 1
    let ds = Dataset::from_records(vec![
        rec("Peru", 1, Some(10.0), None, None),
        rec("Chile", 1, Some(1.0), None, None),
        rec("Peru", 2, Some(20.0), None, None),
        rec("Chile", 2, Some(2.0), None, None),
        rec("Chile", 3, None, None, None),
        rec("Peru", 3, Some(30.0), None, None),
        rec("Chile", 4, Some(3.0), None, None),
        rec("Chile", 5, Some(4.0), None, None),
    ]);
    let view = filter_countries(&ds, &["Peru", "Chile"]);
    let got = grouped_summary(&view, Metric::TotalVaccinations);
    assert_eq!(got.len(), 2);

    let chile = &got[0];
    assert_eq!(chile.country, "Chile");
    assert_eq!(chile.count, 4);
    assert_eq!(chile.missing, 1);
    assert_eq!(chile.min, Some(1.0));
    assert_eq!(chile.max, Some(4.0));
    assert_relative_eq!(chile.median.unwrap(), 2.5);

    let peru = &got[1];
    assert_eq!(peru.country, "Peru");
    assert_eq!(peru.count, 3);
    assert_eq!(peru.missing, 0);
    assert_relative_eq!(peru.mean.unwrap(), 20.0);
    assert_relative_eq!(peru.median.unwrap(), 20.0);
    assert_relative_eq!(peru.std.unwrap(), 10.0);
    assert_eq!(peru.min, Some(10.0));
    assert_eq!(peru.max, Some(30.0));
}

#[test]
fn all_absent_country_keeps_an_empty_row() {
    let ds = Dataset::from_records(vec![
        rec("Chad", 1, None, None, None),
        rec("Chad", 2, None, None, None),
    ]);
    let view = filter_countries(&ds, &["Chad"]);
    let got = grouped_summary(&view, Metric::DailyVaccinations);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].count, 0);
    assert_eq!(got[0].missing, 2);
    assert_eq!(got[0].mean, None);
    assert_eq!(got[0].std, None);
}

#[test]
fn correlation_is_symmetric_with_unit_diagonal() {
    let ds = Dataset::from_records(vec![
        rec("Chile", 1, Some(100.0), Some(1.0), Some(7.0)),
        rec("Chile", 2, Some(200.0), Some(2.1), Some(3.0)),
        rec("Chile", 3, Some(300.0), Some(2.9), Some(9.0)),
        rec("Chile", 4, Some(400.0), Some(4.2), Some(1.0)),
        // incomplete rows are dropped
        rec("Chile", 5, Some(500.0), None, Some(2.0)),
    ]);
    let view = filter_countries(&ds, &["Chile"]);
    let m = correlation_matrix(&view);
    assert_eq!(m.rows_used, 4);
    for i in 0..3 {
        assert_relative_eq!(m.values[i][i].unwrap(), 1.0);
        for j in 0..3 {
            assert_eq!(m.values[i][j], m.values[j][i]);
            let v = m.values[i][j].unwrap();
            assert!((-1.0..=1.0).contains(&v));
        }
    }
    let r = m
        .get(Metric::TotalVaccinations, Metric::PeopleVaccinatedPerHundred)
        .unwrap();
    assert!(r > 0.99, "{r}");
}

#[test]
fn constant_column_has_no_correlation() {
    let ds = Dataset::from_records(vec![
        rec("Chile", 1, Some(100.0), Some(1.0), Some(5.0)),
        rec("Chile", 2, Some(200.0), Some(2.0), Some(5.0)),
        rec("Chile", 3, Some(300.0), Some(3.0), Some(5.0)),
    ]);
    let view = filter_countries(&ds, &["Chile"]);
    let m = correlation_matrix(&view);
    assert_eq!(m.get(Metric::DailyVaccinations, Metric::DailyVaccinations), None);
    assert_eq!(m.get(Metric::TotalVaccinations, Metric::DailyVaccinations), None);
    assert!(m.get(Metric::TotalVaccinations, Metric::TotalVaccinations).is_some());
}
