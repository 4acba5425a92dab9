//! Country filter and the borrowed view it produces.

use crate::dataset::Dataset;
use crate::models::{Metric, VaccinationRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rows of a [`Dataset`] whose country is in the selected set, in original order.
///
/// The view borrows from the dataset and is rebuilt on every render.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a VaccinationRecord>,
}

/// One bar of the latest-snapshot chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub country: String,
    pub date: NaiveDate,
    pub total_vaccinations: f64,
}

/// Keep the rows whose country is one of `countries`. An empty set gives an empty view.
pub fn filter_countries<'a, S: AsRef<str>>(dataset: &'a Dataset, countries: &[S]) -> FilteredView<'a> {
    let wanted: HashSet<&str> = countries.iter().map(AsRef::as_ref).collect();
    FilteredView {
        rows: dataset
            .records()
            .iter()
            .filter(|r| wanted.contains(r.country.as_str()))
            .collect(),
    }
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a VaccinationRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filter this view again. Re-applying the same set returns the same rows.
    pub fn refilter<S: AsRef<str>>(&self, countries: &[S]) -> FilteredView<'a> {
        let wanted: HashSet<&str> = countries.iter().map(AsRef::as_ref).collect();
        FilteredView {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|r| wanted.contains(r.country.as_str()))
                .collect(),
        }
    }

    /// Countries present in the view, in order of first appearance.
    pub fn countries(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.country.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn country_rows(&self, country: &str) -> impl Iterator<Item = &'a VaccinationRecord> {
        self.rows
            .iter()
            .copied()
            .filter(move |r| r.country == country)
    }

    /// Lazy `(date, value)` pairs of one country; absent values are skipped.
    pub fn series(&self, country: &str, metric: Metric) -> impl Iterator<Item = (NaiveDate, f64)> {
        self.country_rows(country)
            .filter_map(move |r| metric.value(r).map(|v| (r.date, v)))
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// Rows at the single latest date of the view with a present `total_vaccinations`.
    pub fn latest_snapshot(&self) -> Vec<SnapshotRow> {
        let Some(latest) = self.max_date() else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|r| r.date == latest)
            .filter_map(|r| {
                r.total_vaccinations.map(|v| SnapshotRow {
                    country: r.country.clone(),
                    date: r.date,
                    total_vaccinations: v,
                })
            })
            .collect()
    }
}
