use crate::filter::FilteredView;
use crate::models::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive statistics of one metric for one country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub country: String,
    pub metric: Metric,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1). Absent below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// Compute per-country statistics, ordered by country name.
///
/// Absent values are counted in `missing` and otherwise ignored. A country
/// whose values are all absent still gets a row with empty statistics.
pub fn grouped_summary(view: &FilteredView<'_>, metric: Metric) -> Vec<Summary> {
    let mut groups: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
    for r in view.rows() {
        let entry = groups.entry(r.country.as_str()).or_default();
        match metric.value(r) {
            Some(v) => entry.0.push(v),
            None => entry.1 += 1,
        }
    }

    groups
        .into_iter()
        .map(|(country, (mut vals, missing))| {
            vals.sort_by(f64::total_cmp);
            Summary {
                country: country.to_string(),
                metric,
                count: vals.len(),
                missing,
                mean: mean(&vals),
                std: sample_std(&vals),
                min: vals.first().copied(),
                median: median_sorted(&vals),
                max: vals.last().copied(),
            }
        })
        .collect()
}

pub fn mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        None
    } else {
        Some(vals.iter().sum::<f64>() / vals.len() as f64)
    }
}

pub fn sample_std(vals: &[f64]) -> Option<f64> {
    if vals.len() < 2 {
        return None;
    }
    let m = mean(vals)?;
    let ss: f64 = vals.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (vals.len() - 1) as f64).sqrt())
}

/// Median of an already sorted slice.
fn median_sorted(vals: &[f64]) -> Option<f64> {
    let n = vals.len();
    if n == 0 {
        None
    } else if n % 2 == 1 {
        Some(vals[n / 2])
    } else {
        Some((vals[n / 2 - 1] + vals[n / 2]) / 2.0)
    }
}

/// Pearson correlation of two equally long samples.
///
/// `None` when there are fewer than two pairs or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise Pearson correlation across [`Metric::ALL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationMatrix {
    pub metrics: [Metric; 3],
    pub values: [[Option<f64>; 3]; 3],
    /// Rows with all three metrics present.
    pub rows_used: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i][j]
    }
}

/// Correlate the three metrics over the rows where none of them is absent.
pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let metrics = Metric::ALL;
    let mut columns: [Vec<f64>; 3] = Default::default();
    for r in view.rows() {
        if let [Some(a), Some(b), Some(c)] = metrics.map(|m| m.value(r)) {
            columns[0].push(a);
            columns[1].push(b);
            columns[2].push(c);
        }
    }

    let mut values = [[None; 3]; 3];
    for i in 0..3 {
        for j in i..3 {
            let r = if i == j {
                // unit diagonal unless the column is constant
                pearson(&columns[i], &columns[j]).map(|_| 1.0)
            } else {
                pearson(&columns[i], &columns[j])
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        metrics,
        values,
        rows_used: columns[0].len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_needs_two_values() {
        assert_eq!(sample_std(&[3.0]), None);
        assert_eq!(sample_std(&[10.0, 20.0, 30.0]), Some(10.0));
    }

    #[test]
    fn pearson_handles_degenerate_input() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), None);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn even_median_averages_middle_pair() {
        assert_eq!(median_sorted(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median_sorted(&[]), None);
    }
}
