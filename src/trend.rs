//! Ordinary least-squares trend of a metric against the calendar date.
//!
//! Dates are turned into ordinal day numbers (0001-01-01 is day 1) and used as
//! the independent variable. Besides slope and intercept the fit reports the
//! Pearson r, R², the two-sided p-value for a zero slope (Student's t with
//! n - 2 degrees of freedom) and the standard errors of both coefficients.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// Keeps the t statistic finite for a perfect fit.
const TINY: f64 = 1.0e-20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrendError {
    #[error("insufficient data: {points} point(s), at least 2 are needed")]
    InsufficientData { points: usize },
    #[error("insufficient data: all {points} point(s) share the same date")]
    ZeroDateVariance { points: usize },
    #[error("cannot fit {points} point(s): values are not finite or overflow")]
    NonFinite { points: usize },
}

impl TrendError {
    pub fn points(&self) -> usize {
        match *self {
            TrendError::InsufficientData { points }
            | TrendError::ZeroDateVariance { points }
            | TrendError::NonFinite { points } => points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Change in value per day.
    pub slope: f64,
    /// Value at ordinal day 0; see [`TrendResult::value_at`] for a usable origin.
    pub intercept: f64,
    pub r_value: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
    pub intercept_std_err: f64,
    pub points: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl TrendResult {
    /// Fitted value on a given date.
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        self.intercept + self.slope * ordinal(date) as f64
    }

    /// The fitted line evaluated on each date.
    pub fn line<I>(&self, dates: I) -> Vec<(NaiveDate, f64)>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().map(|d| (d, self.value_at(d))).collect()
    }
}

/// Proleptic Gregorian ordinal: 0001-01-01 is day 1.
pub fn ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

/// Fit `value = slope * ordinal(date) + intercept`.
pub fn fit_trend(points: &[(NaiveDate, f64)]) -> Result<TrendResult, TrendError> {
    let n = points.len();
    if n < 2 {
        return Err(TrendError::InsufficientData { points: n });
    }
    let xs: Vec<f64> = points.iter().map(|(d, _)| ordinal(*d) as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    if ys.iter().any(|y| !y.is_finite()) {
        return Err(TrendError::NonFinite { points: n });
    }
    let nf = n as f64;

    let x_mean = xs.iter().sum::<f64>() / nf;
    let y_mean = ys.iter().sum::<f64>() / nf;

    // population (biased) moments
    let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(TrendError::ZeroDateVariance { points: n });
    }
    if !(y_mean.is_finite() && ssym.is_finite() && ssxym.is_finite()) {
        return Err(TrendError::NonFinite { points: n });
    }

    let r = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm.sqrt() * ssym.sqrt())).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;
    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(TrendError::NonFinite { points: n });
    }

    let (p_value, std_err, intercept_std_err) = if n == 2 {
        let p = if ys[0] == ys[1] { 1.0 } else { 0.0 };
        (p, 0.0, 0.0)
    } else {
        let df = nf - 2.0;
        let t = r * (df / ((1.0 - r) * (1.0 + r) + TINY)).sqrt();
        if !(r.is_finite() && t.is_finite()) {
            return Err(TrendError::NonFinite { points: n });
        }
        let p = StudentsT::new(0.0, 1.0, df)
            .map(|dist| 2.0 * dist.sf(t.abs()))
            .map_err(|_| TrendError::NonFinite { points: n })?;
        let se = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
        let intercept_se = se * (ssxm + x_mean * x_mean).sqrt();
        if !(se.is_finite() && intercept_se.is_finite()) {
            return Err(TrendError::NonFinite { points: n });
        }
        (p.clamp(0.0, 1.0), se, intercept_se)
    };

    let first_date = points.iter().map(|(d, _)| *d).min().unwrap_or(points[0].0);
    let last_date = points.iter().map(|(d, _)| *d).max().unwrap_or(points[0].0);

    Ok(TrendResult {
        slope,
        intercept,
        r_value: r,
        r_squared: r * r,
        p_value,
        std_err,
        intercept_std_err,
        points: n,
        first_date,
        last_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn ordinal_starts_at_one() {
        assert_eq!(ordinal(d(1, 1, 1)), 1);
        assert_eq!(ordinal(d(2021, 1, 1)), 737_791);
    }

    #[test]
    fn two_points_have_zero_p_value() {
        let fit = fit_trend(&[(d(2021, 1, 1), 1.0), (d(2021, 1, 3), 5.0)]).unwrap();
        assert_eq!(fit.slope, 2.0);
        assert_eq!(fit.p_value, 0.0);
        assert_eq!(fit.std_err, 0.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn flat_series_is_not_significant() {
        let pts: Vec<_> = (1..=5).map(|i| (d(2021, 2, i), 7.0)).collect();
        let fit = fit_trend(&pts).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_value, 0.0);
        assert!((fit.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn guards_degenerate_input() {
        assert_eq!(fit_trend(&[]), Err(TrendError::InsufficientData { points: 0 }));
        assert_eq!(
            fit_trend(&[(d(2021, 1, 1), 3.0), (d(2021, 1, 1), 4.0)]),
            Err(TrendError::ZeroDateVariance { points: 2 })
        );
    }

    #[test]
    fn infinite_value_is_rejected() {
        let pts = [(d(2021, 1, 1), 1.0), (d(2021, 1, 2), f64::INFINITY), (d(2021, 1, 3), 3.0)];
        assert_eq!(fit_trend(&pts), Err(TrendError::NonFinite { points: 3 }));
    }
}
