use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Numeric column a user can visualize.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    TotalVaccinations,
    PeopleVaccinatedPerHundred,
    DailyVaccinations,
}

impl Metric {
    /// All metrics in display order. Also the column order of the correlation matrix.
    pub const ALL: [Metric; 3] = [
        Metric::TotalVaccinations,
        Metric::PeopleVaccinatedPerHundred,
        Metric::DailyVaccinations,
    ];

    /// CSV column name, e.g. `total_vaccinations`.
    pub fn column(self) -> &'static str {
        match self {
            Metric::TotalVaccinations => "total_vaccinations",
            Metric::PeopleVaccinatedPerHundred => "people_vaccinated_per_hundred",
            Metric::DailyVaccinations => "daily_vaccinations",
        }
    }

    /// Title-cased label for axes and headings, e.g. `Total Vaccinations`.
    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalVaccinations => "Total Vaccinations",
            Metric::PeopleVaccinatedPerHundred => "People Vaccinated Per Hundred",
            Metric::DailyVaccinations => "Daily Vaccinations",
        }
    }

    /// Lower-case words for running text, e.g. `total vaccinations`.
    pub fn words(self) -> String {
        self.column().replace('_', " ")
    }

    /// Per-hundred metrics are shares and must not be scaled to thousands/millions.
    pub fn is_per_hundred(self) -> bool {
        matches!(self, Metric::PeopleVaccinatedPerHundred)
    }

    /// Read this metric from a record. `None` means the cell was absent.
    pub fn value(self, record: &VaccinationRecord) -> Option<f64> {
        match self {
            Metric::TotalVaccinations => record.total_vaccinations,
            Metric::PeopleVaccinatedPerHundred => record.people_vaccinated_per_hundred,
            Metric::DailyVaccinations => record.daily_vaccinations,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown metric `{0}` (expected total_vaccinations, people_vaccinated_per_hundred or daily_vaccinations)"
)]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Accepts the column name, the label, or the words form (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.column() == norm)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// One row of the vaccination table.
///
/// Only `country` and `date` are mandatory. Every numeric observation is
/// optional: an empty cell (or `NA`, `NaN`, `null`, ...) is `None`, never zero.
/// Columns the CSV doesn't carry default to `None` as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationRecord {
    pub country: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub iso_code: Option<String>,
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total_vaccinations: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub people_vaccinated: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub people_fully_vaccinated: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub daily_vaccinations_raw: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub daily_vaccinations: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total_vaccinations_per_hundred: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub people_vaccinated_per_hundred: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub people_fully_vaccinated_per_hundred: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub daily_vaccinations_per_million: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub vaccines: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub source_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub source_website: Option<String>,
}

impl VaccinationRecord {
    /// A record with only the mandatory fields set.
    pub fn new(country: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            country: country.into(),
            iso_code: None,
            date,
            total_vaccinations: None,
            people_vaccinated: None,
            people_fully_vaccinated: None,
            daily_vaccinations_raw: None,
            daily_vaccinations: None,
            total_vaccinations_per_hundred: None,
            people_vaccinated_per_hundred: None,
            people_fully_vaccinated_per_hundred: None,
            daily_vaccinations_per_million: None,
            vaccines: None,
            source_name: None,
            source_website: None,
        }
    }

    /// Builder-style setter for one metric.
    pub fn with(mut self, metric: Metric, value: Option<f64>) -> Self {
        match metric {
            Metric::TotalVaccinations => self.total_vaccinations = value,
            Metric::PeopleVaccinatedPerHundred => self.people_vaccinated_per_hundred = value,
            Metric::DailyVaccinations => self.daily_vaccinations = value,
        }
        self
    }
}

/// Ordered `(date, value)` points of one country for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Countries shown by default, as long as the dataset has them.
pub const DEFAULT_COUNTRIES: [&str; 3] = ["United States", "India", "United Kingdom"];

/// What the user currently has selected.
///
/// Owned by a front end; every render pass takes a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Selection {
    countries: Vec<String>,
    pub metric: Metric,
    pub show_correlation: bool,
    trend_country: Option<String>,
}

impl Selection {
    pub fn new<I, S>(countries: I, metric: Metric) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sel = Self {
            metric,
            ..Self::default()
        };
        sel.set_countries(countries);
        sel
    }

    /// Selected countries in the order they were picked, without duplicates.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn set_countries<I, S>(&mut self, countries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries.clear();
        for c in countries {
            let c = c.into();
            if !c.is_empty() && !self.countries.contains(&c) {
                self.countries.push(c);
            }
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    /// Add or remove one country (multi-select checkbox semantics).
    pub fn toggle(&mut self, country: &str) {
        if let Some(pos) = self.countries.iter().position(|c| c == country) {
            self.countries.remove(pos);
        } else {
            self.countries.push(country.to_string());
        }
    }

    pub fn with_trend_country(mut self, country: impl Into<String>) -> Self {
        self.trend_country = Some(country.into());
        self
    }

    pub fn set_trend_country(&mut self, country: Option<String>) {
        self.trend_country = country;
    }

    pub fn with_correlation(mut self, show: bool) -> Self {
        self.show_correlation = show;
        self
    }

    /// The country the trend analysis runs on.
    ///
    /// The requested trend country only counts while it is still selected;
    /// otherwise this falls back to the first selected country.
    pub fn trend_country(&self) -> Option<&str> {
        match self.trend_country.as_deref() {
            Some(c) if self.contains(c) => Some(c),
            _ => self.countries.first().map(String::as_str),
        }
    }
}

/// Parse a calendar date as found in the `date` column.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`; a trailing time component
/// (`2021-03-01T00:00:00`, `2021-03-01 12:00`) is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.split(['T', ' ']).next().unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

const MISSING_MARKERS: [&str; 6] = ["na", "n/a", "nan", "null", "none", "-"];

/// Parse an optional number; empty cells and missing markers yield `Ok(None)`.
/// `inf`/`infinity` are rejected rather than loaded.
pub fn parse_opt_f64(s: &str) -> Result<Option<f64>, String> {
    let t = s.trim();
    if t.is_empty() || MISSING_MARKERS.contains(&t.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(format!("non-finite number `{t}`")),
        Err(_) => Err(format!("invalid number `{t}`")),
    }
}

/// Serde helper: optional float from a CSV cell.
fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct OptF64Visitor;

    impl<'de> Visitor<'de> for OptF64Visitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number or an empty cell")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() {
                Ok(None)
            } else if v.is_infinite() {
                Err(E::custom(format!("non-finite number `{v}`")))
            } else {
                Ok(Some(v))
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_opt_f64(s).map_err(E::custom)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_str(OptF64Visitor)
}

fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`")))
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let t = raw.trim();
    Ok(if t.is_empty() { None } else { Some(t.to_string()) })
}
