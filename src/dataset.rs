//! CSV loader and the immutable in-memory table.
//!
//! A [`Dataset`] is built once at start-up and then only read. Front ends keep
//! it for the whole process (the GUI wraps it in an `Arc`) and hand a shared
//! reference to each render pass.

use crate::models::{Metric, VaccinationRecord};
use csv::{ReaderBuilder, Trim};
use log::debug;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "country",
    "date",
    "total_vaccinations",
    "people_vaccinated_per_hundred",
    "daily_vaccinations",
];

/// Why a dataset could not be loaded.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required column `{0}`")]
    MissingColumn(String),
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Ordered, read-only collection of vaccination records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<VaccinationRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<VaccinationRecord>) -> Self {
        Self { records }
    }

    /// Load a CSV file.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ds = Self::from_reader(file)?;
        debug!(
            "loaded {} rows ({} countries) from {}",
            ds.len(),
            ds.countries().len(),
            path.display()
        );
        Ok(ds)
    }

    /// Load CSV text from any reader. The first row must be the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let headers = rdr.headers()?.clone();
        for col in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == col) {
                return Err(DataError::MissingColumn(col.to_string()));
            }
        }

        let mut records = Vec::new();
        for row in rdr.deserialize::<VaccinationRecord>() {
            let rec = row.map_err(|e| DataError::Parse {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: match e.kind() {
                    csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
                    _ => e.to_string(),
                },
            })?;
            records.push(rec);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[VaccinationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique country names in order of first appearance.
    pub fn countries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.country.as_str())
            .filter(|c| !c.is_empty() && seen.insert(*c))
            .collect()
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.records.iter().any(|r| r.country == country)
    }

    /// Number of present (non-absent) values for a metric across the whole table.
    pub fn present_count(&self, metric: Metric) -> usize {
        self.records
            .iter()
            .filter(|r| metric.value(r).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
country,iso_code,date,total_vaccinations,people_vaccinated_per_hundred,daily_vaccinations,vaccines
Chile,CHL,2021-01-01,100,,,
Chile,CHL,2021-01-02,150,0.5,50,Pfizer/BioNTech
Peru,PER,2021-01-01,NaN,,10,
";

    #[test]
    fn parses_rows_and_absent_values() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        let r = &ds.records()[0];
        assert_eq!(r.country, "Chile");
        assert_eq!(r.iso_code.as_deref(), Some("CHL"));
        assert_eq!(r.total_vaccinations, Some(100.0));
        assert_eq!(r.people_vaccinated_per_hundred, None);
        assert_eq!(r.daily_vaccinations, None);
        assert_eq!(r.people_vaccinated, None);
        assert_eq!(ds.records()[1].vaccines.as_deref(), Some("Pfizer/BioNTech"));
        assert_eq!(ds.records()[2].total_vaccinations, None);
        assert_eq!(ds.countries(), vec!["Chile", "Peru"]);
        assert_eq!(ds.present_count(Metric::TotalVaccinations), 2);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "country,date,total_vaccinations,daily_vaccinations\nChile,2021-01-01,1,2\n";
        match Dataset::from_reader(csv.as_bytes()) {
            Err(DataError::MissingColumn(c)) => assert_eq!(c, "people_vaccinated_per_hundred"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bad_date_reports_line() {
        let csv = "country,date,total_vaccinations,people_vaccinated_per_hundred,daily_vaccinations\n\
                   Chile,2021-01-01,1,,\n\
                   Chile,yesterday,2,,\n";
        match Dataset::from_reader(csv.as_bytes()) {
            Err(DataError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("yesterday"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
