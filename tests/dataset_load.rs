use std::fs;
use tempfile::tempdir;
use vaxdash::{DataError, Dataset, Metric};

const CSV: &str = "\
country,iso_code,date,total_vaccinations,people_vaccinated,people_fully_vaccinated,daily_vaccinations_raw,daily_vaccinations,total_vaccinations_per_hundred,people_vaccinated_per_hundred,people_fully_vaccinated_per_hundred,daily_vaccinations_per_million,vaccines,source_name,source_website
Chile,CHL,2021-01-01,100,100,,,,0.01,0.01,,,\"Pfizer/BioNTech, Sinovac\",Ministry of Health,https://example.org
Chile,CHL,2021-01-02,,,,,50,,,,2,\"Pfizer/BioNTech, Sinovac\",Ministry of Health,https://example.org
Israel,ISR,2021-01-01,1000,900,100,,,11.5,10.4,1.2,,Pfizer/BioNTech,Ministry of Health,https://example.org
";

#[test]
fn loads_full_kaggle_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("country_vaccinations.csv");
    fs::write(&path, CSV).unwrap();

    let ds = Dataset::load_csv(&path).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.countries(), vec!["Chile", "Israel"]);

    let first = &ds.records()[0];
    assert_eq!(first.iso_code.as_deref(), Some("CHL"));
    assert_eq!(first.total_vaccinations, Some(100.0));
    assert_eq!(first.daily_vaccinations, None);
    assert_eq!(first.vaccines.as_deref(), Some("Pfizer/BioNTech, Sinovac"));

    // absent cells are never read as zero
    assert_eq!(ds.present_count(Metric::TotalVaccinations), 2);
    assert_eq!(ds.present_count(Metric::DailyVaccinations), 1);
}

#[test]
fn minimal_columns_are_enough() {
    let text = "country,date,total_vaccinations,people_vaccinated_per_hundred,daily_vaccinations\n\
                Wales,2021/02/01,5,0.1,NA\n";
    let ds = Dataset::from_reader(text.as_bytes()).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.records()[0].daily_vaccinations, None);
    assert_eq!(ds.records()[0].iso_code, None);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = Dataset::load_csv(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn missing_metric_column_is_reported() {
    let text = "country,date,total_vaccinations,daily_vaccinations\nChile,2021-01-01,1,2\n";
    let err = Dataset::from_reader(text.as_bytes()).unwrap_err();
    match err {
        DataError::MissingColumn(col) => assert_eq!(col, "people_vaccinated_per_hundred"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bad_number_reports_line() {
    let text = "country,date,total_vaccinations,people_vaccinated_per_hundred,daily_vaccinations\n\
                Chile,2021-01-01,1,2,3\n\
                Chile,2021-01-02,lots,2,3\n";
    let err = Dataset::from_reader(text.as_bytes()).unwrap_err();
    match err {
        DataError::Parse { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("lots"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn infinite_cell_is_a_parse_error() {
    let text = "country,date,total_vaccinations,people_vaccinated_per_hundred,daily_vaccinations\n\
                Chile,2021-01-01,1,2,2\n\
                Chile,2021-01-02,inf,2,2\n\
                Chile,2021-01-03,3,2,2\n";
    let err = Dataset::from_reader(text.as_bytes()).unwrap_err();
    match err {
        DataError::Parse { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("non-finite"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
