use crate::models::VaccinationRecord;
use crate::stats::Summary;
use anyhow::Result;
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize(cell: &str) -> Cow<'_, str> {
    if cell.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{cell}"))
    } else {
        Cow::Borrowed(cell)
    }
}

fn opt_text(v: &Option<String>) -> Cow<'_, str> {
    v.as_deref().map(sanitize).unwrap_or(Cow::Borrowed(""))
}

/// Save records as CSV with header, in the input column layout.
pub fn save_csv<P: AsRef<Path>>(records: &[&VaccinationRecord], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize((
        "country",
        "iso_code",
        "date",
        "total_vaccinations",
        "people_vaccinated",
        "people_fully_vaccinated",
        "daily_vaccinations_raw",
        "daily_vaccinations",
        "total_vaccinations_per_hundred",
        "people_vaccinated_per_hundred",
        "people_fully_vaccinated_per_hundred",
        "daily_vaccinations_per_million",
        "vaccines",
        "source_name",
        "source_website",
    ))?;
    for r in records {
        wtr.serialize((
            sanitize(&r.country),
            opt_text(&r.iso_code),
            r.date.format("%Y-%m-%d").to_string(),
            r.total_vaccinations,
            r.people_vaccinated,
            r.people_fully_vaccinated,
            r.daily_vaccinations_raw,
            r.daily_vaccinations,
            r.total_vaccinations_per_hundred,
            r.people_vaccinated_per_hundred,
            r.people_fully_vaccinated_per_hundred,
            r.daily_vaccinations_per_million,
            opt_text(&r.vaccines),
            opt_text(&r.source_name),
            opt_text(&r.source_website),
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save records as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(records: &[&VaccinationRecord], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save the summary table as CSV (full precision; formatting is a display concern).
pub fn save_summary_csv<P: AsRef<Path>>(summaries: &[Summary], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize((
        "country", "metric", "count", "missing", "mean", "std", "min", "median", "max",
    ))?;
    for s in summaries {
        wtr.serialize((
            sanitize(&s.country),
            s.metric.column(),
            s.count,
            s.missing,
            s.mean,
            s.std,
            s.min,
            s.median,
            s.max,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the summary table as pretty JSON array.
pub fn save_summary_json<P: AsRef<Path>>(summaries: &[Summary], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(summaries)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
