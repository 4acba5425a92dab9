use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use vaxdash::models::DEFAULT_COUNTRIES;
use vaxdash::viz::{ChartFormat, ChartOptions};
use vaxdash::{Dataset, Metric, Selection, dashboard, filter_countries, report, storage};

#[derive(Parser, Debug)]
#[command(
    name = "vaxdash",
    version,
    about = "Filter, chart & summarize per-country vaccination statistics"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the countries present in the data file.
    Countries(CountriesArgs),
    /// Print statistics and trend for a selection (and optionally write charts).
    Report(ReportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    #[value(name = "total_vaccinations")]
    TotalVaccinations,
    #[value(name = "people_vaccinated_per_hundred")]
    PeopleVaccinatedPerHundred,
    #[value(name = "daily_vaccinations")]
    DailyVaccinations,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::TotalVaccinations => Metric::TotalVaccinations,
            MetricArg::PeopleVaccinatedPerHundred => Metric::PeopleVaccinatedPerHundred,
            MetricArg::DailyVaccinations => Metric::DailyVaccinations,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Svg,
    Png,
}

#[derive(Args, Debug)]
struct CountriesArgs {
    /// Vaccination CSV file.
    #[arg(long, default_value = "country_vaccinations.csv")]
    data: PathBuf,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Vaccination CSV file.
    #[arg(long, default_value = "country_vaccinations.csv")]
    data: PathBuf,
    /// Country names separated by comma or semicolon (e.g., "Chile;Israel").
    /// Defaults to United States, India, United Kingdom where present.
    #[arg(short, long)]
    countries: Option<String>,
    /// Metric to visualize.
    #[arg(short, long, value_enum, default_value_t = MetricArg::TotalVaccinations)]
    metric: MetricArg,
    /// Also compute the correlation matrix of the three metrics.
    #[arg(long, default_value_t = false)]
    correlation: bool,
    /// Country for the trend analysis (must be one of the selected countries).
    #[arg(short, long)]
    trend_country: Option<String>,
    /// Write charts into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Chart file format.
    #[arg(long, value_enum, default_value_t = FormatArg::Svg)]
    format: FormatArg,
    /// Width of the charts (default 1000).
    #[arg(long, default_value_t = vaxdash::viz::DEFAULT_WIDTH)]
    width: u32,
    /// Height of the charts (default 600).
    #[arg(long, default_value_t = vaxdash::viz::DEFAULT_HEIGHT)]
    height: u32,
    /// Locale for value labels (e.g., en, de).
    #[arg(long, default_value = "en")]
    locale: String,
    /// Export the filtered rows (format inferred from the extension: .csv or .json).
    #[arg(long)]
    export: Option<PathBuf>,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Countries(args) => cmd_countries(args),
        Command::Report(args) => cmd_report(args),
    }
}

fn load(path: &Path) -> Result<Dataset> {
    Dataset::load_csv(path).with_context(|| format!("loading {}", path.display()))
}

fn cmd_countries(args: CountriesArgs) -> Result<()> {
    let data = load(&args.data)?;
    for c in data.countries() {
        println!("{c}");
    }
    Ok(())
}

fn cmd_report(args: ReportArgs) -> Result<()> {
    let data = load(&args.data)?;

    let countries = match &args.countries {
        Some(list) => parse_list(list),
        None => DEFAULT_COUNTRIES
            .iter()
            .filter(|c| data.has_country(c))
            .map(|c| c.to_string())
            .collect(),
    };
    for c in &countries {
        if !data.has_country(c) {
            eprintln!("warning: no rows for country `{c}`");
        }
    }

    let mut selection = Selection::new(countries, args.metric.into()).with_correlation(args.correlation);
    if let Some(tc) = &args.trend_country {
        if !selection.contains(tc) {
            eprintln!("warning: trend country `{tc}` is not selected; using the first selected country");
        }
        selection = selection.with_trend_country(tc.clone());
    }

    let view = dashboard::render(&data, &selection);
    print!("{}", report::render_text(&view));

    if let Some(path) = args.export.as_ref() {
        let filtered = filter_countries(&data, selection.countries());
        let fmt = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(filtered.rows(), path)?,
            "json" => storage::save_json(filtered.rows(), path)?,
            other => anyhow::bail!("unsupported export format: {}", other),
        }
        eprintln!("Saved {} rows to {}", filtered.len(), path.display());
    }

    if let Some(dir) = args.out_dir.as_ref() {
        let opts = ChartOptions {
            width: args.width,
            height: args.height,
            locale: args.locale.clone(),
            format: match args.format {
                FormatArg::Svg => ChartFormat::Svg,
                FormatArg::Png => ChartFormat::Png,
            },
        };
        let written = dashboard::write_charts(&view, dir, &opts)?;
        for p in written {
            eprintln!("Wrote chart to {}", p.display());
        }
    }

    Ok(())
}
