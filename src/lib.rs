//! vaxdash
//!
//! A lightweight Rust library for exploring per-country vaccination statistics.
//! Pairs with the `vaxdash` CLI and the `vaxdash-gui` desktop dashboard.
//!
//! ### Features
//! - Load a vaccination CSV once (absent cells stay absent, never zero)
//! - Filter by country and pick one of three metrics
//! - Per-country summary statistics (mean, std, min, median, max)
//! - Optional Pearson correlation matrix across the three metrics
//! - Least-squares trend with R² and p-value for one country
//! - SVG/PNG line, bar, trend and heatmap charts
//!
//! ### Example
//! ```no_run
//! use vaxdash::{Dataset, Metric, Selection, dashboard, report};
//!
//! let data = Dataset::load_csv("country_vaccinations.csv")?;
//! let selection = Selection::new(["Chile", "Israel"], Metric::PeopleVaccinatedPerHundred)
//!     .with_correlation(true)
//!     .with_trend_country("Chile");
//! let view = dashboard::render(&data, &selection);
//! println!("{}", report::render_text(&view));
//! dashboard::write_charts(&view, "charts".as_ref(), &Default::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod dashboard;
pub mod dataset;
pub mod filter;
pub mod models;
pub mod report;
pub mod stats;
pub mod storage;
pub mod trend;
pub mod viz;

pub use dataset::{DataError, Dataset};
pub use filter::{FilteredView, filter_countries};
pub use models::{CountrySeries, Metric, Selection, VaccinationRecord};
pub use trend::{TrendError, TrendResult};
