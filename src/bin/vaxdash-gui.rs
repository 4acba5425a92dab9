/*!
 * Desktop dashboard for vaxdash - COVID-19 vaccination tracker
 *
 * Loads the vaccination CSV once at start-up and re-renders the dashboard
 * whenever the selection changes:
 * - Country multi-select, metric select, correlation toggle
 * - Time-series, latest-snapshot and trend charts drawn inline
 * - Summary statistics, correlation matrix
 * - Trend analysis for one selected country
 * - Exporting the charts (SVG/PNG) to a folder
 *
 * Usage: vaxdash-gui [path/to/country_vaccinations.csv]
 */

use chrono::NaiveDate;
use eframe::egui::{self, Color32};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, LineStyle, Plot, PlotPoints};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use vaxdash::dashboard::{self, DashboardView};
use vaxdash::models::DEFAULT_COUNTRIES;
use vaxdash::report::{fmt_opt, trend_lines};
use vaxdash::trend::ordinal;
use vaxdash::viz::util::{format_ordinal_date, office_color};
use vaxdash::viz::{ChartFormat, ChartOptions};
use vaxdash::{Dataset, Metric, Selection};

const CHART_HEIGHT: f32 = 280.0;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let data_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("country_vaccinations.csv"));

    // Loaded once; a failure is shown instead of the dashboard.
    let loaded = Dataset::load_csv(&data_path).map(Arc::new).map_err(|e| {
        log::error!("failed to load {}: {e}", data_path.display());
        format!("Failed to load {}: {e}", data_path.display())
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([700.0, 450.0])
            .with_title("COVID-19 Vaccination Tracker - vaxdash"),
        ..Default::default()
    };

    eframe::run_native(
        "COVID-19 Vaccination Tracker",
        options,
        Box::new(move |_cc| {
            Ok(match loaded {
                Ok(data) => Box::new(VaxApp::new(data)) as Box<dyn eframe::App>,
                Err(message) => Box::new(LoadErrorApp { message }),
            })
        }),
    )
}

/// Shown when the data file can't be loaded; there is nothing to recover.
struct LoadErrorApp {
    message: String,
}

impl eframe::App for LoadErrorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("COVID-19 Vaccination Tracker");
            ui.add_space(10.0);
            ui.colored_label(egui::Color32::RED, &self.message);
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PlotFormat {
    Png,
    Svg,
}

#[derive(Debug)]
enum OperationResult {
    Success(String),
    Error(String),
}

/// Main application state
struct VaxApp {
    data: Arc<Dataset>,
    all_countries: Vec<String>,
    country_filter: String,

    selection: Selection,
    view: DashboardView,

    // Export options
    output_path: String,
    plot_format: PlotFormat,
    plot_width: u32,
    plot_height: u32,
    locale: String,

    // UI state
    is_loading: bool,
    status_message: String,
    error_message: String,

    // Background operation
    operation_receiver: Option<mpsc::Receiver<OperationResult>>,
}

impl VaxApp {
    fn new(data: Arc<Dataset>) -> Self {
        let all_countries: Vec<String> = data.countries().iter().map(|c| c.to_string()).collect();
        let defaults: Vec<&str> = DEFAULT_COUNTRIES
            .iter()
            .copied()
            .filter(|c| data.has_country(c))
            .collect();
        let selection = Selection::new(defaults, Metric::TotalVaccinations);
        let view = dashboard::render(&data, &selection);

        // Default to user's home directory for output
        let home_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .to_string_lossy()
            .to_string();

        Self {
            data,
            all_countries,
            country_filter: String::new(),
            selection,
            view,
            output_path: home_dir,
            plot_format: PlotFormat::Png,
            plot_width: vaxdash::viz::DEFAULT_WIDTH,
            plot_height: vaxdash::viz::DEFAULT_HEIGHT,
            locale: "en".to_string(),
            is_loading: false,
            status_message: String::new(),
            error_message: String::new(),
            operation_receiver: None,
        }
    }

    /// Recompute the view when the selection differs from the one it was built from.
    fn refresh(&mut self) {
        if self.view.selection != self.selection {
            self.view = dashboard::render(&self.data, &self.selection);
        }
    }

    fn start_export(&mut self) {
        if self.output_path.trim().is_empty() {
            self.error_message = "Please specify an output directory".to_string();
            return;
        }

        self.is_loading = true;
        self.error_message.clear();
        self.status_message = "Writing charts...".to_string();

        let (sender, receiver) = mpsc::channel();
        self.operation_receiver = Some(receiver);

        let view = self.view.clone();
        let dir = PathBuf::from(&self.output_path);
        let opts = ChartOptions {
            width: self.plot_width,
            height: self.plot_height,
            locale: self.locale.trim().to_string(),
            format: match self.plot_format {
                PlotFormat::Png => ChartFormat::Png,
                PlotFormat::Svg => ChartFormat::Svg,
            },
        };

        thread::spawn(move || {
            let result = match dashboard::write_charts(&view, &dir, &opts) {
                Ok(files) if files.is_empty() => {
                    OperationResult::Error("Nothing to chart for the current selection.".to_string())
                }
                Ok(files) => OperationResult::Success(format!(
                    "Files created:\n{}",
                    files
                        .iter()
                        .map(|p| p.to_string_lossy().to_string())
                        .collect::<Vec<_>>()
                        .join("\n")
                )),
                Err(err) => OperationResult::Error(format!("Failed to write charts: {err:#}")),
            };
            let _ = sender.send(result);
        });
    }

    fn check_operation_result(&mut self) {
        if let Some(receiver) = &self.operation_receiver
            && let Ok(result) = receiver.try_recv()
        {
            self.is_loading = false;
            self.operation_receiver = None;

            match result {
                OperationResult::Success(message) => {
                    self.status_message = message;
                    self.error_message.clear();
                }
                OperationResult::Error(error) => {
                    self.error_message = error;
                    self.status_message.clear();
                }
            }
        }
    }

    fn selection_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Selection");
        ui.add_space(5.0);

        ui.label("Metric to display:");
        egui::ComboBox::from_label("Metric")
            .selected_text(self.selection.metric.label())
            .show_ui(ui, |ui| {
                for m in Metric::ALL {
                    ui.selectable_value(&mut self.selection.metric, m, m.label());
                }
            });

        ui.checkbox(&mut self.selection.show_correlation, "Show correlation matrix");

        ui.add_space(10.0);
        ui.label("Countries:");
        ui.horizontal(|ui| {
            ui.label("Search:");
            ui.text_edit_singleline(&mut self.country_filter);
        });
        let needle = self.country_filter.to_lowercase();
        egui::ScrollArea::vertical().max_height(420.0).show(ui, |ui| {
            for c in &self.all_countries {
                let mut checked = self.selection.contains(c);
                if !checked && !needle.is_empty() && !c.to_lowercase().contains(&needle) {
                    continue;
                }
                if ui.checkbox(&mut checked, c).changed() {
                    self.selection.toggle(c);
                }
            }
        });
    }

    fn results_panel(&mut self, ui: &mut egui::Ui) {
        let metric = self.view.selection.metric;

        ui.heading(format!("{} Over Time", metric.label()));
        time_series_chart(ui, &self.view);
        egui::Grid::new("series").striped(true).show(ui, |ui| {
            for s in &self.view.series {
                ui.label(&s.country);
                ui.label(format!("{} point(s)", s.points.len()));
                match s.points.last() {
                    Some((d, v)) => ui.label(format!("last {}: {}", d, fmt_opt(Some(*v), 2))),
                    None => ui.label("no data"),
                };
                ui.end_row();
            }
        });

        ui.add_space(10.0);
        ui.heading("Latest Total Vaccinations");
        if self.view.snapshot.is_empty() {
            ui.label("No data for the latest date.");
        } else {
            snapshot_chart(ui, &self.view);
            egui::Grid::new("latest").striped(true).show(ui, |ui| {
                for row in &self.view.snapshot {
                    ui.label(row.date.to_string());
                    ui.label(&row.country);
                    ui.label(fmt_opt(Some(row.total_vaccinations), 0));
                    ui.end_row();
                }
            });
        }

        ui.add_space(10.0);
        ui.heading("Summary Statistics");
        egui::Grid::new("summary").striped(true).show(ui, |ui| {
            for h in ["country", "count", "mean", "std", "min", "median", "max"] {
                ui.strong(h);
            }
            ui.end_row();
            for s in &self.view.summaries {
                ui.label(&s.country);
                ui.label(s.count.to_string());
                for v in [s.mean, s.std, s.min, s.median, s.max] {
                    ui.label(fmt_opt(v, 2));
                }
                ui.end_row();
            }
        });

        if let Some(matrix) = &self.view.correlation {
            ui.add_space(10.0);
            ui.heading(format!("Correlation Matrix ({} complete rows)", matrix.rows_used));
            egui::Grid::new("correlation").striped(true).show(ui, |ui| {
                ui.label("");
                for m in matrix.metrics {
                    ui.strong(m.column());
                }
                ui.end_row();
                for (i, m) in matrix.metrics.iter().enumerate() {
                    ui.strong(m.column());
                    for v in matrix.values[i] {
                        ui.label(fmt_opt(v, 3));
                    }
                    ui.end_row();
                }
            });
        }

        ui.add_space(10.0);
        ui.heading("Trend Analysis");
        let current = self.selection.trend_country().unwrap_or_default().to_string();
        let mut chosen = current.clone();
        egui::ComboBox::from_label("Country for trend")
            .selected_text(&chosen)
            .show_ui(ui, |ui| {
                for c in self.selection.countries() {
                    ui.selectable_value(&mut chosen, c.clone(), c);
                }
            });
        if chosen != current {
            self.selection.set_trend_country(Some(chosen));
        }
        for line in trend_lines(self.view.trend_country.as_deref(), metric, &self.view.trend) {
            ui.label(line);
        }
        if self.view.trend.is_ok() {
            trend_chart(ui, &self.view);
        }
    }

    fn export_panel(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Export Charts");
            ui.add_space(5.0);

            ui.horizontal(|ui| {
                ui.label("Output path:");
                ui.text_edit_singleline(&mut self.output_path);
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new().pick_folder()
                {
                    self.output_path = path.to_string_lossy().to_string();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Chart format:");
                ui.radio_value(&mut self.plot_format, PlotFormat::Png, "PNG");
                ui.radio_value(&mut self.plot_format, PlotFormat::Svg, "SVG");
            });

            ui.horizontal(|ui| {
                ui.label("Dimensions:");
                ui.add(egui::DragValue::new(&mut self.plot_width).range(200..=3000));
                ui.label("×");
                ui.add(egui::DragValue::new(&mut self.plot_height).range(200..=3000));
                ui.label("pixels");
            });

            ui.horizontal(|ui| {
                ui.label("Number locale:");
                ui.add(egui::TextEdit::singleline(&mut self.locale).desired_width(60.0));
                ui.label("(e.g., en, de, fr)");
            });

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.is_loading, egui::Button::new("Export charts"))
                    .clicked()
                {
                    self.start_export();
                }
                if self.is_loading {
                    ui.spinner();
                    ui.label("Processing...");
                }
            });
        });

        if !self.status_message.is_empty() {
            ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
        }
        if !self.error_message.is_empty() {
            ui.colored_label(egui::Color32::RED, &self.error_message);
        }
    }
}

impl eframe::App for VaxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_operation_result();

        // Request repaint if loading (for spinner animation)
        if self.is_loading {
            ctx.request_repaint();
        }

        egui::SidePanel::left("selection")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.selection_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("COVID-19 Vaccination Tracker");
                ui.label(format!(
                    "{} rows loaded, {} selected",
                    self.data.len(),
                    self.view.rows
                ));
                ui.add_space(10.0);
                self.results_panel(ui);
                ui.add_space(15.0);
                self.export_panel(ui);
            });
        });

        self.refresh();
    }
}

fn color_of(idx: usize) -> Color32 {
    let c = office_color(idx);
    Color32::from_rgb(c.0, c.1, c.2)
}

fn date_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    format_ordinal_date(mark.value)
}

fn plot_points(points: &[(NaiveDate, f64)]) -> PlotPoints {
    points
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(d, v)| [ordinal(*d) as f64, *v])
        .collect()
}

fn time_series_chart(ui: &mut egui::Ui, view: &DashboardView) {
    if view.series.iter().all(|s| s.points.is_empty()) {
        ui.label("No data to plot.");
        return;
    }
    Plot::new("timeseries")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label(view.selection.metric.label())
        .x_axis_formatter(date_axis)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (idx, s) in view.series.iter().enumerate() {
                plot_ui.line(
                    Line::new(plot_points(&s.points))
                        .name(&s.country)
                        .color(color_of(idx))
                        .width(2.0),
                );
            }
        });
}

fn snapshot_chart(ui: &mut egui::Ui, view: &DashboardView) {
    let bars: Vec<Bar> = view
        .snapshot
        .iter()
        .enumerate()
        .filter(|(_, r)| r.total_vaccinations.is_finite())
        .map(|(idx, r)| {
            Bar::new(idx as f64, r.total_vaccinations)
                .name(&r.country)
                .fill(color_of(idx))
                .width(0.8)
        })
        .collect();
    let names: Vec<String> = view.snapshot.iter().map(|r| r.country.clone()).collect();
    Plot::new("latest")
        .height(CHART_HEIGHT)
        .y_axis_label("Total Vaccinations")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            names.get(i as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

fn trend_chart(ui: &mut egui::Ui, view: &DashboardView) {
    Plot::new("trend")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label(view.selection.metric.label())
        .x_axis_formatter(date_axis)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(plot_points(&view.trend_points))
                    .name("Actual")
                    .color(color_of(0))
                    .width(2.0),
            );
            plot_ui.line(
                Line::new(plot_points(&view.trend_line()))
                    .name("Trend")
                    .color(color_of(1))
                    .style(LineStyle::dashed_loose())
                    .width(2.0),
            );
        });
}
