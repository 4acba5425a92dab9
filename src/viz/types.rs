//! Public types and constants for the visualization module.

use std::path::Path;

/// Output format of a chart file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartFormat {
    #[default]
    Svg,
    Png,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }

    /// `.svg` selects SVG; every other extension renders a bitmap.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartFormat::Svg,
            _ => ChartFormat::Png,
        }
    }
}

/// Size and label settings shared by every chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Locale tag for thousands separators in value labels (`en`, `de`, ...).
    pub locale: String,
    pub format: ChartFormat,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            locale: "en".to_string(),
            format: ChartFormat::Svg,
        }
    }
}

pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 600;
