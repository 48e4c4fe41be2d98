//! Presentation configuration threaded through every chart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::palette;

pub const DEFAULT_DPI: u32 = 300;
/// Single column IEEE, inches.
pub const DEFAULT_FIGURE_SIZE: (f64, f64) = (3.5, 2.625);
/// Double column IEEE, inches.
pub const DOUBLE_COLUMN_SIZE: (f64, f64) = (7.16, 5.37);
pub const DEFAULT_FONT_SIZE: f64 = 10.0;
pub const MAX_COLORS: usize = 10;
pub const MAX_DATA_POINTS: usize = 1_000_000;
pub const ALLOWED_DATA_FORMATS: &[&str] = &["csv", "json"];
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Legend placement. The `Outside*` variants reserve a separate panel next to the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LegendLoc {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "upper right")]
    UpperRight,
    #[serde(rename = "upper left")]
    UpperLeft,
    #[serde(rename = "lower left")]
    LowerLeft,
    #[serde(rename = "lower right")]
    LowerRight,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "center left")]
    CenterLeft,
    #[serde(rename = "center right")]
    CenterRight,
    #[serde(rename = "lower center")]
    LowerCenter,
    #[serde(rename = "upper center")]
    UpperCenter,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "outside right")]
    OutsideRight,
    #[serde(rename = "outside top")]
    OutsideTop,
    #[serde(rename = "outside bottom")]
    OutsideBottom,
}

impl LegendLoc {
    pub const ALL: [LegendLoc; 14] = [
        LegendLoc::Best,
        LegendLoc::UpperRight,
        LegendLoc::UpperLeft,
        LegendLoc::LowerLeft,
        LegendLoc::LowerRight,
        LegendLoc::Right,
        LegendLoc::CenterLeft,
        LegendLoc::CenterRight,
        LegendLoc::LowerCenter,
        LegendLoc::UpperCenter,
        LegendLoc::Center,
        LegendLoc::OutsideRight,
        LegendLoc::OutsideTop,
        LegendLoc::OutsideBottom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LegendLoc::Best => "best",
            LegendLoc::UpperRight => "upper right",
            LegendLoc::UpperLeft => "upper left",
            LegendLoc::LowerLeft => "lower left",
            LegendLoc::LowerRight => "lower right",
            LegendLoc::Right => "right",
            LegendLoc::CenterLeft => "center left",
            LegendLoc::CenterRight => "center right",
            LegendLoc::LowerCenter => "lower center",
            LegendLoc::UpperCenter => "upper center",
            LegendLoc::Center => "center",
            LegendLoc::OutsideRight => "outside right",
            LegendLoc::OutsideTop => "outside top",
            LegendLoc::OutsideBottom => "outside bottom",
        }
    }

    pub fn is_outside(self) -> bool {
        matches!(
            self,
            LegendLoc::OutsideRight | LegendLoc::OutsideTop | LegendLoc::OutsideBottom
        )
    }
}

impl fmt::Display for LegendLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegendLoc {
    type Err = String;

    /// Accepts `upper right`, `upper-right` and `upper_right`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        LegendLoc::ALL
            .into_iter()
            .find(|l| l.as_str() == norm)
            .ok_or_else(|| format!("unknown legend location `{s}`"))
    }
}

/// A text note placed in data coordinates, optionally with an arrow from the text to `xy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    /// Point being annotated.
    #[serde(default)]
    pub xy: (f64, f64),
    /// Where the text sits; defaults to `xy`.
    #[serde(default)]
    pub xytext: Option<(f64, f64)>,
    #[serde(default)]
    pub arrow: bool,
    /// Points; defaults to `font_size - 2`.
    #[serde(default)]
    pub font_size: Option<f64>,
}

impl Annotation {
    pub fn new(text: impl Into<String>, xy: (f64, f64)) -> Self {
        Self {
            text: text.into(),
            xy,
            xytext: None,
            arrow: false,
            font_size: None,
        }
    }
}

/// Journal and layout presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Ieee,
    Nature,
    Science,
    Minimal,
}

impl FromStr for StylePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ieee" => Ok(StylePreset::Ieee),
            "nature" => Ok(StylePreset::Nature),
            "science" => Ok(StylePreset::Science),
            "minimal" => Ok(StylePreset::Minimal),
            other => Err(format!("unknown style preset `{other}`")),
        }
    }
}

/// Presentation settings for one chart. The same value is usually kept by the
/// caller and adjusted between plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    /// Inches.
    pub figsize: (f64, f64),
    pub dpi: u32,
    /// Theme name (`default`, `classic`, `ggplot`, `whitegrid`, `bmh`).
    pub style: String,
    /// Hex colors; empty means each chart picks its own fallback palette.
    pub color_palette: Vec<String>,
    pub grid: bool,
    pub legend: bool,
    pub legend_loc: LegendLoc,
    /// Points.
    pub font_size: f64,
    /// Points.
    pub line_width: f64,
    /// Points.
    pub marker_size: f64,
    pub alpha: f64,
    pub annotations: Vec<Annotation>,
    /// Tick label locale (`en`, `de`, `fr`, ...).
    pub locale: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            xlabel: String::new(),
            ylabel: String::new(),
            figsize: DEFAULT_FIGURE_SIZE,
            dpi: DEFAULT_DPI,
            style: "default".to_string(),
            color_palette: Vec::new(),
            grid: true,
            legend: true,
            legend_loc: LegendLoc::Best,
            font_size: DEFAULT_FONT_SIZE,
            line_width: 1.5,
            marker_size: 6.0,
            alpha: 1.0,
            annotations: Vec::new(),
            locale: "en".to_string(),
        }
    }
}

impl PlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field projection as a JSON object.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let cfg = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<PathBuf> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(path.to_path_buf())
    }

    /// Overwrite size, resolution, font size, grid and legend with a journal preset.
    pub fn apply_preset(&mut self, preset: StylePreset) {
        let (figsize, dpi, font_size, grid, legend) = match preset {
            StylePreset::Ieee => ((3.5, 2.625), 300, 9.0, true, true),
            StylePreset::Nature => ((3.5, 3.5), 300, 8.0, false, true),
            StylePreset::Science => ((3.5, 2.8), 300, 9.0, true, true),
            StylePreset::Minimal => ((6.0, 4.0), 150, 10.0, false, false),
        };
        self.figsize = figsize;
        self.dpi = dpi;
        self.font_size = font_size;
        self.grid = grid;
        self.legend = legend;
        log::debug!("applied style preset {preset:?}");
    }

    /// Fill `color_palette` from a named palette (see [`palette::get_palette`]).
    pub fn use_palette(&mut self, name: &str, count: Option<usize>) {
        self.color_palette = palette::get_palette(name, count);
    }

    /// Annotation font size default.
    pub(crate) fn annotation_font_size(&self) -> f64 {
        self.font_size - 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_loc_parses_loose_spellings() {
        assert_eq!("upper-right".parse::<LegendLoc>(), Ok(LegendLoc::UpperRight));
        assert_eq!("Outside_Bottom".parse::<LegendLoc>(), Ok(LegendLoc::OutsideBottom));
        assert!("nowhere".parse::<LegendLoc>().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PlotConfig = serde_json::from_str(r#"{"title":"T","legend_loc":"lower left"}"#).unwrap();
        assert_eq!(cfg.title, "T");
        assert_eq!(cfg.legend_loc, LegendLoc::LowerLeft);
        assert_eq!(cfg.dpi, DEFAULT_DPI);
    }
}
