//! Backend-independent chart artifact.
//!
//! Chart families describe what to draw as a list of [`Element`]s on an
//! [`Axes`]; nothing is rasterized until [`crate::render`] puts the artifact on
//! a plotters backend during export.

use std::str::FromStr;

use crate::config::{Annotation, LegendLoc};
use crate::palette::{Colormap, Rgb8};

/// Canvas handle: physical size and resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    /// Inches.
    pub size: (f64, f64),
    pub dpi: u32,
    pub facecolor: Rgb8,
}

impl Figure {
    pub fn new(size: (f64, f64), dpi: u32) -> Self {
        Self {
            size,
            dpi,
            facecolor: Rgb8::WHITE,
        }
    }

    /// Pixel dimensions at `dpi`, at least 1×1.
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let px = |inches: f64| ((inches * dpi as f64).round() as u32).max(1);
        (px(self.size.0), px(self.size.1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl FromStr for LineStyle {
    type Err = String;

    /// Short codes (`-`, `--`, `:`, `-.`) or their names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-" | "solid" => Ok(LineStyle::Solid),
            "--" | "dashed" => Ok(LineStyle::Dashed),
            ":" | "dotted" => Ok(LineStyle::Dotted),
            "-." | "dashdot" => Ok(LineStyle::DashDot),
            other => Err(format!("unknown line style `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    X,
}

impl MarkerShape {
    /// One-character marker code; empty or `none` means no marker.
    pub fn from_code(code: &str) -> Result<Option<Self>, String> {
        match code.trim() {
            "" | "none" | "None" => Ok(None),
            "o" | "circle" => Ok(Some(MarkerShape::Circle)),
            "s" | "square" => Ok(Some(MarkerShape::Square)),
            "^" | "triangle" => Ok(Some(MarkerShape::Triangle)),
            "D" | "d" | "diamond" => Ok(Some(MarkerShape::Diamond)),
            "+" | "plus" => Ok(Some(MarkerShape::Cross)),
            "x" | "X" => Ok(Some(MarkerShape::X)),
            other => Err(format!("unknown marker `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" | "v" => Ok(Orientation::Vertical),
            "horizontal" | "h" => Ok(Orientation::Horizontal),
            other => Err(format!("expected `vertical` or `horizontal`, got `{other}`")),
        }
    }
}

/// A polyline. Non-finite coordinates split the line into segments.
#[derive(Debug, Clone, PartialEq)]
pub struct LineElement {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: Rgb8,
    /// Points.
    pub width: f64,
    pub style: LineStyle,
    pub marker: Option<MarkerShape>,
    /// Points.
    pub marker_size: f64,
    pub alpha: f64,
    /// Plotted against the secondary y axis.
    pub secondary: bool,
}

/// Filled band between `lower` and `upper` over `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaElement {
    pub label: Option<String>,
    /// `(x, lower, upper)`
    pub points: Vec<(f64, f64, f64)>,
    pub color: Rgb8,
    pub alpha: f64,
}

/// One bar: spans `center ± width/2` along the category axis and `base..top` along the value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub center: f64,
    pub width: f64,
    pub base: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarElement {
    pub label: Option<String>,
    pub bars: Vec<Bar>,
    pub color: Rgb8,
    pub alpha: f64,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Marker area in pt².
    pub size: f64,
    pub color: Rgb8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterElement {
    pub label: Option<String>,
    pub points: Vec<ScatterPoint>,
    pub marker: MarkerShape,
    pub alpha: f64,
    /// Swatch color for the legend.
    pub legend_color: Rgb8,
}

/// Five-number summary plus fliers for one box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub n: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub mean: f64,
    pub fliers: Vec<f64>,
    /// `median ± 1.57·IQR/√n`
    pub notch: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxElement {
    pub label: String,
    pub position: f64,
    pub width: f64,
    /// `None` when the box had no data.
    pub stats: Option<BoxStats>,
    pub color: Rgb8,
    pub alpha: f64,
    pub orientation: Orientation,
    pub show_outliers: bool,
    pub show_mean: bool,
    pub notch: bool,
}

/// One histogram layer over shared bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramElement {
    pub label: Option<String>,
    pub edges: Vec<f64>,
    pub heights: Vec<f64>,
    pub color: Rgb8,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellLabel {
    pub text: String,
    pub color: Rgb8,
}

/// Color grid. Row 0 is drawn at the top; cell `(i, j)` is centered on
/// `(j, rows - 1 - i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapElement {
    pub values: Vec<Vec<f64>>,
    pub cmap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub cell_labels: Option<Vec<Vec<CellLabel>>>,
}

impl HeatmapElement {
    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn cols(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }
}

/// Reference line across the whole plot: vertical at `x = at`, or horizontal at `y = at`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefLineElement {
    pub label: Option<String>,
    pub at: f64,
    pub orientation: Orientation,
    pub color: Rgb8,
    pub style: LineStyle,
    pub width: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Line(LineElement),
    Area(AreaElement),
    Bars(BarElement),
    Scatter(ScatterElement),
    Box(BoxElement),
    Histogram(HistogramElement),
    Heatmap(HeatmapElement),
    RefLine(RefLineElement),
}

/// How an entry is drawn in the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendGlyph {
    Line {
        style: LineStyle,
        marker: Option<MarkerShape>,
    },
    Patch,
    Marker(MarkerShape),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb8,
    pub alpha: f64,
    pub glyph: LegendGlyph,
}

impl Element {
    pub fn label(&self) -> Option<&str> {
        match self {
            Element::Line(e) => e.label.as_deref(),
            Element::Area(e) => e.label.as_deref(),
            Element::Bars(e) => e.label.as_deref(),
            Element::Scatter(e) => e.label.as_deref(),
            Element::Histogram(e) => e.label.as_deref(),
            Element::RefLine(e) => e.label.as_deref(),
            Element::Box(_) | Element::Heatmap(_) => None,
        }
    }

    /// Legend entry for labeled elements.
    pub fn legend_entry(&self) -> Option<LegendEntry> {
        let label = self.label()?.to_string();
        let (color, alpha, glyph) = match self {
            Element::Line(e) => (
                e.color,
                e.alpha,
                LegendGlyph::Line {
                    style: e.style,
                    marker: e.marker,
                },
            ),
            Element::RefLine(e) => (
                e.color,
                e.alpha,
                LegendGlyph::Line {
                    style: e.style,
                    marker: None,
                },
            ),
            Element::Area(e) => (e.color, e.alpha, LegendGlyph::Patch),
            Element::Bars(e) => (e.color, e.alpha, LegendGlyph::Patch),
            Element::Histogram(e) => (e.color, e.alpha, LegendGlyph::Patch),
            Element::Scatter(e) => (e.legend_color, e.alpha, LegendGlyph::Marker(e.marker)),
            Element::Box(_) | Element::Heatmap(_) => return None,
        };
        Some(LegendEntry {
            label,
            color,
            alpha,
            glyph,
        })
    }

    fn is_secondary(&self) -> bool {
        matches!(self, Element::Line(l) if l.secondary)
    }

    /// Data extent `(xmin, xmax, ymin, ymax)`; `None` when nothing finite.
    fn bounds(&self) -> Option<Bounds> {
        let mut b = Bounds::empty();
        match self {
            Element::Line(e) => e.points.iter().for_each(|&(x, y)| b.add(x, y)),
            Element::Area(e) => e.points.iter().for_each(|&(x, lo, hi)| {
                b.add(x, lo);
                b.add(x, hi);
            }),
            Element::Bars(e) => {
                for bar in &e.bars {
                    let (c0, c1) = (bar.center - bar.width / 2.0, bar.center + bar.width / 2.0);
                    for (c, v) in [(c0, bar.base), (c1, bar.top)] {
                        match e.orientation {
                            Orientation::Vertical => b.add(c, v),
                            Orientation::Horizontal => b.add(v, c),
                        }
                    }
                }
            }
            Element::Scatter(e) => e.points.iter().for_each(|p| b.add(p.x, p.y)),
            Element::Box(e) => {
                let mut vals = Vec::new();
                if let Some(s) = &e.stats {
                    vals.extend([s.whisker_low, s.whisker_high, s.q1, s.q3]);
                    if e.show_outliers {
                        vals.extend(s.fliers.iter().copied());
                    }
                }
                for c in [e.position - e.width / 2.0, e.position + e.width / 2.0] {
                    for &v in &vals {
                        match e.orientation {
                            Orientation::Vertical => b.add(c, v),
                            Orientation::Horizontal => b.add(v, c),
                        }
                    }
                    if vals.is_empty() {
                        match e.orientation {
                            Orientation::Vertical => b.add_x(c),
                            Orientation::Horizontal => b.add_y(c),
                        }
                    }
                }
            }
            Element::Histogram(e) => {
                if let (Some(first), Some(last)) = (e.edges.first(), e.edges.last()) {
                    b.add(*first, 0.0);
                    b.add(*last, 0.0);
                }
                e.heights.iter().for_each(|h| b.add_y(*h));
            }
            Element::Heatmap(e) => {
                b.add(-0.5, -0.5);
                b.add(e.cols() as f64 - 0.5, e.rows() as f64 - 0.5);
            }
            Element::RefLine(e) => match e.orientation {
                Orientation::Vertical => b.add_x(e.at),
                Orientation::Horizontal => b.add_y(e.at),
            },
        }
        b.finish()
    }
}

/// Running min/max over finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Bounds {
    fn empty() -> Self {
        Self {
            x: (f64::INFINITY, f64::NEG_INFINITY),
            y: (f64::INFINITY, f64::NEG_INFINITY),
        }
    }

    fn add_x(&mut self, x: f64) {
        if x.is_finite() {
            self.x = (self.x.0.min(x), self.x.1.max(x));
        }
    }

    fn add_y(&mut self, y: f64) {
        if y.is_finite() {
            self.y = (self.y.0.min(y), self.y.1.max(y));
        }
    }

    fn add(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.add_x(x);
            self.add_y(y);
        }
    }

    fn merge(&mut self, other: Bounds) {
        self.add_x(other.x.0);
        self.add_x(other.x.1);
        self.add_y(other.y.0);
        self.add_y(other.y.1);
    }

    fn finish(self) -> Option<Self> {
        (self.x.0 <= self.x.1 || self.y.0 <= self.y.1).then_some(self)
    }
}

/// How tick values on an axis are labeled.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AxisKind {
    #[default]
    Linear,
    /// Values are seconds since the Unix epoch.
    Datetime,
    /// Fixed ticks at the given positions.
    Categorical(Vec<(f64, String)>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axis {
    pub label: String,
    pub kind: AxisKind,
    /// Explicit view limits; derived from the data when `None`.
    pub limits: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStyle {
    pub color: Rgb8,
    pub alpha: f64,
    /// Points.
    pub width: f64,
    pub style: LineStyle,
}

/// Canvas, panel and grid colors for a named style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub face: Rgb8,
    /// Fill behind the data area.
    pub panel: Rgb8,
    /// Axis lines and tick marks.
    pub spine: Rgb8,
    pub grid: Rgb8,
    pub grid_alpha: f64,
    pub grid_style: LineStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            face: Rgb8::WHITE,
            panel: Rgb8::WHITE,
            spine: Rgb8::BLACK,
            grid: Rgb8::BLACK,
            grid_alpha: 0.3,
            grid_style: LineStyle::Dashed,
        }
    }
}

impl Theme {
    pub const STYLES: [&'static str; 5] = ["default", "classic", "ggplot", "whitegrid", "bmh"];

    pub fn named(name: &str) -> Option<Self> {
        let base = Self::default();
        let theme = match name.trim().to_ascii_lowercase().as_str() {
            "default" | "" => base,
            "classic" => Self {
                grid_alpha: 0.5,
                grid_style: LineStyle::Dotted,
                ..base
            },
            "ggplot" => Self {
                panel: Rgb8::new(0xE5, 0xE5, 0xE5),
                spine: Rgb8::new(0x55, 0x55, 0x55),
                grid: Rgb8::WHITE,
                grid_alpha: 1.0,
                grid_style: LineStyle::Solid,
                ..base
            },
            "whitegrid" | "seaborn-whitegrid" => Self {
                spine: Rgb8::new(0xCC, 0xCC, 0xCC),
                grid: Rgb8::new(0xCC, 0xCC, 0xCC),
                grid_alpha: 1.0,
                grid_style: LineStyle::Solid,
                ..base
            },
            "bmh" => Self {
                panel: Rgb8::new(0xEE, 0xEE, 0xEE),
                spine: Rgb8::new(0xBC, 0xBC, 0xBC),
                grid: Rgb8::new(0xB2, 0xB2, 0xB2),
                grid_alpha: 1.0,
                grid_style: LineStyle::Dashed,
                ..base
            },
            _ => return None,
        };
        Some(theme)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub loc: LegendLoc,
    /// Points.
    pub font_size: f64,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub cmap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    /// Points.
    pub font_size: f64,
}

/// Annotation with its font size resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedAnnotation {
    pub text: String,
    pub xy: (f64, f64),
    pub xytext: (f64, f64),
    pub arrow: bool,
    pub font_size: f64,
}

impl PlacedAnnotation {
    pub fn from_config(ann: &Annotation, default_size: f64) -> Self {
        Self {
            text: ann.text.clone(),
            xy: ann.xy,
            xytext: ann.xytext.unwrap_or(ann.xy),
            arrow: ann.arrow,
            font_size: ann.font_size.unwrap_or(default_size),
        }
    }
}

/// Drawing surface: every element plus labels, legend, and annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub title: Option<TextLabel>,
    pub x: Axis,
    pub y: Axis,
    /// Secondary y axis, present when any element is marked `secondary`.
    pub y2: Option<Axis>,
    /// Points; used for axis labels, tick labels are one point smaller.
    pub font_size: f64,
    pub elements: Vec<Element>,
    pub grid: Option<GridStyle>,
    pub legend: Option<Legend>,
    pub colorbar: Option<Colorbar>,
    pub annotations: Vec<PlacedAnnotation>,
    /// Locale tag for tick label separators (`en`, `de`, ...).
    pub locale: String,
    pub theme: Theme,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            title: None,
            x: Axis::default(),
            y: Axis::default(),
            y2: None,
            font_size: crate::config::DEFAULT_FONT_SIZE,
            elements: Vec::new(),
            grid: None,
            legend: None,
            colorbar: None,
            annotations: Vec::new(),
            locale: "en".to_string(),
            theme: Theme::default(),
        }
    }
}

impl Axes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn bars(&self) -> impl Iterator<Item = &BarElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Bars(b) => Some(b),
            _ => None,
        })
    }

    pub fn scatters(&self) -> impl Iterator<Item = &ScatterElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Scatter(s) => Some(s),
            _ => None,
        })
    }

    pub fn boxes(&self) -> impl Iterator<Item = &BoxElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Box(b) => Some(b),
            _ => None,
        })
    }

    pub fn histograms(&self) -> impl Iterator<Item = &HistogramElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::Histogram(h) => Some(h),
            _ => None,
        })
    }

    pub fn heatmap(&self) -> Option<&HeatmapElement> {
        self.elements.iter().find_map(|e| match e {
            Element::Heatmap(h) => Some(h),
            _ => None,
        })
    }

    pub fn ref_lines(&self) -> impl Iterator<Item = &RefLineElement> {
        self.elements.iter().filter_map(|e| match e {
            Element::RefLine(r) => Some(r),
            _ => None,
        })
    }

    /// Legend entries for every labeled element, in drawing order.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        self.elements.iter().filter_map(Element::legend_entry).collect()
    }

    pub fn has_secondary(&self) -> bool {
        self.elements.iter().any(Element::is_secondary)
    }

    /// Extent of elements on the primary (`secondary = false`) or secondary y axis.
    pub fn data_bounds(&self, secondary: bool) -> Option<Bounds> {
        let mut acc = Bounds::empty();
        for e in self.elements.iter().filter(|e| e.is_secondary() == secondary) {
            if let Some(b) = e.bounds() {
                acc.merge(b);
            }
        }
        acc.finish()
    }
}

/// What a chart produces: the canvas and its single drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub figure: Figure,
    pub axes: Axes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_bounds_cover_base_and_top() {
        let mut axes = Axes::new();
        axes.push(Element::Bars(BarElement {
            label: Some("a".into()),
            bars: vec![Bar {
                center: 0.0,
                width: 0.8,
                base: 0.0,
                top: 5.0,
            }],
            color: Rgb8::BLACK,
            alpha: 1.0,
            orientation: Orientation::Vertical,
        }));
        let b = axes.data_bounds(false).unwrap();
        assert_eq!(b.x, (-0.4, 0.4));
        assert_eq!(b.y, (0.0, 5.0));
        assert_eq!(axes.legend_entries()[0].glyph, LegendGlyph::Patch);
    }

    #[test]
    fn style_codes_parse() {
        assert_eq!("--".parse::<LineStyle>(), Ok(LineStyle::Dashed));
        assert_eq!(MarkerShape::from_code("^"), Ok(Some(MarkerShape::Triangle)));
        assert_eq!(MarkerShape::from_code(""), Ok(None));
        assert!(MarkerShape::from_code("?").is_err());
    }

    #[test]
    fn themes_resolve_by_name() {
        assert_eq!(Theme::named("default"), Some(Theme::default()));
        let gg = Theme::named("GGPlot").unwrap();
        assert_eq!(gg.grid, Rgb8::WHITE);
        assert_ne!(gg.panel, gg.face);
        assert!(Theme::named("solarized").is_none());
        assert!(Theme::STYLES.iter().all(|s| Theme::named(s).is_some()));
    }

    #[test]
    fn pixel_size_follows_dpi() {
        let fig = Figure::new((3.5, 2.625), 300);
        assert_eq!(fig.pixel_size(300), (1050, 788));
        assert_eq!(fig.pixel_size(72), (252, 189));
    }
}
