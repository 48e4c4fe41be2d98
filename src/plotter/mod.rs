//! Chart families and the pipeline they all run through.
//!
//! Each family implements [`ChartKind`]; [`Chart`] closes over the six of
//! them, and [`Plotter`] binds a chart to a dataset and a configuration and
//! runs the fixed `validate → create → style → annotate` sequence.

pub mod bar;
pub mod boxplot;
pub mod heatmap;
pub mod histogram;
pub mod line;
pub mod scatter;

pub use bar::BarPlotter;
pub use boxplot::BoxPlotter;
pub use heatmap::HeatmapPlotter;
pub use histogram::HistogramPlotter;
pub use line::LinePlotter;
pub use scatter::ScatterPlotter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::PlotConfig;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::PlotError;
use crate::figure::{Artifact, Axes, Figure, GridStyle, Legend, PlacedAnnotation, TextLabel, Theme};

/// Value kinds in a parameter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    StringList,
    Bool,
    Float,
    Int,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::StringList => "string_list",
            ParamKind::Bool => "bool",
            ParamKind::Float => "float",
            ParamKind::Int => "int",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Parse a raw command-line string according to the schema kind.
    /// String lists are comma separated.
    pub fn parse(kind: ParamKind, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        match kind {
            ParamKind::String => Ok(ParamValue::Str(raw.to_string())),
            ParamKind::StringList => Ok(ParamValue::List(
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            )),
            ParamKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(ParamValue::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(ParamValue::Bool(false)),
                other => Err(format!("expected a boolean, got `{other}`")),
            },
            ParamKind::Float => raw
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| format!("expected a number, got `{raw}`")),
            ParamKind::Int => raw
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| format!("expected an integer, got `{raw}`")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::List(v)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(v: Vec<&str>) -> Self {
        ParamValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

/// Named parameters handed to `set_columns` / `set_options`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Parse `key=value` pairs against a schema; keys outside the schema are kept as strings.
    pub fn from_pairs<'p>(
        pairs: impl IntoIterator<Item = (&'p str, &'p str)>,
        schema: &[(&str, ParamKind)],
    ) -> Result<Self, String> {
        let mut params = Params::new();
        for (key, raw) in pairs {
            let kind = schema
                .iter()
                .find(|(k, _)| *k == key)
                .map_or(ParamKind::String, |(_, kind)| *kind);
            let value = ParamValue::parse(kind, raw).map_err(|e| format!("{key}: {e}"))?;
            params.insert(key, value);
        }
        Ok(params)
    }

    fn kind_error(plot: &'static str, key: &str, expected: ParamKind) -> PlotError {
        PlotError::ParamKind {
            plot,
            param: key.to_string(),
            expected,
        }
    }

    pub fn get_str(&self, plot: &'static str, key: &str) -> Result<Option<&str>, PlotError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Str(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(Self::kind_error(plot, key, ParamKind::String)),
        }
    }

    /// A single string is accepted as a one-element list.
    pub fn get_list(&self, plot: &'static str, key: &str) -> Result<Option<Vec<String>>, PlotError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::List(v)) => Ok(Some(v.clone())),
            Some(ParamValue::Str(s)) => Ok(Some(vec![s.clone()])),
            Some(_) => Err(Self::kind_error(plot, key, ParamKind::StringList)),
        }
    }

    pub fn get_bool(&self, plot: &'static str, key: &str) -> Result<Option<bool>, PlotError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(Self::kind_error(plot, key, ParamKind::Bool)),
        }
    }

    /// Integers are accepted where floats are expected.
    pub fn get_float(&self, plot: &'static str, key: &str) -> Result<Option<f64>, PlotError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Float(f)) => Ok(Some(*f)),
            Some(ParamValue::Int(i)) => Ok(Some(*i as f64)),
            Some(_) => Err(Self::kind_error(plot, key, ParamKind::Float)),
        }
    }

    pub fn get_int(&self, plot: &'static str, key: &str) -> Result<Option<i64>, PlotError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Int(i)) => Ok(Some(*i)),
            Some(ParamValue::Float(f)) if f.fract() == 0.0 => Ok(Some(*f as i64)),
            Some(_) => Err(Self::kind_error(plot, key, ParamKind::Int)),
        }
    }

    pub fn require_str(&self, plot: &'static str, key: &str) -> Result<String, PlotError> {
        self.get_str(plot, key)?
            .map(str::to_string)
            .ok_or_else(|| PlotError::MissingParam {
                plot,
                param: key.to_string(),
            })
    }

    pub fn require_list(&self, plot: &'static str, key: &str) -> Result<Vec<String>, PlotError> {
        self.get_list(plot, key)?.ok_or_else(|| PlotError::MissingParam {
            plot,
            param: key.to_string(),
        })
    }
}

/// Static metadata for one chart family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotterDescriptor {
    pub type_name: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub required_columns: usize,
    pub supports_multiple_series: bool,
    pub required_params: &'static [(&'static str, ParamKind)],
    pub optional_params: &'static [(&'static str, ParamKind)],
}

/// Contract every chart family satisfies.
pub trait ChartKind {
    fn descriptor() -> &'static PlotterDescriptor
    where
        Self: Sized;

    /// Minimum-shape check. Never panics.
    fn validate_data(&self, data: &Dataset) -> bool;

    /// Bind column roles from the `required_params` keys (and optional column keys).
    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError>;

    /// Non-column options from `optional_params`; unknown keys are ignored.
    fn set_options(&mut self, params: &Params) -> Result<(), PlotError>;

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError>;
}

/// Type tag for a chart family, as stored in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
    Histogram,
    Box,
    Heatmap,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Scatter,
        ChartType::Histogram,
        ChartType::Box,
        ChartType::Heatmap,
    ];

    pub fn descriptor(self) -> &'static PlotterDescriptor {
        match self {
            ChartType::Line => LinePlotter::descriptor(),
            ChartType::Bar => BarPlotter::descriptor(),
            ChartType::Scatter => ScatterPlotter::descriptor(),
            ChartType::Histogram => HistogramPlotter::descriptor(),
            ChartType::Box => BoxPlotter::descriptor(),
            ChartType::Heatmap => HeatmapPlotter::descriptor(),
        }
    }

    /// Type name used to derive default registry names (`LinePlotter` → `line`).
    pub fn type_name(self) -> &'static str {
        self.descriptor().type_name
    }

    pub fn instantiate(self) -> Chart {
        match self {
            ChartType::Line => Chart::Line(LinePlotter::default()),
            ChartType::Bar => Chart::Bar(BarPlotter::default()),
            ChartType::Scatter => Chart::Scatter(ScatterPlotter::default()),
            ChartType::Histogram => Chart::Histogram(HistogramPlotter::default()),
            ChartType::Box => Chart::Box(BoxPlotter::default()),
            ChartType::Heatmap => Chart::Heatmap(HeatmapPlotter::default()),
        }
    }
}

/// One chart family with its column and option state.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Line(LinePlotter),
    Bar(BarPlotter),
    Scatter(ScatterPlotter),
    Histogram(HistogramPlotter),
    Box(BoxPlotter),
    Heatmap(HeatmapPlotter),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Chart::Line($p) => $body,
            Chart::Bar($p) => $body,
            Chart::Scatter($p) => $body,
            Chart::Histogram($p) => $body,
            Chart::Box($p) => $body,
            Chart::Heatmap($p) => $body,
        }
    };
}

impl Chart {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Chart::Line(_) => ChartType::Line,
            Chart::Bar(_) => ChartType::Bar,
            Chart::Scatter(_) => ChartType::Scatter,
            Chart::Histogram(_) => ChartType::Histogram,
            Chart::Box(_) => ChartType::Box,
            Chart::Heatmap(_) => ChartType::Heatmap,
        }
    }

    pub fn descriptor(&self) -> &'static PlotterDescriptor {
        self.chart_type().descriptor()
    }

    pub fn validate_data(&self, data: &Dataset) -> bool {
        dispatch!(self, p => p.validate_data(data))
    }

    pub fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        dispatch!(self, p => ChartKind::set_columns(p, params))
    }

    pub fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        dispatch!(self, p => p.set_options(params))
    }

    pub fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        dispatch!(self, p => p.create_plot(data, config))
    }
}

/// A chart bound to its dataset and configuration.
#[derive(Debug, Clone)]
pub struct Plotter<'a> {
    data: &'a Dataset,
    config: &'a PlotConfig,
    chart: Chart,
}

impl<'a> Plotter<'a> {
    pub fn new(data: &'a Dataset, config: &'a PlotConfig, chart: Chart) -> Self {
        Self { data, config, chart }
    }

    pub fn descriptor(&self) -> &'static PlotterDescriptor {
        self.chart.descriptor()
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn required_params(&self) -> &'static [(&'static str, ParamKind)] {
        self.descriptor().required_params
    }

    pub fn optional_params(&self) -> &'static [(&'static str, ParamKind)] {
        self.descriptor().optional_params
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Typed access to the family, e.g. for `BarPlotter::set_bar_style`.
    pub fn chart_mut(&mut self) -> &mut Chart {
        &mut self.chart
    }

    pub fn validate_data(&self) -> bool {
        self.chart.validate_data(self.data)
    }

    pub fn set_columns(&mut self, params: &Params) -> Result<&mut Self, PlotError> {
        self.chart.set_columns(params)?;
        Ok(self)
    }

    pub fn set_options(&mut self, params: &Params) -> Result<&mut Self, PlotError> {
        self.chart.set_options(params)?;
        Ok(self)
    }

    /// Run the pipeline and hand the artifact to the caller.
    pub fn plot(&mut self) -> Result<Artifact, PlotError> {
        let name = self.name();
        if !self.validate_data() {
            log::debug!("{name}: dataset rejected by validation");
            return Err(PlotError::InvalidData { plot: name });
        }
        let mut artifact = self.chart.create_plot(self.data, self.config)?;
        log::debug!("{name}: created {} element(s)", artifact.axes.elements.len());
        self.apply_styling(&mut artifact);
        self.add_annotations(&mut artifact.axes);
        Ok(artifact)
    }

    fn apply_styling(&self, artifact: &mut Artifact) {
        let cfg = self.config;
        let theme = Theme::named(&cfg.style).unwrap_or_else(|| {
            log::warn!("unknown style `{}`, using default", cfg.style);
            Theme::default()
        });
        artifact.figure.facecolor = theme.face;
        let axes = &mut artifact.axes;
        axes.theme = theme;
        if !cfg.title.is_empty() {
            axes.title = Some(TextLabel {
                text: cfg.title.clone(),
                font_size: cfg.font_size + 1.0,
            });
        }
        if !cfg.xlabel.is_empty() {
            axes.x.label = cfg.xlabel.clone();
        }
        if !cfg.ylabel.is_empty() {
            axes.y.label = cfg.ylabel.clone();
        }
        axes.font_size = cfg.font_size;
        axes.grid = cfg.grid.then_some(GridStyle {
            color: theme.grid,
            alpha: theme.grid_alpha,
            width: 0.5,
            style: theme.grid_style,
        });
        let entries = axes.legend_entries();
        axes.legend = (cfg.legend && !entries.is_empty()).then(|| Legend {
            loc: cfg.legend_loc,
            font_size: cfg.font_size - 1.0,
            entries,
        });
    }

    fn add_annotations(&self, axes: &mut Axes) {
        let size = self.config.annotation_font_size();
        axes.annotations.extend(
            self.config
                .annotations
                .iter()
                .map(|a| PlacedAnnotation::from_config(a, size)),
        );
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the chart families
// ---------------------------------------------------------------------------

/// Empty artifact sized from the configuration.
pub(crate) fn new_artifact(config: &PlotConfig) -> Artifact {
    let mut axes = Axes::new();
    axes.font_size = config.font_size;
    axes.locale = config.locale.clone();
    Artifact {
        figure: Figure::new(config.figsize, config.dpi),
        axes,
    }
}

pub(crate) fn require_column(data: &Dataset, plot: &'static str, name: &str) -> Result<ColumnKind, PlotError> {
    data.kind(name).ok_or_else(|| PlotError::UnknownColumn {
        plot,
        column: name.to_string(),
    })
}

/// Numeric cells of a column, or the matching error.
pub(crate) fn numeric_column(
    data: &Dataset,
    plot: &'static str,
    name: &str,
) -> Result<Vec<Option<f64>>, PlotError> {
    require_column(data, plot, name)?;
    data.numeric_values(name).ok_or_else(|| PlotError::NotNumeric {
        plot,
        column: name.to_string(),
    })
}

/// Shared `orientation` option parsing.
pub(crate) fn parse_orientation(
    plot: &'static str,
    params: &Params,
) -> Result<Option<crate::figure::Orientation>, PlotError> {
    params
        .get_str(plot, "orientation")?
        .map(|s| {
            s.parse().map_err(|reason| PlotError::InvalidOption {
                plot,
                param: "orientation".into(),
                reason,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_string_reads_as_list() {
        let p = Params::new().with("y_columns", "a");
        assert_eq!(p.get_list("t", "y_columns").unwrap(), Some(vec!["a".to_string()]));
    }

    #[test]
    fn wrong_kind_is_reported() {
        let p = Params::new().with("bins", "many");
        let err = p.get_int("Histogram", "bins").unwrap_err();
        assert_eq!(err.to_string(), "Histogram: parameter `bins` expects int");
    }

    #[test]
    fn pairs_follow_schema() {
        let schema = [("y_columns", ParamKind::StringList), ("bins", ParamKind::Int)];
        let p = Params::from_pairs([("y_columns", "a, b"), ("bins", "12")], &schema).unwrap();
        assert_eq!(p.get("y_columns"), Some(&ParamValue::List(vec!["a".into(), "b".into()])));
        assert_eq!(p.get("bins"), Some(&ParamValue::Int(12)));
    }
}
