//! Bar charts: simple, grouped, or stacked, vertical or horizontal.

use crate::config::PlotConfig;
use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::figure::{Artifact, AxisKind, Bar, BarElement, Element, Orientation};
use crate::palette::{self, Rgb8};

use super::{
    ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column, parse_orientation,
    require_column,
};

const PLOT: &str = "Bar Chart";

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "BarPlotter",
    name: PLOT,
    category: "categorical",
    description: "Compare values across categories",
    required_columns: 2,
    supports_multiple_series: true,
    required_params: &[("x_column", ParamKind::String), ("y_columns", ParamKind::StringList)],
    optional_params: &[
        ("orientation", ParamKind::String),
        ("grouped", ParamKind::Bool),
        ("stacked", ParamKind::Bool),
        ("bar_width", ParamKind::Float),
        ("colors", ParamKind::StringList),
    ],
};

/// How multiple series share a category slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarLayout {
    Simple,
    Grouped,
    Stacked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarPlotter {
    x_column: Option<String>,
    y_columns: Vec<String>,
    orientation: Orientation,
    grouped: bool,
    stacked: bool,
    bar_width: f64,
    colors: Option<Vec<String>>,
}

impl Default for BarPlotter {
    fn default() -> Self {
        Self {
            x_column: None,
            y_columns: Vec::new(),
            orientation: Orientation::Vertical,
            grouped: false,
            stacked: false,
            bar_width: 0.8,
            colors: None,
        }
    }
}

impl BarPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, x_column: &str, y_columns: &[&str]) -> &mut Self {
        self.x_column = Some(x_column.to_string());
        self.y_columns = y_columns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_bar_style(&mut self, orientation: Orientation, grouped: bool, stacked: bool, bar_width: f64) -> &mut Self {
        self.orientation = orientation;
        self.grouped = grouped;
        self.stacked = stacked;
        self.bar_width = bar_width;
        self
    }

    pub fn set_colors(&mut self, colors: Vec<String>) -> &mut Self {
        self.colors = Some(colors);
        self
    }

    /// Stacked wins over grouped; several series without either are grouped.
    pub fn layout(&self) -> BarLayout {
        if self.stacked {
            BarLayout::Stacked
        } else if self.grouped || self.y_columns.len() > 1 {
            BarLayout::Grouped
        } else {
            BarLayout::Simple
        }
    }

    fn series_colors(&self, config: &PlotConfig, n: usize) -> Vec<Rgb8> {
        match &self.colors {
            Some(c) if !c.is_empty() => palette::series_colors(c, "tab10", n),
            _ => palette::series_colors(&config.color_palette, "tab10", n),
        }
    }
}

impl ChartKind for BarPlotter {
    fn descriptor() -> &'static PlotterDescriptor {
        &DESCRIPTOR
    }

    fn validate_data(&self, data: &Dataset) -> bool {
        !data.is_empty() && data.column_count() >= 2
    }

    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        self.x_column = Some(params.require_str(PLOT, "x_column")?);
        self.y_columns = params.require_list(PLOT, "y_columns")?;
        Ok(())
    }

    fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        if let Some(o) = parse_orientation(PLOT, params)? {
            self.orientation = o;
        }
        if let Some(b) = params.get_bool(PLOT, "grouped")? {
            self.grouped = b;
        }
        if let Some(b) = params.get_bool(PLOT, "stacked")? {
            self.stacked = b;
        }
        if let Some(w) = params.get_float(PLOT, "bar_width")? {
            if !(w > 0.0 && w.is_finite()) {
                return Err(PlotError::InvalidOption {
                    plot: PLOT,
                    param: "bar_width".into(),
                    reason: format!("must be positive, got {w}"),
                });
            }
            self.bar_width = w;
        }
        if let Some(c) = params.get_list(PLOT, "colors")? {
            self.colors = Some(c);
        }
        Ok(())
    }

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        if self.x_column.is_none() || self.y_columns.is_empty() {
            let names = data.column_names();
            let x = names.first().map(|s| s.to_string()).ok_or(PlotError::InvalidData { plot: PLOT })?;
            self.y_columns = names
                .iter()
                .skip(1)
                .filter(|n| data.is_numeric(n))
                .map(|s| s.to_string())
                .collect();
            log::debug!("{PLOT}: defaulting to x={x}, y={:?}", self.y_columns);
            self.x_column = Some(x);
        }
        let x_name = self.x_column.clone().unwrap_or_default();
        require_column(data, PLOT, &x_name)?;
        let categories = data.display_values(&x_name).unwrap_or_default();
        let rows = categories.len();

        let series: Vec<(String, Vec<Option<f64>>)> = self
            .y_columns
            .iter()
            .map(|name| numeric_column(data, PLOT, name).map(|v| (name.clone(), v)))
            .collect::<Result<_, PlotError>>()?;
        let n = series.len();
        let colors = self.series_colors(config, n);
        let layout = self.layout();
        log::debug!("{PLOT}: {layout:?} layout, {n} series over {rows} categories");

        let mut artifact = new_artifact(config);
        let mut baseline = vec![0.0; rows];

        for (i, (name, values)) in series.iter().enumerate() {
            let bars: Vec<Bar> = match layout {
                BarLayout::Stacked => values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| {
                        let base = baseline[row];
                        baseline[row] += v.unwrap_or(0.0);
                        Bar {
                            center: row as f64,
                            width: self.bar_width,
                            base,
                            top: baseline[row],
                        }
                    })
                    .collect(),
                BarLayout::Grouped => {
                    let width = self.bar_width / n as f64;
                    let offset = width * (i as f64 - n as f64 / 2.0 + 0.5);
                    values
                        .iter()
                        .enumerate()
                        .filter_map(|(row, v)| {
                            v.map(|v| Bar {
                                center: row as f64 + offset,
                                width,
                                base: 0.0,
                                top: v,
                            })
                        })
                        .collect()
                }
                BarLayout::Simple => values
                    .iter()
                    .enumerate()
                    .filter_map(|(row, v)| {
                        v.map(|v| Bar {
                            center: row as f64,
                            width: self.bar_width,
                            base: 0.0,
                            top: v,
                        })
                    })
                    .collect(),
            };
            artifact.axes.push(Element::Bars(BarElement {
                label: Some(name.clone()),
                bars,
                color: colors[i],
                alpha: config.alpha,
                orientation: self.orientation,
            }));
        }

        let ticks = AxisKind::Categorical(
            categories
                .into_iter()
                .enumerate()
                .map(|(i, c)| (i as f64, c.unwrap_or_default()))
                .collect(),
        );
        match self.orientation {
            Orientation::Vertical => artifact.axes.x.kind = ticks,
            Orientation::Horizontal => artifact.axes.y.kind = ticks,
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            Column::from_strs("k", ["a", "b", "c"]),
            Column::from_f64("u", [1.0, 2.0, 3.0]),
            Column::from_f64("v", [4.0, 5.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn several_columns_without_layout_render_grouped() {
        let mut p = BarPlotter::new();
        p.set_columns("k", &["u", "v"]);
        assert_eq!(p.layout(), BarLayout::Grouped);
        let art = p.create_plot(&data(), &PlotConfig::default()).unwrap();
        let series: Vec<_> = art.axes.bars().collect();
        assert_eq!(series.len(), 2);
        assert!((series[0].bars[0].center + 0.2).abs() < 1e-12);
        assert!((series[1].bars[0].center - 0.2).abs() < 1e-12);
        assert!((series[0].bars[0].width - 0.4).abs() < 1e-12);
    }

    #[test]
    fn horizontal_bars_put_categories_on_y() {
        let mut p = BarPlotter::new();
        p.set_columns("k", &["u"])
            .set_bar_style(Orientation::Horizontal, false, false, 0.5);
        let art = p.create_plot(&data(), &PlotConfig::default()).unwrap();
        assert!(matches!(art.axes.y.kind, AxisKind::Categorical(_)));
        assert_eq!(art.axes.x.kind, AxisKind::Linear);
    }
}
