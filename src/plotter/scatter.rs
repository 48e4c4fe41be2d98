//! Scatter plots with optional size/color encodings and a regression fit.

use crate::config::PlotConfig;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::PlotError;
use crate::figure::{
    AreaElement, Artifact, Colorbar, Element, LineElement, LineStyle, MarkerShape, ScatterElement,
    ScatterPoint,
};
use crate::palette::{self, Colormap, Rgb8};
use crate::stats;

use super::{
    ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column, require_column,
};

const PLOT: &str = "Scatter Plot";

/// Default first series color, tab10's blue.
const DEFAULT_COLOR: Rgb8 = Rgb8::new(0x1f, 0x77, 0xb4);

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "ScatterPlotter",
    name: PLOT,
    category: "statistical",
    description: "Visualize relationships between two continuous variables",
    required_columns: 2,
    supports_multiple_series: true,
    required_params: &[("x_column", ParamKind::String), ("y_column", ParamKind::String)],
    optional_params: &[
        ("size_column", ParamKind::String),
        ("color_column", ParamKind::String),
        ("fit_line", ParamKind::Bool),
        ("confidence_band", ParamKind::Bool),
        ("alpha", ParamKind::Float),
        ("marker_style", ParamKind::String),
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlotter {
    x_column: Option<String>,
    y_column: Option<String>,
    size_column: Option<String>,
    color_column: Option<String>,
    fit_line: bool,
    confidence_band: bool,
    alpha: Option<f64>,
    marker: MarkerShape,
}

impl Default for ScatterPlotter {
    fn default() -> Self {
        Self {
            x_column: None,
            y_column: None,
            size_column: None,
            color_column: None,
            fit_line: false,
            confidence_band: false,
            alpha: None,
            marker: MarkerShape::Circle,
        }
    }
}

/// Marker areas in pt²: `20 + 200·(s − min)/(max − min)`, 120 when the column is constant.
pub fn normalized_sizes(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let finite: Vec<f64> = values.iter().flatten().copied().collect();
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    values
        .iter()
        .map(|v| {
            v.map(|s| {
                if span > 0.0 {
                    20.0 + 200.0 * (s - lo) / span
                } else {
                    120.0
                }
            })
        })
        .collect()
}

impl ScatterPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(
        &mut self,
        x_column: &str,
        y_column: &str,
        size_column: Option<&str>,
        color_column: Option<&str>,
    ) -> &mut Self {
        self.x_column = Some(x_column.to_string());
        self.y_column = Some(y_column.to_string());
        self.size_column = size_column.map(str::to_string);
        self.color_column = color_column.map(str::to_string);
        self
    }

    pub fn set_regression(&mut self, fit_line: bool, confidence_band: bool) -> &mut Self {
        self.fit_line = fit_line;
        self.confidence_band = confidence_band;
        self
    }

    fn fit_elements(&self, points: &[(f64, f64)], artifact: &mut Artifact, config: &PlotConfig) {
        let Some(fit) = stats::linregress(points) else {
            log::debug!("{PLOT}: regression skipped, x has no spread");
            return;
        };
        let lo = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let hi = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        if self.confidence_band && fit.n > 2 {
            let band = stats::linspace(lo, hi, 50)
                .into_iter()
                .map(|x| {
                    let y = fit.predict(x);
                    let m = fit.confidence_margin(x);
                    (x, y - m, y + m)
                })
                .collect();
            artifact.axes.push(Element::Area(AreaElement {
                label: None,
                points: band,
                color: Rgb8::RED,
                alpha: 0.2,
            }));
        }
        artifact.axes.push(Element::Line(LineElement {
            label: Some(format!("R² = {:.3}", fit.r_squared())),
            points: vec![(lo, fit.predict(lo)), (hi, fit.predict(hi))],
            color: Rgb8::RED,
            width: 2.0,
            style: LineStyle::Solid,
            marker: None,
            marker_size: config.marker_size,
            alpha: 1.0,
            secondary: false,
        }));
    }
}

impl ChartKind for ScatterPlotter {
    fn descriptor() -> &'static PlotterDescriptor {
        &DESCRIPTOR
    }

    fn validate_data(&self, data: &Dataset) -> bool {
        !data.is_empty() && data.numeric_column_names().len() >= 2
    }

    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        self.x_column = Some(params.require_str(PLOT, "x_column")?);
        self.y_column = Some(params.require_str(PLOT, "y_column")?);
        self.size_column = params.get_str(PLOT, "size_column")?.map(str::to_string);
        self.color_column = params.get_str(PLOT, "color_column")?.map(str::to_string);
        Ok(())
    }

    fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        if let Some(s) = params.get_str(PLOT, "size_column")? {
            self.size_column = Some(s.to_string());
        }
        if let Some(c) = params.get_str(PLOT, "color_column")? {
            self.color_column = Some(c.to_string());
        }
        if let Some(b) = params.get_bool(PLOT, "fit_line")? {
            self.fit_line = b;
        }
        if let Some(b) = params.get_bool(PLOT, "confidence_band")? {
            self.confidence_band = b;
        }
        if let Some(a) = params.get_float(PLOT, "alpha")? {
            if !(0.0..=1.0).contains(&a) {
                return Err(PlotError::InvalidOption {
                    plot: PLOT,
                    param: "alpha".into(),
                    reason: format!("must be within [0, 1], got {a}"),
                });
            }
            self.alpha = Some(a);
        }
        if let Some(m) = params.get_str(PLOT, "marker_style")? {
            self.marker = MarkerShape::from_code(m)
                .map_err(|reason| PlotError::InvalidOption {
                    plot: PLOT,
                    param: "marker_style".into(),
                    reason,
                })?
                .unwrap_or(MarkerShape::Circle);
        }
        Ok(())
    }

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        if self.x_column.is_none() || self.y_column.is_none() {
            let numeric = data.numeric_column_names();
            if let [x, y, ..] = numeric.as_slice() {
                log::debug!("{PLOT}: defaulting to x={x}, y={y}");
                self.x_column = Some(x.to_string());
                self.y_column = Some(y.to_string());
            }
        }
        let (Some(x_name), Some(y_name)) = (self.x_column.clone(), self.y_column.clone()) else {
            return Err(PlotError::NoNumericData { plot: PLOT });
        };
        let xs = numeric_column(data, PLOT, &x_name)?;
        let ys = numeric_column(data, PLOT, &y_name)?;
        let rows = xs.len();

        let sizes: Vec<f64> = match &self.size_column {
            Some(name) => normalized_sizes(&numeric_column(data, PLOT, name)?)
                .into_iter()
                .map(|s| s.unwrap_or(0.0))
                .collect(),
            None => vec![config.marker_size.powi(2); rows],
        };
        let alpha = self.alpha.unwrap_or(config.alpha);
        let mut artifact = new_artifact(config);
        artifact.axes.x.label = x_name.clone();
        artifact.axes.y.label = y_name.clone();

        let point_at = |i: usize, color: Rgb8| -> Option<ScatterPoint> {
            Some(ScatterPoint {
                x: xs[i]?,
                y: ys[i]?,
                size: sizes[i],
                color,
            })
        };

        let color_kind = match &self.color_column {
            Some(name) => Some((name.clone(), require_column(data, PLOT, name)?)),
            None => None,
        };
        match color_kind {
            Some((name, ColumnKind::Numeric)) => {
                let cvals = numeric_column(data, PLOT, &name)?;
                let finite: Vec<f64> = cvals.iter().flatten().copied().collect();
                let vmin = finite.iter().copied().fold(f64::INFINITY, f64::min);
                let vmax = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let cmap = Colormap::named("viridis");
                let points = (0..rows)
                    .filter_map(|i| point_at(i, cmap.map(cvals[i]?, vmin, vmax)))
                    .collect();
                artifact.axes.push(Element::Scatter(ScatterElement {
                    label: None,
                    points,
                    marker: self.marker,
                    alpha,
                    legend_color: cmap.at(0.5),
                }));
                if vmin <= vmax {
                    artifact.axes.colorbar = Some(Colorbar {
                        cmap,
                        vmin,
                        vmax,
                        label: name,
                    });
                }
            }
            Some((name, _)) => {
                let keys = data.display_values(&name).unwrap_or_default();
                let categories = data.unique_values(&name).unwrap_or_default();
                let colors = palette::series_colors(&config.color_palette, "tab10", categories.len());
                for (ci, cat) in categories.iter().enumerate() {
                    let points = (0..rows)
                        .filter(|&i| keys[i].as_deref() == Some(cat.as_str()))
                        .filter_map(|i| point_at(i, colors[ci]))
                        .collect();
                    artifact.axes.push(Element::Scatter(ScatterElement {
                        label: Some(cat.clone()),
                        points,
                        marker: self.marker,
                        alpha,
                        legend_color: colors[ci],
                    }));
                }
            }
            None => {
                let color = palette::parse_colors(&config.color_palette)
                    .first()
                    .copied()
                    .unwrap_or(DEFAULT_COLOR);
                let points = (0..rows).filter_map(|i| point_at(i, color)).collect();
                artifact.axes.push(Element::Scatter(ScatterElement {
                    label: None,
                    points,
                    marker: self.marker,
                    alpha,
                    legend_color: color,
                }));
            }
        }

        if self.fit_line {
            let complete: Vec<(f64, f64)> = xs
                .iter()
                .zip(&ys)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            self.fit_elements(&complete, &mut artifact, config);
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn sizes_span_twenty_to_two_twenty() {
        let s = normalized_sizes(&[Some(0.0), Some(5.0), Some(10.0), None]);
        assert_eq!(s, vec![Some(20.0), Some(120.0), Some(220.0), None]);
        assert_eq!(normalized_sizes(&[Some(3.0), Some(3.0)]), vec![Some(120.0), Some(120.0)]);
    }

    #[test]
    fn categorical_color_splits_series() {
        let data = Dataset::from_columns(vec![
            Column::from_f64("x", [1.0, 2.0, 3.0, 4.0]),
            Column::from_f64("y", [2.0, 4.0, 6.0, 8.0]),
            Column::from_strs("g", ["a", "b", "a", "b"]),
        ])
        .unwrap();
        let mut p = ScatterPlotter::new();
        p.set_columns("x", "y", None, Some("g")).set_regression(true, true);
        let art = p.create_plot(&data, &PlotConfig::default()).unwrap();
        let labels: Vec<_> = art.axes.scatters().map(|s| s.label.clone().unwrap()).collect();
        assert_eq!(labels, ["a", "b"]);
        let fit = art.axes.lines().next().unwrap();
        assert_eq!(fit.label.as_deref(), Some("R² = 1.000"));
        assert_eq!(fit.points, vec![(1.0, 2.0), (4.0, 8.0)]);
    }

    #[test]
    fn rebinding_columns_clears_optional_encodings() {
        let mut p = ScatterPlotter::new();
        let full = Params::new()
            .with("x_column", "x")
            .with("y_column", "y")
            .with("size_column", "s")
            .with("color_column", "g");
        ChartKind::set_columns(&mut p, &full).unwrap();
        assert_eq!(p.size_column.as_deref(), Some("s"));
        ChartKind::set_columns(&mut p, &Params::new().with("x_column", "x").with("y_column", "y")).unwrap();
        assert_eq!((p.size_column.clone(), p.color_column.clone()), (None, None));
    }
}
