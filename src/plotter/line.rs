//! Line plots for temporal or continuous data.

use crate::config::PlotConfig;
use crate::dataset::{ColumnData, Dataset};
use crate::error::PlotError;
use crate::figure::{AreaElement, Artifact, AxisKind, Element, LineElement, LineStyle, MarkerShape};
use crate::palette;
use crate::stats;

use super::{ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column};

const PLOT: &str = "Line Plot";

/// Neighborhood fraction for `smooth`.
pub const LOESS_SPAN: f64 = 0.3;

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "LinePlotter",
    name: PLOT,
    category: "temporal",
    description: "Display trends over time or continuous data",
    required_columns: 1,
    supports_multiple_series: true,
    required_params: &[("x_column", ParamKind::String), ("y_columns", ParamKind::StringList)],
    optional_params: &[
        ("colors", ParamKind::StringList),
        ("line_styles", ParamKind::StringList),
        ("markers", ParamKind::StringList),
        ("smooth", ParamKind::Bool),
        ("fill_between", ParamKind::Bool),
    ],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinePlotter {
    x_column: Option<String>,
    y_columns: Vec<String>,
    colors: Option<Vec<String>>,
    line_styles: Option<Vec<String>>,
    markers: Option<Vec<String>>,
    smooth: bool,
    fill_between: bool,
}

impl LinePlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, x_column: &str, y_columns: &[&str]) -> &mut Self {
        self.x_column = Some(x_column.to_string());
        self.y_columns = y_columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Per-series colors (hex), line style codes, and marker codes. Shorter
    /// lists leave the remaining series at their defaults.
    pub fn set_styles(
        &mut self,
        colors: Option<Vec<String>>,
        line_styles: Option<Vec<String>>,
        markers: Option<Vec<String>>,
    ) -> &mut Self {
        self.colors = colors;
        self.line_styles = line_styles;
        self.markers = markers;
        self
    }

    pub fn set_smoothing(&mut self, smooth: bool, fill_between: bool) -> &mut Self {
        self.smooth = smooth;
        self.fill_between = fill_between;
        self
    }

    pub fn x_column(&self) -> Option<&str> {
        self.x_column.as_deref()
    }

    pub fn y_columns(&self) -> &[String] {
        &self.y_columns
    }

    fn style_for(&self, i: usize) -> Result<LineStyle, PlotError> {
        match self.line_styles.as_ref().and_then(|s| s.get(i)) {
            None => Ok(LineStyle::Solid),
            Some(code) => code.parse().map_err(|reason| PlotError::InvalidOption {
                plot: PLOT,
                param: "line_styles".into(),
                reason,
            }),
        }
    }

    fn marker_for(&self, i: usize) -> Result<Option<MarkerShape>, PlotError> {
        match self.markers.as_ref().and_then(|m| m.get(i)) {
            None => Ok(None),
            Some(code) => MarkerShape::from_code(code).map_err(|reason| PlotError::InvalidOption {
                plot: PLOT,
                param: "markers".into(),
                reason,
            }),
        }
    }
}

/// X positions for a column of any kind, and how its ticks are labeled.
/// Datetimes become epoch seconds; categories become their row index.
pub(crate) fn x_positions(
    data: &Dataset,
    plot: &'static str,
    name: &str,
) -> Result<(Vec<f64>, AxisKind), PlotError> {
    let Some(column) = data.column(name) else {
        return Err(PlotError::UnknownColumn {
            plot,
            column: name.to_string(),
        });
    };
    Ok(match &column.data {
        ColumnData::Numeric(v) => (
            v.iter().map(|x| x.unwrap_or(f64::NAN)).collect(),
            AxisKind::Linear,
        ),
        ColumnData::Datetime(v) => (
            v.iter()
                .map(|d| d.map_or(f64::NAN, |d| d.and_utc().timestamp() as f64))
                .collect(),
            AxisKind::Datetime,
        ),
        ColumnData::Categorical(v) => {
            let ticks = v
                .iter()
                .enumerate()
                .map(|(i, s)| (i as f64, s.clone().unwrap_or_default()))
                .collect();
            ((0..v.len()).map(|i| i as f64).collect(), AxisKind::Categorical(ticks))
        }
    })
}

impl ChartKind for LinePlotter {
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
        if let Some(c) = params.get_list(PLOT, "colors")? {
            self.colors = Some(c);
        }
        if let Some(s) = params.get_list(PLOT, "line_styles")? {
            self.line_styles = Some(s);
        }
        if let Some(m) = params.get_list(PLOT, "markers")? {
            self.markers = Some(m);
        }
        if let Some(b) = params.get_bool(PLOT, "smooth")? {
            self.smooth = b;
        }
        if let Some(b) = params.get_bool(PLOT, "fill_between")? {
            self.fill_between = b;
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
        let (xs, x_kind) = x_positions(data, PLOT, &x_name)?;

        let n = self.y_columns.len();
        let colors: Vec<palette::Rgb8> = match &self.colors {
            Some(c) if !c.is_empty() => {
                let parsed = palette::parse_colors(c);
                let fallback = palette::series_colors(&config.color_palette, "tab10", n);
                (0..n).map(|i| parsed.get(i).copied().unwrap_or(fallback[i])).collect()
            }
            _ => palette::series_colors(&config.color_palette, "tab10", n),
        };

        let mut artifact = new_artifact(config);
        artifact.axes.x.kind = x_kind;

        for (i, y_name) in self.y_columns.iter().enumerate() {
            let ys = numeric_column(data, PLOT, y_name)?;
            let color = colors[i];
            let mut points: Vec<(f64, f64)> = xs
                .iter()
                .zip(&ys)
                .map(|(x, y)| (*x, y.unwrap_or(f64::NAN)))
                .collect();

            if self.smooth {
                let mut finite: Vec<(f64, f64)> =
                    points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()).collect();
                finite.sort_by(|a, b| a.0.total_cmp(&b.0));
                let (fx, fy): (Vec<f64>, Vec<f64>) = finite.into_iter().unzip();
                let fitted = stats::loess(&fx, &fy, LOESS_SPAN);
                points = fx.into_iter().zip(fitted).collect();
            }

            if self.fill_between {
                artifact.axes.push(Element::Area(AreaElement {
                    label: None,
                    points: points
                        .iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|&(x, y)| (x, 0.0, y))
                        .collect(),
                    color,
                    alpha: 0.2,
                }));
            }

            artifact.axes.push(Element::Line(LineElement {
                label: Some(y_name.clone()),
                points,
                color,
                width: config.line_width,
                style: self.style_for(i)?,
                marker: self.marker_for(i)?,
                marker_size: config.marker_size,
                alpha: config.alpha,
                secondary: false,
            }));
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
            Column::from_strs("day", ["mon", "tue", "wed"]),
            Column::from_f64("a", [1.0, 2.0, 3.0]),
            Column::from_strs("note", ["x", "y", "z"]),
            Column::from_f64("b", [3.0, 2.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn defaults_pick_numeric_columns_after_the_first() {
        let mut p = LinePlotter::new();
        let art = p.create_plot(&data(), &PlotConfig::default()).unwrap();
        assert_eq!(p.y_columns(), ["a", "b"]);
        assert_eq!(art.axes.lines().count(), 2);
        assert!(matches!(art.axes.x.kind, AxisKind::Categorical(ref t) if t.len() == 3));
    }

    #[test]
    fn explicit_styles_apply_per_series() {
        let mut p = LinePlotter::new();
        p.set_columns("day", &["a", "b"]).set_styles(
            Some(vec!["#ff0000".into()]),
            Some(vec!["--".into()]),
            Some(vec!["o".into(), "s".into()]),
        );
        let art = p.create_plot(&data(), &PlotConfig::default()).unwrap();
        let lines: Vec<_> = art.axes.lines().collect();
        assert_eq!(lines[0].color.to_hex(), "#ff0000");
        assert_eq!(lines[0].style, LineStyle::Dashed);
        assert_eq!(lines[1].style, LineStyle::Solid);
        assert_eq!(lines[1].marker, Some(MarkerShape::Square));
    }

    #[test]
    fn text_column_as_y_is_rejected() {
        let mut p = LinePlotter::new();
        p.set_columns("day", &["note"]);
        let err = p.create_plot(&data(), &PlotConfig::default()).unwrap_err();
        assert!(matches!(err, PlotError::NotNumeric { ref column, .. } if column == "note"));
    }
}
