//! Heatmaps of raw values or of the pairwise correlation matrix.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::PlotConfig;
use crate::dataset::{Dataset, fmt_number};
use crate::error::PlotError;
use crate::figure::{Artifact, AxisKind, CellLabel, Colorbar, Element, HeatmapElement};
use crate::palette::{Colormap, Rgb8};
use crate::stats;

use super::{ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column};

const PLOT: &str = "Heatmap";

/// Cells with `|v|` above this get white text.
const LIGHT_TEXT_THRESHOLD: f64 = 0.5;

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "HeatmapPlotter",
    name: PLOT,
    category: "statistical",
    description: "Visualize matrix data or correlations",
    required_columns: 2,
    supports_multiple_series: false,
    required_params: &[("value_columns", ParamKind::StringList)],
    optional_params: &[
        ("correlation", ParamKind::Bool),
        ("annotate", ParamKind::Bool),
        ("cmap", ParamKind::String),
        ("fmt", ParamKind::String),
    ],
};

/// Cell label format: `.2f`, `.1e`, `.0%`, `d`, `g`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Fixed(usize),
    Exp(usize),
    Percent(usize),
    Integer,
    General,
}

impl CellFormat {
    pub fn parse(spec: &str) -> Result<Self, String> {
        static RE: OnceLock<Option<Regex>> = OnceLock::new();
        let caps = RE
            .get_or_init(|| Regex::new(r"^\.?(\d+)?([fe%dg])$").ok())
            .as_ref()
            .and_then(|re| re.captures(spec.trim()))
            .ok_or_else(|| format!("unsupported cell format `{spec}`"))?;
        let precision = caps.get(1).and_then(|m| m.as_str().parse().ok());
        Ok(match &caps[2] {
            "f" => CellFormat::Fixed(precision.unwrap_or(6)),
            "e" => CellFormat::Exp(precision.unwrap_or(6)),
            "%" => CellFormat::Percent(precision.unwrap_or(6)),
            "d" => CellFormat::Integer,
            _ => CellFormat::General,
        })
    }

    pub fn format(self, v: f64) -> String {
        match self {
            CellFormat::Fixed(p) => format!("{v:.p$}"),
            CellFormat::Percent(p) => format!("{:.p$}%", v * 100.0),
            CellFormat::Integer => format!("{:.0}", v.round()),
            CellFormat::General => fmt_number(v),
            CellFormat::Exp(p) => {
                // Rust prints `1.5e2`; labels use the two-digit signed exponent.
                let raw = format!("{v:.p$e}");
                match raw.split_once('e') {
                    Some((mantissa, exp)) => {
                        let e: i32 = exp.parse().unwrap_or(0);
                        let sign = if e < 0 { '-' } else { '+' };
                        format!("{mantissa}e{sign}{:02}", e.abs())
                    }
                    None => raw,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPlotter {
    value_columns: Vec<String>,
    correlation: bool,
    annotate: bool,
    cmap: String,
    fmt: CellFormat,
}

impl Default for HeatmapPlotter {
    fn default() -> Self {
        Self {
            value_columns: Vec::new(),
            correlation: false,
            annotate: true,
            cmap: "RdBu_r".to_string(),
            fmt: CellFormat::Fixed(2),
        }
    }
}

/// Pairwise Pearson correlation. The diagonal is 1 except for constant
/// columns, whose row and column are NaN.
pub fn correlation_matrix(columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let mut m = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = stats::pearson(&columns[i], &columns[j]);
            let v = match (i == j, r) {
                (_, None) => f64::NAN,
                (true, Some(_)) => 1.0,
                (false, Some(r)) => r,
            };
            m[i][j] = v;
            m[j][i] = v;
        }
    }
    m
}

impl HeatmapPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, value_columns: &[&str]) -> &mut Self {
        self.value_columns = value_columns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_heatmap_params(&mut self, correlation: bool, annotate: bool, cmap: &str, fmt: CellFormat) -> &mut Self {
        self.correlation = correlation;
        self.annotate = annotate;
        self.cmap = cmap.to_string();
        self.fmt = fmt;
        self
    }

    fn cell_labels(&self, values: &[Vec<f64>]) -> Vec<Vec<CellLabel>> {
        values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| {
                        if v.is_nan() {
                            CellLabel {
                                text: String::new(),
                                color: Rgb8::BLACK,
                            }
                        } else {
                            CellLabel {
                                text: self.fmt.format(v),
                                color: if v.abs() > LIGHT_TEXT_THRESHOLD { Rgb8::WHITE } else { Rgb8::BLACK },
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl ChartKind for HeatmapPlotter {
    fn descriptor() -> &'static PlotterDescriptor {
        &DESCRIPTOR
    }

    fn validate_data(&self, data: &Dataset) -> bool {
        !data.is_empty() && data.column_count() >= 2
    }

    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        self.value_columns = params.require_list(PLOT, "value_columns")?;
        Ok(())
    }

    fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        if let Some(b) = params.get_bool(PLOT, "correlation")? {
            self.correlation = b;
        }
        if let Some(b) = params.get_bool(PLOT, "annotate")? {
            self.annotate = b;
        }
        if let Some(c) = params.get_str(PLOT, "cmap")? {
            self.cmap = c.to_string();
        }
        if let Some(f) = params.get_str(PLOT, "fmt")? {
            self.fmt = CellFormat::parse(f).map_err(|reason| PlotError::InvalidOption {
                plot: PLOT,
                param: "fmt".into(),
                reason,
            })?;
        }
        Ok(())
    }

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        if self.value_columns.is_empty() {
            self.value_columns = data.numeric_column_names().into_iter().map(str::to_string).collect();
            log::debug!("{PLOT}: defaulting to values={:?}", self.value_columns);
        }
        if self.value_columns.is_empty() {
            return Err(PlotError::NoNumericData { plot: PLOT });
        }
        let columns: Vec<Vec<Option<f64>>> = self
            .value_columns
            .iter()
            .map(|name| numeric_column(data, PLOT, name))
            .collect::<Result<_, PlotError>>()?;

        let (values, row_labels, vmin, vmax, bar_label) = if self.correlation {
            let m = correlation_matrix(&columns);
            (m, self.value_columns.clone(), -1.0, 1.0, "Correlation")
        } else {
            let rows = data.row_count();
            let m: Vec<Vec<f64>> = (0..rows)
                .map(|r| columns.iter().map(|c| c[r].unwrap_or(f64::NAN)).collect())
                .collect();
            let finite = m.iter().flatten().copied().filter(|v| v.is_finite());
            let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            if lo > hi {
                return Err(PlotError::NoNumericData { plot: PLOT });
            }
            let labels = (0..rows).map(|r| r.to_string()).collect();
            (m, labels, lo, hi, "Value")
        };

        let mut artifact = new_artifact(config);
        let rows = values.len();
        artifact.axes.x.kind = AxisKind::Categorical(
            self.value_columns
                .iter()
                .enumerate()
                .map(|(j, name)| (j as f64, name.clone()))
                .collect(),
        );
        artifact.axes.y.kind = AxisKind::Categorical(
            row_labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| ((rows - 1 - i) as f64, label))
                .collect(),
        );
        let cmap = Colormap::named(&self.cmap);
        artifact.axes.colorbar = Some(Colorbar {
            cmap: cmap.clone(),
            vmin,
            vmax,
            label: bar_label.to_string(),
        });
        let cell_labels = self.annotate.then(|| self.cell_labels(&values));
        artifact.axes.push(Element::Heatmap(HeatmapElement {
            values,
            cmap,
            vmin,
            vmax,
            cell_labels,
        }));
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_formats() {
        assert_eq!(CellFormat::parse(".2f").unwrap().format(0.12345), "0.12");
        assert_eq!(CellFormat::parse(".1%").unwrap().format(0.5), "50.0%");
        assert_eq!(CellFormat::parse("d").unwrap().format(2.6), "3");
        assert_eq!(CellFormat::parse(".2e").unwrap().format(1234.0), "1.23e+03");
        assert!(CellFormat::parse("x").is_err());
    }

    #[test]
    fn constant_column_correlates_as_nan() {
        let m = correlation_matrix(&[
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![Some(5.0), Some(5.0), Some(5.0)],
        ]);
        assert_eq!(m[0][0], 1.0);
        assert!(m[1][1].is_nan());
        assert!(m[0][1].is_nan());
    }
}
