//! Histograms, single or layered per group.

use std::str::FromStr;

use crate::config::PlotConfig;
use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::figure::{
    Artifact, Axis, Element, HistogramElement, LineElement, LineStyle, Orientation, RefLineElement,
};
use crate::palette::{self, Rgb8};
use crate::stats;

use super::{ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column, require_column};

const PLOT: &str = "Histogram";

/// Evaluation points for the density overlay.
const KDE_SAMPLES: usize = 200;

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "HistogramPlotter",
    name: PLOT,
    category: "statistical",
    description: "Visualize the distribution of a continuous variable",
    required_columns: 1,
    supports_multiple_series: true,
    required_params: &[("value_column", ParamKind::String)],
    optional_params: &[
        ("group_column", ParamKind::String),
        ("bins", ParamKind::Int),
        ("density", ParamKind::Bool),
        ("cumulative", ParamKind::Bool),
        ("kde", ParamKind::Bool),
        ("stat", ParamKind::String),
    ],
};

/// Bar height normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistStat {
    #[default]
    Count,
    Frequency,
    Probability,
    Density,
}

impl FromStr for HistStat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(HistStat::Count),
            "frequency" => Ok(HistStat::Frequency),
            "probability" => Ok(HistStat::Probability),
            "density" => Ok(HistStat::Density),
            other => Err(format!("expected count, frequency, probability or density, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramPlotter {
    value_column: Option<String>,
    group_column: Option<String>,
    bins: usize,
    density: bool,
    cumulative: bool,
    kde: bool,
    stat: HistStat,
}

impl Default for HistogramPlotter {
    fn default() -> Self {
        Self {
            value_column: None,
            group_column: None,
            bins: 30,
            density: false,
            cumulative: false,
            kde: false,
            stat: HistStat::Count,
        }
    }
}

impl HistogramPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, value_column: &str, group_column: Option<&str>) -> &mut Self {
        self.value_column = Some(value_column.to_string());
        self.group_column = group_column.map(str::to_string);
        self
    }

    pub fn set_histogram_params(
        &mut self,
        bins: usize,
        density: bool,
        cumulative: bool,
        kde: bool,
        stat: HistStat,
    ) -> &mut Self {
        self.bins = bins.max(1);
        self.density = density;
        self.cumulative = cumulative;
        self.kde = kde;
        self.stat = stat;
        self
    }

    fn is_density(&self) -> bool {
        self.density || self.stat == HistStat::Density
    }

    /// Counts normalized per `stat`/`density`, then accumulated when cumulative.
    fn heights(&self, values: &[f64], edges: &[f64]) -> Vec<f64> {
        let counts = stats::histogram_counts(values, edges);
        let n = values.len().max(1) as f64;
        let widths: Vec<f64> = edges.windows(2).map(|w| w[1] - w[0]).collect();
        let mut heights: Vec<f64> = if self.is_density() {
            counts.iter().zip(&widths).map(|(c, w)| c / (n * w)).collect()
        } else if self.stat == HistStat::Probability {
            counts.iter().map(|c| c / n).collect()
        } else {
            counts
        };
        if self.cumulative {
            let mut acc = 0.0;
            for (i, h) in heights.iter_mut().enumerate() {
                acc += if self.is_density() { *h * widths[i] } else { *h };
                *h = acc;
            }
        }
        heights
    }
}

impl ChartKind for HistogramPlotter {
    fn descriptor() -> &'static PlotterDescriptor {
        &DESCRIPTOR
    }

    fn validate_data(&self, data: &Dataset) -> bool {
        !data.is_empty() && !data.numeric_column_names().is_empty()
    }

    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        self.value_column = Some(params.require_str(PLOT, "value_column")?);
        self.group_column = params.get_str(PLOT, "group_column")?.map(str::to_string);
        Ok(())
    }

    fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        if let Some(g) = params.get_str(PLOT, "group_column")? {
            self.group_column = Some(g.to_string());
        }
        if let Some(b) = params.get_int(PLOT, "bins")? {
            if b < 1 {
                return Err(PlotError::InvalidOption {
                    plot: PLOT,
                    param: "bins".into(),
                    reason: format!("must be at least 1, got {b}"),
                });
            }
            self.bins = b as usize;
        }
        if let Some(b) = params.get_bool(PLOT, "density")? {
            self.density = b;
        }
        if let Some(b) = params.get_bool(PLOT, "cumulative")? {
            self.cumulative = b;
        }
        if let Some(b) = params.get_bool(PLOT, "kde")? {
            self.kde = b;
        }
        if let Some(s) = params.get_str(PLOT, "stat")? {
            self.stat = s.parse().map_err(|reason| PlotError::InvalidOption {
                plot: PLOT,
                param: "stat".into(),
                reason,
            })?;
        }
        Ok(())
    }

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        if self.value_column.is_none() {
            self.value_column = data.numeric_column_names().first().map(|s| s.to_string());
            log::debug!("{PLOT}: defaulting to value={:?}", self.value_column);
        }
        let Some(value_name) = self.value_column.clone() else {
            return Err(PlotError::NoNumericData { plot: PLOT });
        };
        // Infinities cannot be binned; they count as missing.
        let cells: Vec<Option<f64>> = numeric_column(data, PLOT, &value_name)?
            .into_iter()
            .map(|c| c.filter(|v| v.is_finite()))
            .collect();
        let all: Vec<f64> = cells.iter().flatten().copied().collect();
        let edges = stats::bin_edges(&all, self.bins).ok_or(PlotError::NoNumericData { plot: PLOT })?;

        let mut artifact = new_artifact(config);
        artifact.axes.x.label = value_name.clone();
        artifact.axes.y.label = if self.is_density() { "Density" } else { "Frequency" }.to_string();

        match self.group_column.clone() {
            Some(group_name) => {
                require_column(data, PLOT, &group_name)?;
                let keys = data.display_values(&group_name).unwrap_or_default();
                let groups: Vec<(String, Vec<f64>)> = data
                    .unique_values(&group_name)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|g| {
                        let vals: Vec<f64> = cells
                            .iter()
                            .zip(&keys)
                            .filter(|(_, k)| k.as_deref() == Some(g.as_str()))
                            .filter_map(|(v, _)| *v)
                            .collect();
                        (g, vals)
                    })
                    .filter(|(g, vals)| {
                        if vals.is_empty() {
                            log::debug!("{PLOT}: group `{g}` has no values, omitted");
                        }
                        !vals.is_empty()
                    })
                    .collect();
                let colors = palette::series_colors(&config.color_palette, "tab10", groups.len());
                for ((group, vals), color) in groups.into_iter().zip(colors) {
                    artifact.axes.push(Element::Histogram(HistogramElement {
                        label: Some(group),
                        heights: self.heights(&vals, &edges),
                        edges: edges.clone(),
                        color,
                        alpha: 0.6,
                    }));
                }
            }
            None => {
                let color = palette::parse_colors(&config.color_palette)
                    .first()
                    .copied()
                    .unwrap_or(Rgb8::STEELBLUE);
                artifact.axes.push(Element::Histogram(HistogramElement {
                    label: None,
                    heights: self.heights(&all, &edges),
                    edges: edges.clone(),
                    color,
                    alpha: 0.7,
                }));

                for (name, value, color) in [
                    ("Mean", stats::mean(&all), Rgb8::RED),
                    ("Median", stats::median(&all), Rgb8::GREEN),
                ] {
                    let Some(at) = value else { continue };
                    artifact.axes.push(Element::RefLine(RefLineElement {
                        label: Some(format!("{name}: {at:.2}")),
                        at,
                        orientation: Orientation::Vertical,
                        color,
                        style: LineStyle::Dashed,
                        width: 1.5,
                        alpha: 0.7,
                    }));
                }

                if self.kde && !self.cumulative {
                    self.push_kde(&all, &edges, &mut artifact);
                }
            }
        }
        Ok(artifact)
    }
}

impl HistogramPlotter {
    fn push_kde(&self, values: &[f64], edges: &[f64], artifact: &mut Artifact) {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let xs = stats::linspace(lo, hi, KDE_SAMPLES);
        let Some(mut density) = stats::gaussian_kde(values, &xs) else {
            log::debug!("{PLOT}: density overlay skipped, no spread in values");
            return;
        };
        if !self.is_density() {
            let scale = values.len() as f64 * (edges[1] - edges[0]);
            density.iter_mut().for_each(|d| *d *= scale);
        }
        artifact.axes.push(Element::Line(LineElement {
            label: Some("KDE".into()),
            points: xs.into_iter().zip(density).collect(),
            color: Rgb8::RED,
            width: 2.0,
            style: LineStyle::Solid,
            marker: None,
            marker_size: 0.0,
            alpha: 1.0,
            secondary: true,
        }));
        artifact.axes.y2 = Some(Axis {
            label: "Density".into(),
            ..Axis::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn probability_heights_sum_to_one() {
        let mut p = HistogramPlotter::new();
        p.set_histogram_params(4, false, false, false, HistStat::Probability);
        let vals = [1.0, 2.0, 2.5, 3.0, 4.0];
        let edges = stats::bin_edges(&vals, 4).unwrap();
        let total: f64 = p.heights(&vals, &edges).iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_histogram_adds_reference_lines_and_kde() {
        let data = Dataset::from_columns(vec![Column::from_f64(
            "v",
            [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0],
        )])
        .unwrap();
        let mut p = HistogramPlotter::new();
        p.set_columns("v", None)
            .set_histogram_params(5, false, false, true, HistStat::Count);
        let art = p.create_plot(&data, &PlotConfig::default()).unwrap();
        let labels: Vec<_> = art.axes.ref_lines().filter_map(|r| r.label.clone()).collect();
        assert_eq!(labels, ["Mean: 3.00", "Median: 3.00"]);
        assert!(art.axes.has_secondary());
        assert_eq!(art.axes.y.label, "Frequency");
    }

    #[test]
    fn infinite_values_are_treated_as_missing() {
        let data = Dataset::from_columns(vec![Column::from_f64("v", [1.0, 2.0, f64::INFINITY])]).unwrap();
        let mut p = HistogramPlotter::new();
        p.set_columns("v", None)
            .set_histogram_params(2, false, false, false, HistStat::Count);
        let art = p.create_plot(&data, &PlotConfig::default()).unwrap();
        let h = art.axes.histograms().next().unwrap();
        assert!(h.edges.iter().all(|e| e.is_finite()));
        assert_eq!(h.heights.iter().sum::<f64>(), 2.0);
        let means: Vec<_> = art.axes.ref_lines().map(|r| r.at).collect();
        assert_eq!(means, [1.5, 1.5]);

        let only_inf = Dataset::from_columns(vec![Column::from_f64("v", [f64::INFINITY, f64::NEG_INFINITY])]).unwrap();
        let err = HistogramPlotter::new().set_columns("v", None).create_plot(&only_inf, &PlotConfig::default());
        assert!(matches!(err, Err(PlotError::NoNumericData { .. })));
    }

    #[test]
    fn rebinding_columns_clears_an_omitted_group() {
        let mut p = HistogramPlotter::new();
        let grouped = Params::new().with("value_column", "v").with("group_column", "g");
        ChartKind::set_columns(&mut p, &grouped).unwrap();
        assert_eq!(p.group_column.as_deref(), Some("g"));
        ChartKind::set_columns(&mut p, &Params::new().with("value_column", "v")).unwrap();
        assert_eq!(p.group_column, None);
    }
}
