//! Box plots of one or more numeric columns, optionally split by a group column.

use crate::config::PlotConfig;
use crate::dataset::Dataset;
use crate::error::PlotError;
use crate::figure::{Artifact, AxisKind, BoxElement, BoxStats, Element, Orientation};
use crate::palette;
use crate::stats;

use super::{
    ChartKind, ParamKind, Params, PlotterDescriptor, new_artifact, numeric_column, parse_orientation,
    require_column,
};

const PLOT: &str = "Box Plot";

/// Columns picked when none are given.
const DEFAULT_MAX_COLUMNS: usize = 5;

const BOX_WIDTH: f64 = 0.5;

static DESCRIPTOR: PlotterDescriptor = PlotterDescriptor {
    type_name: "BoxPlotter",
    name: PLOT,
    category: "statistical",
    description: "Compare distributions across groups",
    required_columns: 1,
    supports_multiple_series: true,
    required_params: &[("value_columns", ParamKind::StringList)],
    optional_params: &[
        ("group_column", ParamKind::String),
        ("orientation", ParamKind::String),
        ("show_outliers", ParamKind::Bool),
        ("show_means", ParamKind::Bool),
        ("notch", ParamKind::Bool),
    ],
};

/// Tukey box statistics: whiskers reach the most extreme values within
/// 1.5·IQR of the quartiles; anything beyond is a flier.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let q1 = stats::quantile_sorted(&sorted, 0.25);
    let median = stats::quantile_sorted(&sorted, 0.5);
    let q3 = stats::quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let whisker_low = sorted.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
    let whisker_high = sorted.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
    let fliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();
    let n = sorted.len();
    let half_notch = 1.57 * iqr / (n as f64).sqrt();
    Some(BoxStats {
        n,
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        mean: sorted.iter().sum::<f64>() / n as f64,
        fliers,
        notch: (median - half_notch, median + half_notch),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotter {
    value_columns: Vec<String>,
    group_column: Option<String>,
    orientation: Orientation,
    show_outliers: bool,
    show_means: bool,
    notch: bool,
}

impl Default for BoxPlotter {
    fn default() -> Self {
        Self {
            value_columns: Vec::new(),
            group_column: None,
            orientation: Orientation::Vertical,
            show_outliers: true,
            show_means: true,
            notch: false,
        }
    }
}

impl BoxPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, value_columns: &[&str], group_column: Option<&str>) -> &mut Self {
        self.value_columns = value_columns.iter().map(|s| s.to_string()).collect();
        self.group_column = group_column.map(str::to_string);
        self
    }

    pub fn set_box_style(
        &mut self,
        orientation: Orientation,
        show_outliers: bool,
        show_means: bool,
        notch: bool,
    ) -> &mut Self {
        self.orientation = orientation;
        self.show_outliers = show_outliers;
        self.show_means = show_means;
        self.notch = notch;
        self
    }

    /// `(label, values)` per box, in drawing order.
    fn collect_boxes(&self, data: &Dataset) -> Result<Vec<(String, Vec<f64>)>, PlotError> {
        let mut boxes = Vec::new();
        let groups = match &self.group_column {
            Some(g) => {
                require_column(data, PLOT, g)?;
                Some((
                    data.unique_values(g).unwrap_or_default(),
                    data.display_values(g).unwrap_or_default(),
                ))
            }
            None => None,
        };
        for name in &self.value_columns {
            let cells = numeric_column(data, PLOT, name)?;
            match &groups {
                Some((keys, per_row)) => {
                    for key in keys {
                        let vals: Vec<f64> = cells
                            .iter()
                            .zip(per_row)
                            .filter(|(_, k)| k.as_deref() == Some(key.as_str()))
                            .filter_map(|(v, _)| *v)
                            .collect();
                        boxes.push((format!("{name}\n{key}"), vals));
                    }
                }
                None => boxes.push((name.clone(), cells.into_iter().flatten().collect())),
            }
        }
        Ok(boxes)
    }
}

impl ChartKind for BoxPlotter {
    fn descriptor() -> &'static PlotterDescriptor {
        &DESCRIPTOR
    }

    fn validate_data(&self, data: &Dataset) -> bool {
        !data.is_empty() && !data.numeric_column_names().is_empty()
    }

    fn set_columns(&mut self, params: &Params) -> Result<(), PlotError> {
        self.value_columns = params.require_list(PLOT, "value_columns")?;
        self.group_column = params.get_str(PLOT, "group_column")?.map(str::to_string);
        Ok(())
    }

    fn set_options(&mut self, params: &Params) -> Result<(), PlotError> {
        if let Some(g) = params.get_str(PLOT, "group_column")? {
            self.group_column = Some(g.to_string());
        }
        if let Some(o) = parse_orientation(PLOT, params)? {
            self.orientation = o;
        }
        if let Some(b) = params.get_bool(PLOT, "show_outliers")? {
            self.show_outliers = b;
        }
        if let Some(b) = params.get_bool(PLOT, "show_means")? {
            self.show_means = b;
        }
        if let Some(b) = params.get_bool(PLOT, "notch")? {
            self.notch = b;
        }
        Ok(())
    }

    fn create_plot(&mut self, data: &Dataset, config: &PlotConfig) -> Result<Artifact, PlotError> {
        if self.value_columns.is_empty() {
            self.value_columns = data
                .numeric_column_names()
                .into_iter()
                .take(DEFAULT_MAX_COLUMNS)
                .map(str::to_string)
                .collect();
            log::debug!("{PLOT}: defaulting to values={:?}", self.value_columns);
        }
        if self.value_columns.is_empty() {
            return Err(PlotError::NoNumericData { plot: PLOT });
        }
        let boxes = self.collect_boxes(data)?;
        let colors = match palette::parse_colors(&config.color_palette).as_slice() {
            [] => palette::sample_listed("set3", boxes.len()),
            parsed => (0..boxes.len()).map(|i| parsed[i % parsed.len()]).collect(),
        };

        let mut artifact = new_artifact(config);
        let mut ticks = Vec::with_capacity(boxes.len());
        for (i, (label, vals)) in boxes.into_iter().enumerate() {
            let position = (i + 1) as f64;
            let stats = box_stats(&vals);
            if stats.is_none() {
                log::debug!("{PLOT}: `{}` has no values", label.replace('\n', " "));
            }
            ticks.push((position, label.clone()));
            artifact.axes.push(Element::Box(BoxElement {
                label,
                position,
                width: BOX_WIDTH,
                stats,
                color: colors[i],
                alpha: 0.7,
                orientation: self.orientation,
                show_outliers: self.show_outliers,
                show_mean: self.show_means,
                notch: self.notch,
            }));
        }

        let value_label = match self.value_columns.as_slice() {
            [only] => only.clone(),
            _ => "Value".to_string(),
        };
        let category_label = self.group_column.clone().unwrap_or_default();
        let (category_axis, value_axis) = match self.orientation {
            Orientation::Vertical => (&mut artifact.axes.x, &mut artifact.axes.y),
            Orientation::Horizontal => (&mut artifact.axes.y, &mut artifact.axes.x),
        };
        category_axis.kind = AxisKind::Categorical(ticks);
        category_axis.label = category_label;
        value_axis.label = value_label;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn whiskers_stop_at_fences() {
        let s = box_stats(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(s.q1, 2.25);
        assert_eq!(s.median, 3.5);
        assert_eq!(s.q3, 4.75);
        assert_eq!(s.whisker_low, 1.0);
        assert_eq!(s.whisker_high, 5.0);
        assert_eq!(s.fliers, vec![100.0]);
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn groups_split_each_value_column() {
        let data = Dataset::from_columns(vec![
            Column::from_f64("v", [1.0, 2.0, 3.0, 4.0]),
            Column::from_strs("g", ["a", "b", "a", "b"]),
        ])
        .unwrap();
        let mut p = BoxPlotter::new();
        p.set_columns(&["v"], Some("g"));
        let art = p.create_plot(&data, &PlotConfig::default()).unwrap();
        let labels: Vec<_> = art.axes.boxes().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["v\na", "v\nb"]);
        assert_eq!(art.axes.boxes().nth(1).unwrap().position, 2.0);
        assert_eq!(art.axes.x.label, "g");
    }

    #[test]
    fn rebinding_columns_clears_an_omitted_group() {
        let mut p = BoxPlotter::new();
        let grouped = Params::new().with("value_columns", vec!["v"]).with("group_column", "g");
        ChartKind::set_columns(&mut p, &grouped).unwrap();
        ChartKind::set_columns(&mut p, &Params::new().with("value_columns", vec!["v"])).unwrap();
        assert_eq!(p.group_column, None);
    }
}
