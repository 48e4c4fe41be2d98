use pubplot::figure::{AxisKind, Theme};
use pubplot::plotter::Params;
use pubplot::{Column, Dataset, PlotConfig, PlotError, PlotRegistry, sample};

fn sales() -> Dataset {
    Dataset::from_columns(vec![
        Column::from_strs("region", ["north", "south", "east"]),
        Column::from_f64("q1", [1.0, 2.0, 3.0]),
        Column::numeric("q2", vec![Some(4.0), None, Some(6.0)]),
    ])
    .unwrap()
}

#[test]
fn stacked_bars_accumulate_series() {
    let data = sales();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("x_column", "region").with("y_columns", vec!["q1", "q2"]))
        .unwrap()
        .set_options(&Params::new().with("stacked", true))
        .unwrap();
    let art = plotter.plot().unwrap();

    let layers: Vec<_> = art.axes.bars().collect();
    assert_eq!(layers.len(), 2);
    let tops: Vec<f64> = layers[1].bars.iter().map(|b| b.top).collect();
    // null counts as zero on top of the first series
    assert_eq!(tops, [5.0, 2.0, 9.0]);
    let bases: Vec<f64> = layers[1].bars.iter().map(|b| b.base).collect();
    assert_eq!(bases, [1.0, 2.0, 3.0]);
    assert!(matches!(art.axes.x.kind, AxisKind::Categorical(ref t) if t[2].1 == "east"));
}

#[test]
fn legend_and_title_come_from_config() {
    let data = sales();
    let mut config = PlotConfig::default();
    config.title = "Sales".into();
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    let art = plotter.plot().unwrap();
    assert_eq!(art.axes.title.as_ref().map(|t| t.text.as_str()), Some("Sales"));
    let legend = art.axes.legend.as_ref().unwrap();
    let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, ["q1", "q2"]);

    config.legend = false;
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    assert!(plotter.plot().unwrap().axes.legend.is_none());
}

#[test]
fn correlation_heatmap_is_symmetric_with_unit_diagonal() {
    let data = Dataset::from_columns(vec![
        Column::from_f64("a", [1.0, 2.0, 3.0, 4.0]),
        Column::from_f64("b", [2.0, 4.1, 5.9, 8.2]),
        Column::from_f64("c", [4.0, 1.0, 3.0, 2.0]),
    ])
    .unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.heatmap", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("value_columns", vec!["a", "b", "c"]))
        .unwrap()
        .set_options(&Params::new().with("correlation", true))
        .unwrap();
    let art = plotter.plot().unwrap();
    let hm = art.axes.heatmap().unwrap();

    assert_eq!((hm.rows(), hm.cols()), (3, 3));
    assert_eq!((hm.vmin, hm.vmax), (-1.0, 1.0));
    for i in 0..3 {
        assert_eq!(hm.values[i][i], 1.0);
        for j in 0..3 {
            assert_eq!(hm.values[i][j], hm.values[j][i]);
        }
    }
    assert!(hm.values[0][1] > 0.99);
    let labels = hm.cell_labels.as_ref().unwrap();
    assert_eq!(labels[0][0].text, "1.00");
    assert_eq!(art.axes.colorbar.as_ref().unwrap().label, "Correlation");
}

#[test]
fn grouped_histogram_has_one_layer_per_group_on_shared_edges() {
    let data = sample::sample_dataset("statistical.histogram", 200).unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.histogram", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("value_column", "values"))
        .unwrap()
        .set_options(&Params::new().with("group_column", "group").with("bins", 12i64))
        .unwrap();
    let art = plotter.plot().unwrap();

    let layers: Vec<_> = art.axes.histograms().collect();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].edges, layers[1].edges);
    assert_eq!(layers[0].edges.len(), 13);
    let total: f64 = layers.iter().flat_map(|l| l.heights.iter()).sum();
    assert_eq!(total, 200.0);
    // no mean/median lines when grouped
    assert_eq!(art.axes.ref_lines().count(), 0);
}

#[test]
fn line_over_dates_uses_datetime_axis() {
    let data = sample::sample_dataset("temporal.line", 30).unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("temporal.line", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("x_column", "x").with("y_columns", vec!["y1", "y3"]))
        .unwrap();
    let art = plotter.plot().unwrap();

    assert_eq!(art.axes.x.kind, AxisKind::Datetime);
    let lines: Vec<_> = art.axes.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].label.as_deref(), Some("y3"));
    assert_eq!(lines[0].points.len(), 30);
    assert!(lines[0].points.windows(2).all(|w| w[1].0 - w[0].0 == 86_400.0));
}

#[test]
fn unknown_column_is_reported() {
    let data = sales();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.scatter", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("x_column", "q1").with("y_column", "missing"))
        .unwrap();
    let err = plotter.plot().unwrap_err();
    assert!(matches!(err, PlotError::UnknownColumn { ref column, .. } if column == "missing"));
}

#[test]
fn empty_dataset_fails_validation() {
    let data = Dataset::new();
    let config = PlotConfig::default();
    for (id, _) in PlotRegistry::global().all_plots() {
        let mut plotter = PlotRegistry::global().create_plot(id, &data, &config).unwrap();
        assert!(!plotter.validate_data(), "{id}");
        assert!(matches!(plotter.plot(), Err(PlotError::InvalidData { .. })), "{id}");
    }
}

#[test]
fn annotations_are_carried_onto_the_axes() {
    let data = sales();
    let mut config = PlotConfig::default();
    config.annotations.push(pubplot::Annotation::new("peak", (2.0, 9.0)));
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    let art = plotter.plot().unwrap();
    assert_eq!(art.axes.annotations.len(), 1);
    assert_eq!(art.axes.annotations[0].xytext, (2.0, 9.0));
    assert_eq!(art.axes.annotations[0].font_size, config.font_size - 2.0);
}

#[test]
fn two_column_line_defaults_to_a_single_series() {
    let data = Dataset::from_columns(vec![
        Column::from_f64("x", (1..=10).map(f64::from)),
        Column::from_f64("y", (0..10).map(f64::from)),
    ])
    .unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("temporal.line", &data, &config)
        .unwrap();
    let art = plotter.plot().unwrap();

    let lines: Vec<_> = art.axes.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].label.as_deref(), Some("y"));
    let expected: Vec<(f64, f64)> = (0..10).map(|i| (f64::from(i + 1), f64::from(i))).collect();
    assert_eq!(lines[0].points, expected);
}

#[test]
fn correlation_defaults_to_every_numeric_column() {
    let data = Dataset::from_columns(vec![
        Column::from_strs("id", ["r1", "r2", "r3", "r4", "r5"]),
        Column::from_f64("a", [1.0, 2.0, 3.0, 4.0, 5.0]),
        Column::from_f64("b", [5.0, 3.0, 4.0, 1.0, 2.0]),
        Column::from_f64("c", [2.0, 2.5, 1.0, 4.0, 3.0]),
    ])
    .unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.heatmap", &data, &config)
        .unwrap();
    plotter
        .set_options(&Params::new().with("correlation", true))
        .unwrap();
    let art = plotter.plot().unwrap();
    let hm = art.axes.heatmap().unwrap();

    assert_eq!((hm.rows(), hm.cols()), (3, 3));
    for i in 0..3 {
        assert!((hm.values[i][i] - 1.0).abs() < 1e-12);
        for j in 0..3 {
            assert!((hm.values[i][j] - hm.values[j][i]).abs() < 1e-12);
        }
    }
    assert!(hm.values[0][1] < 0.0);
}

#[test]
fn histogram_group_without_values_is_omitted() {
    let data = Dataset::from_columns(vec![
        Column::numeric("v", vec![Some(1.0), Some(2.0), Some(3.0), None, None]),
        Column::from_strs("g", ["a", "a", "b", "c", "c"]),
    ])
    .unwrap();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.histogram", &data, &config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("value_column", "v").with("group_column", "g"))
        .unwrap();
    let art = plotter.plot().unwrap();

    let labels: Vec<_> = art.axes.histograms().map(|h| h.label.clone().unwrap_or_default()).collect();
    assert_eq!(labels, ["a", "b"]);
}

#[test]
fn style_name_selects_panel_and_grid_colors() {
    let data = sales();
    let mut config = PlotConfig::default();
    config.style = "ggplot".into();
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    let art = plotter.plot().unwrap();
    let theme = Theme::named("ggplot").unwrap();
    assert_eq!(art.axes.theme, theme);
    assert_eq!(art.axes.grid.map(|g| g.color), Some(theme.grid));

    config.style = "no-such-style".into();
    let mut plotter = PlotRegistry::global()
        .create_plot("categorical.bar", &data, &config)
        .unwrap();
    assert_eq!(plotter.plot().unwrap().axes.theme, Theme::default());
}
