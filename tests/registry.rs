use pubplot::plotter::{ChartType, ParamKind, ParamValue, Params};
use pubplot::{Dataset, PlotConfig, PlotRegistry};

fn dummy_params(schema: &[(&str, ParamKind)]) -> Params {
    let mut p = Params::new();
    for (key, kind) in schema {
        let v = match kind {
            ParamKind::String => ParamValue::Str("a".into()),
            ParamKind::StringList => ParamValue::List(vec!["a".into(), "b".into()]),
            ParamKind::Bool => ParamValue::Bool(true),
            ParamKind::Int => ParamValue::Int(3),
            ParamKind::Float => ParamValue::Float(0.5),
        };
        p.insert(key, v);
    }
    p
}

#[test]
fn builtins_are_registered_under_category_ids() {
    let r = PlotRegistry::with_builtins();
    let ids: Vec<&str> = r.all_plots().into_iter().map(|(id, _)| id).collect();
    assert_eq!(
        ids,
        [
            "temporal.line",
            "categorical.bar",
            "statistical.scatter",
            "statistical.histogram",
            "statistical.boxplot",
            "statistical.heatmap",
        ]
    );
    assert_eq!(r.get("statistical.boxplot"), Some(ChartType::Box));
    assert_eq!(r.len(), 6);
}

#[test]
fn every_descriptor_accepts_its_own_required_params() {
    let data = Dataset::new();
    let config = PlotConfig::default();
    let r = PlotRegistry::global();
    for (id, _) in r.all_plots() {
        let mut plotter = r.create_plot(id, &data, &config).unwrap();
        let required = dummy_params(plotter.required_params());
        plotter
            .set_columns(&required)
            .unwrap_or_else(|e| panic!("{id}: {e}"));
        let optional = dummy_params(
            &plotter
                .optional_params()
                .iter()
                .filter(|(k, _)| !matches!(*k, "orientation" | "stat" | "fmt" | "marker_style" | "markers" | "line_styles" | "cmap"))
                .copied()
                .collect::<Vec<_>>(),
        );
        plotter
            .set_options(&optional)
            .unwrap_or_else(|e| panic!("{id}: {e}"));
    }
}

#[test]
fn missing_required_param_is_an_error() {
    let data = Dataset::new();
    let config = PlotConfig::default();
    let mut plotter = PlotRegistry::global()
        .create_plot("statistical.scatter", &data, &config)
        .unwrap();
    assert!(plotter.set_columns(&Params::new().with("x_column", "a")).is_err());
}

#[test]
fn unknown_id_yields_none() {
    let data = Dataset::new();
    let config = PlotConfig::default();
    let r = PlotRegistry::global();
    assert!(r.create_plot("temporal.nope", &data, &config).is_none());
    assert!(r.plot_info("nope").is_none());
    assert!(!r.contains("line"));
}

#[test]
fn discovery_is_idempotent() {
    let mut r = PlotRegistry::with_builtins();
    let report = r.discover();
    assert!(report.registered.is_empty());
    assert_eq!(report.skipped.len(), 6);
    assert!(report.collisions.is_empty());
    assert_eq!(r.len(), 6);
    assert_eq!(r.plots_in_category("temporal").len(), 1);
}

#[test]
fn discovery_keeps_existing_binding_on_collision() {
    let mut r = PlotRegistry::new();
    let id = r.register("temporal", Some("line"), ChartType::Bar);
    assert_eq!(id, "temporal.line");

    let report = r.discover();
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].id, "temporal.line");
    assert_eq!(report.collisions[0].existing, ChartType::Bar);
    assert_eq!(report.collisions[0].rejected, ChartType::Line);
    assert_eq!(r.get("temporal.line"), Some(ChartType::Bar));
    assert_eq!(report.registered.len(), 5);
}

#[test]
fn register_derives_name_from_type() {
    let mut r = PlotRegistry::new();
    assert_eq!(r.register("Custom", None, ChartType::Heatmap), "custom.heatmap");
    assert_eq!(r.categories(), ["custom"]);
}

#[test]
fn plot_info_reports_registered_category() {
    let mut r = PlotRegistry::new();
    r.register("mine", Some("hist"), ChartType::Histogram);
    let info = r.plot_info("mine.hist").unwrap();
    assert_eq!(info.category, "mine");
    assert_eq!(info.name, "Histogram");
    assert_eq!(info.required_params[0].0, "value_column");

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["id"], "mine.hist");
}
