use pubplot::config::LegendLoc;
use pubplot::export::{render_png_rgba, render_svg};
use pubplot::plotter::Params;
use pubplot::{Artifact, ExportError, ExportFormat, Exporter, PlotConfig, PlotRegistry, sample};
use tempfile::tempdir;

fn small_config() -> PlotConfig {
    let mut config = PlotConfig::default();
    config.title = "Demo".into();
    config.dpi = 72;
    config
}

fn line_artifact(config: &PlotConfig) -> Artifact {
    let data = sample::sample_dataset("temporal.line", 20).unwrap();
    let mut plotter = PlotRegistry::global()
        .create_plot("temporal.line", &data, config)
        .unwrap();
    plotter
        .set_columns(&Params::new().with("x_column", "x").with("y_columns", vec!["y1", "y2"]))
        .unwrap();
    plotter.plot().unwrap()
}

#[test]
fn png_and_svg_are_written_under_the_stem() {
    let dir = tempdir().unwrap();
    let config = small_config();
    let art = line_artifact(&config);
    let exporter = Exporter::new(dir.path().join("out"));

    let png = exporter.export(&art, "trend", ExportFormat::Png, 72, false).unwrap();
    assert_eq!(png, dir.path().join("out").join("trend.png"));
    let img = image::open(&png).unwrap();
    assert_eq!((img.width(), img.height()), art.figure.pixel_size(72));

    let svg = exporter.export(&art, "trend", ExportFormat::Svg, 300, false).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.contains("<svg"));
    assert!(text.contains("Demo"));
}

#[test]
fn pdf_is_converted_and_eps_is_rejected() {
    let dir = tempdir().unwrap();
    let art = line_artifact(&small_config());
    let exporter = Exporter::new(dir.path());

    let pdf = exporter.export(&art, "trend", ExportFormat::Pdf, 300, false).unwrap();
    assert_eq!(pdf, dir.path().join("trend.pdf"));
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

    let err = exporter.export(&art, "x", ExportFormat::Eps, 300, false).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    assert!(!dir.path().join("x.eps").exists());
}

#[test]
fn oversized_rasters_are_refused() {
    let dir = tempdir().unwrap();
    let art = line_artifact(&small_config());
    let exporter = Exporter::new(dir.path());
    for dpi in [200_000, u32::MAX] {
        let err = exporter.export(&art, "big", ExportFormat::Png, dpi, false).unwrap_err();
        assert!(matches!(err, ExportError::TooLarge { .. }), "{dpi}: {err}");
    }
    assert!(render_png_rgba(&art, u32::MAX).is_err());
    assert!(!dir.path().join("big.png").exists());
}

#[test]
fn blank_stem_is_rejected() {
    let dir = tempdir().unwrap();
    let art = line_artifact(&small_config());
    let err = Exporter::new(dir.path())
        .export(&art, "  ", ExportFormat::Png, 72, false)
        .unwrap_err();
    assert!(matches!(err, ExportError::EmptyStem));
}

#[test]
fn transparent_png_has_clear_corners() {
    let art = line_artifact(&small_config());
    let img = render_png_rgba(&art, 72).unwrap();
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    assert!(img.pixels().any(|p| p.0[3] == 255));
}

#[test]
fn every_family_renders_with_outside_legends() {
    let mut config = small_config();
    for loc in [LegendLoc::OutsideRight, LegendLoc::OutsideBottom, LegendLoc::Best] {
        config.legend_loc = loc;
        for (id, _) in PlotRegistry::global().all_plots() {
            let data = sample::sample_dataset(id, 40).unwrap();
            let mut plotter = PlotRegistry::global().create_plot(id, &data, &config).unwrap();
            let art = plotter.plot().unwrap_or_else(|e| panic!("{id}: {e}"));
            let svg = render_svg(&art, true).unwrap();
            assert!(svg.contains("<svg"), "{id} at {loc}");
        }
    }
}

#[test]
fn styled_panel_is_filled_in_svg() {
    let mut config = small_config();
    config.style = "ggplot".into();
    let svg = render_svg(&line_artifact(&config), false).unwrap();
    assert!(svg.contains("#E5E5E5"));

    let plain = render_svg(&line_artifact(&small_config()), false).unwrap();
    assert!(!plain.contains("#E5E5E5"));
}
