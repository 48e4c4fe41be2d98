use pubplot::config::{DEFAULT_DPI, DOUBLE_COLUMN_SIZE};
use pubplot::palette::{self, Colormap};
use pubplot::{LegendLoc, PlotConfig, StylePreset};
use tempfile::tempdir;

#[test]
fn presets_set_journal_dimensions() {
    let mut cfg = PlotConfig::default();
    cfg.title = "kept".into();
    cfg.apply_preset("nature".parse::<StylePreset>().unwrap());
    assert_eq!(cfg.figsize, (3.5, 3.5));
    assert_eq!(cfg.font_size, 8.0);
    assert!(!cfg.grid);
    assert_eq!(cfg.title, "kept");

    cfg.apply_preset(StylePreset::Minimal);
    assert_eq!(cfg.dpi, 150);
    assert!(!cfg.legend);
    assert!("acm".parse::<StylePreset>().is_err());
}

#[test]
fn config_round_trips_through_json() {
    let dir = tempdir().unwrap();
    let mut cfg = PlotConfig::default();
    cfg.figsize = DOUBLE_COLUMN_SIZE;
    cfg.legend_loc = LegendLoc::OutsideRight;
    cfg.use_palette("okabe_ito", None);
    let path = cfg.save_json(dir.path().join("cfg.json")).unwrap();

    let back = PlotConfig::from_json_file(&path).unwrap();
    assert_eq!(back, cfg);
    assert_eq!(back.to_map()["legend_loc"], "outside right");
    assert_eq!(back.dpi, DEFAULT_DPI);
}

#[test]
fn named_palettes_resolve_and_resample() {
    let native = palette::get_palette("okabe_ito", None);
    assert_eq!(native.len(), 7);
    assert_eq!(native[0], "#E69F00");

    let resampled = palette::get_palette("viridis", Some(4));
    assert_eq!(resampled.len(), 4);
    assert_eq!(resampled[0], "#440154");

    // unknown names fall back to the default palette
    assert_eq!(palette::get_palette("no-such", None), palette::get_palette("default", None));
}

#[test]
fn palette_groups_are_listed_in_order() {
    let groups = palette::palette_groups();
    assert_eq!(groups[0].0, "Colorblind Safe");
    assert!(groups.iter().any(|(_, names)| names.contains(&"tab10")));
    assert_eq!(groups.iter().map(|(_, n)| n.len()).sum::<usize>(), 23);
}

#[test]
fn colormap_clamps_out_of_range_values() {
    let cmap = Colormap::named("viridis");
    assert_eq!(cmap.map(-5.0, 0.0, 1.0), cmap.at(0.0));
    assert_eq!(cmap.map(5.0, 0.0, 1.0), cmap.at(1.0));
}

#[test]
fn native_length_returns_the_stored_list() {
    let stored = palette::get_palette("tol", None);
    assert_eq!(palette::get_palette("tol", Some(stored.len())), stored);
    assert_eq!(palette::get_palette("tol", Some(0)), stored);
}

#[test]
fn resampled_palettes_are_distinct_and_stable() {
    for (name, n) in [("viridis", 12), ("okabe_ito", 15), ("default", 3)] {
        let first = palette::get_palette(name, Some(n));
        assert_eq!(first.len(), n);
        assert_eq!(first, palette::get_palette(name, Some(n)), "{name}");
        for (i, a) in first.iter().enumerate() {
            assert!(first[i + 1..].iter().all(|b| b != a), "{name}: {a} repeats");
        }
    }
}
