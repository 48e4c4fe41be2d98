//! pubplot
//!
//! Turn tabular data into publication-quality charts through a registry of
//! plot types. Pairs with the `pubplot` CLI.
//!
//! ### Features
//! - Six chart families (line, bar, scatter, histogram, box, heatmap) behind
//!   one contract and a string-keyed registry (`"<category>.<name>"`)
//! - A shared [`PlotConfig`] with journal presets (IEEE, Nature, Science)
//! - Named color palettes with gradient resampling
//! - PNG (optionally transparent) and SVG export through `plotters`
//! - CSV/JSON loading with column type inference
//!
//! ### Example
//! ```no_run
//! use pubplot::{Dataset, ExportFormat, Exporter, Params, PlotConfig, PlotRegistry};
//!
//! let data = pubplot::storage::load_csv("measurements.csv")?;
//! let mut config = PlotConfig::default();
//! config.title = "Temperature".into();
//!
//! let mut plotter = PlotRegistry::global()
//!     .create_plot("temporal.line", &data, &config)
//!     .expect("built-in plot");
//! plotter.set_columns(&Params::new().with("x_column", "time").with("y_columns", "temp"))?;
//! let artifact = plotter.plot()?;
//! Exporter::new("exports").export(&artifact, "temperature", ExportFormat::Png, 300, false)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod figure;
pub mod palette;
pub mod plotter;
pub mod registry;
pub mod render;
pub mod sample;
pub mod stats;
pub mod storage;

pub use config::{Annotation, LegendLoc, PlotConfig, StylePreset};
pub use dataset::{Column, ColumnData, ColumnKind, Dataset};
pub use error::{DatasetError, ExportError, PlotError};
pub use export::{ExportFormat, Exporter};
pub use figure::{Artifact, Axes, Element, Figure};
pub use plotter::{Chart, ChartKind, ChartType, ParamKind, ParamValue, Params, Plotter, PlotterDescriptor};
pub use registry::{DiscoveryReport, PlotInfo, PlotRegistry};
