//! Error types for datasets, plot pipelines, and exports.
//!
//! Everything here is recoverable at the call site: an unknown plot id is not
//! an error at all (the registry returns `None`), and a failed chart or export
//! never takes the process down.

use std::path::PathBuf;
use thiserror::Error;

use crate::plotter::ParamKind;

/// Errors raised while building or loading a [`Dataset`](crate::dataset::Dataset).
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("column `{name}` has {got} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),
    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("JSON data must be an array of objects")]
    JsonShape,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by the plot pipeline (`validate → create → style → annotate`).
#[derive(Debug, Error)]
pub enum PlotError {
    /// The dataset does not have the minimum shape the chart needs.
    #[error("Invalid data for {plot}")]
    InvalidData { plot: &'static str },
    #[error("{plot}: unknown column `{column}`")]
    UnknownColumn { plot: &'static str, column: String },
    #[error("{plot}: column `{column}` is not numeric")]
    NotNumeric { plot: &'static str, column: String },
    #[error("{plot}: no numeric values to plot")]
    NoNumericData { plot: &'static str },
    #[error("{plot}: missing required parameter `{param}`")]
    MissingParam { plot: &'static str, param: String },
    #[error("{plot}: parameter `{param}` expects {expected}")]
    ParamKind {
        plot: &'static str,
        param: String,
        expected: ParamKind,
    },
    #[error("{plot}: invalid value for `{param}`: {reason}")]
    InvalidOption {
        plot: &'static str,
        param: String,
        reason: String,
    },
}

/// Errors raised while writing an artifact to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("export file name must not be empty")]
    EmptyStem,
    #[error("{width}x{height} pixels at {dpi} dpi exceeds the raster size limit")]
    TooLarge { width: u32, height: u32, dpi: u32 },
    #[error("failed to render figure: {0}")]
    Render(#[source] anyhow::Error),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
