//! Tabular input: named, typed, null-aware columns.
//!
//! A [`Dataset`] is what the chart families read from. It is never mutated by
//! the plotting core; loaders in [`crate::storage`] and [`crate::sample`] build
//! it, the caller owns it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::DatasetError;

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Datetime,
    Categorical,
}

/// Column storage. Every cell is optional (null-aware).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Datetime(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Datetime(_) => ColumnKind::Datetime,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none_or(f64::is_nan)).count(),
            ColumnData::Datetime(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// A single named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Convenience for fully populated numeric columns.
    pub fn from_f64(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::numeric(name, values.into_iter().map(Some).collect())
    }

    pub fn datetime(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Datetime(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Convenience for fully populated categorical columns.
    pub fn from_strs<S: AsRef<str>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::categorical(
            name,
            values
                .into_iter()
                .map(|s| Some(s.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    /// Cell rendered as text (`None` for nulls). Used for tick labels and group keys.
    pub fn display_at(&self, row: usize) -> Option<String> {
        match &self.data {
            ColumnData::Numeric(v) => v.get(row).copied().flatten().filter(|x| !x.is_nan()).map(fmt_number),
            ColumnData::Datetime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
            ColumnData::Categorical(v) => v.get(row).cloned().flatten(),
        }
    }
}

/// Format a number the way it appears in labels: integers without a trailing `.0`.
pub(crate) fn fmt_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// Per-column summary returned by [`Dataset::column_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: ColumnKind,
    pub nunique: usize,
    pub null_count: usize,
    pub is_numeric: bool,
    pub is_datetime: bool,
    pub is_categorical: bool,
}

/// Ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Empty dataset (zero columns, zero rows).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from columns, checking equal lengths and unique names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut ds = Self::new();
        for c in columns {
            ds.push_column(c)?;
        }
        Ok(ds)
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(DatasetError::DuplicateColumn(column.name));
        }
        if let Some(first) = self.columns.first() {
            let expected = first.data.len();
            if column.data.len() != expected {
                return Err(DatasetError::LengthMismatch {
                    name: column.name,
                    expected,
                    got: column.data.len(),
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    /// True when there are no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(Column::kind)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.kind(name) == Some(ColumnKind::Numeric)
    }

    /// Names of numeric columns, in column order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Numeric cells of a column (`None` if absent or not numeric). NaN cells read as null.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        match &self.column(name)?.data {
            ColumnData::Numeric(v) => Some(v.iter().map(|x| x.filter(|x| !x.is_nan())).collect()),
            _ => None,
        }
    }

    /// Non-null numeric values of a column (`dropna`).
    pub fn numeric_non_null(&self, name: &str) -> Option<Vec<f64>> {
        self.numeric_values(name)
            .map(|v| v.into_iter().flatten().collect())
    }

    /// Text projection of a column, nulls kept as `None`.
    pub fn display_values(&self, name: &str) -> Option<Vec<Option<String>>> {
        let col = self.column(name)?;
        Some((0..col.data.len()).map(|i| col.display_at(i)).collect())
    }

    /// Distinct non-null values of a column in order of first appearance.
    pub fn unique_values(&self, name: &str) -> Option<Vec<String>> {
        let values = self.display_values(name)?;
        let mut seen = BTreeSet::new();
        Some(
            values
                .into_iter()
                .flatten()
                .filter(|v| seen.insert(v.clone()))
                .collect(),
        )
    }

    /// dtype / uniqueness / null statistics per column.
    pub fn column_info(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .map(|c| {
                let kind = c.kind();
                let nunique = self
                    .unique_values(&c.name)
                    .map_or(0, |u| u.len());
                ColumnInfo {
                    name: c.name.clone(),
                    dtype: kind,
                    nunique,
                    null_count: c.data.null_count(),
                    is_numeric: kind == ColumnKind::Numeric,
                    is_datetime: kind == ColumnKind::Datetime,
                    is_categorical: kind == ColumnKind::Categorical,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::from_columns(vec![
            Column::from_f64("a", [1.0, 2.0]),
            Column::from_f64("b", [1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { .. }));
    }

    #[test]
    fn unique_values_keep_first_appearance_order() {
        let ds = Dataset::from_columns(vec![Column::categorical(
            "g",
            vec![Some("b".into()), None, Some("a".into()), Some("b".into())],
        )])
        .unwrap();
        assert_eq!(ds.unique_values("g").unwrap(), vec!["b", "a"]);
        assert_eq!(ds.column_info()[0].null_count, 1);
    }

    #[test]
    fn nan_reads_as_null() {
        let ds = Dataset::from_columns(vec![Column::from_f64("x", [1.0, f64::NAN])]).unwrap();
        assert_eq!(ds.numeric_non_null("x").unwrap(), vec![1.0]);
    }
}
