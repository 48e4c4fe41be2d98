use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use serde_json::{Map, Value};

use crate::config::ALLOWED_DATA_FORMATS;
use crate::dataset::{Column, Dataset};
use crate::error::DatasetError;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Load a CSV or JSON file, chosen by extension.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        _ => Err(DatasetError::UnsupportedFormat(format!(
            "`.{ext}` (supported: {})",
            ALLOWED_DATA_FORMATS.join(", ")
        ))),
    }
}

/// Load a CSV with a header row. Column types are inferred from the cells:
/// numeric if every non-empty cell parses as a number, else datetime if every
/// one parses as a date or timestamp, else categorical. Short rows are padded
/// with nulls.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            log::debug!(
                "csv row {}: {} field(s) for {} column(s)",
                row + 1,
                record.len(),
                headers.len()
            );
        }
        for (i, col) in cells.iter_mut().enumerate() {
            let cell = record.get(i).filter(|s| !s.is_empty()).map(str::to_string);
            col.push(cell);
        }
    }
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();
    Dataset::from_columns(columns)
}

/// Load a JSON array of flat objects. Keys become columns in order of first
/// appearance; missing keys are nulls.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(records) = value else {
        return Err(DatasetError::JsonShape);
    };
    let mut names: Vec<String> = Vec::new();
    for record in &records {
        let Value::Object(obj) = record else {
            return Err(DatasetError::JsonShape);
        };
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    let columns = names
        .into_iter()
        .map(|name| {
            let raw = records
                .iter()
                .map(|r| match r.get(&name) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) if s.is_empty() => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                })
                .collect();
            infer_column(name, raw)
        })
        .collect();
    Dataset::from_columns(columns)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let present = || raw.iter().flatten();
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return Column::numeric(
            name,
            raw.iter().map(|c| c.as_deref().and_then(|s| s.parse().ok())).collect(),
        );
    }
    if present().all(|s| parse_datetime(s).is_some()) {
        return Column::datetime(
            name,
            raw.iter().map(|c| c.as_deref().and_then(parse_datetime)).collect(),
        );
    }
    Column::categorical(name, raw)
}

/// Spreadsheet applications evaluate cells starting with these characters.
fn neutralize_formula(cell: String) -> String {
    if cell.starts_with(['=', '+', '-', '@', '\t', '\r']) && cell.parse::<f64>().is_err() {
        format!("'{cell}")
    } else {
        cell
    }
}

/// Save a dataset as CSV with header. Text cells that a spreadsheet would
/// treat as a formula are prefixed with `'`.
pub fn save_csv<P: AsRef<Path>>(data: &Dataset, path: P) -> Result<(), DatasetError> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(data.column_names())?;
    for row in 0..data.row_count() {
        let record: Vec<String> = data
            .columns()
            .iter()
            .map(|c| c.display_at(row).map(neutralize_formula).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a dataset as a pretty JSON array of row objects.
pub fn save_json<P: AsRef<Path>>(data: &Dataset, path: P) -> Result<(), DatasetError> {
    let rows: Vec<Value> = (0..data.row_count())
        .map(|row| {
            let obj: Map<String, Value> = data
                .columns()
                .iter()
                .map(|c| {
                    let value = match (c.display_at(row), data.is_numeric(&c.name)) {
                        (None, _) => Value::Null,
                        (Some(s), true) => s.parse::<f64>().map_or(Value::String(s), Value::from),
                        (Some(s), false) => Value::String(s),
                    };
                    (c.name.clone(), value)
                })
                .collect();
            Value::Object(obj)
        })
        .collect();
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use tempfile::tempdir;

    #[test]
    fn infers_column_kinds() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("x.csv");
        std::fs::write(&p, "d,v,g\n2024-01-01,1.5,a\n2024-01-02,,b\n2024-01-03,3,\n").unwrap();
        let ds = load_csv(&p).unwrap();
        assert_eq!(ds.kind("d"), Some(ColumnKind::Datetime));
        assert_eq!(ds.kind("v"), Some(ColumnKind::Numeric));
        assert_eq!(ds.kind("g"), Some(ColumnKind::Categorical));
        assert_eq!(ds.numeric_values("v").unwrap(), vec![Some(1.5), None, Some(3.0)]);
    }

    #[test]
    fn formulas_are_neutralized() {
        assert_eq!(neutralize_formula("=SUM(A1)".into()), "'=SUM(A1)");
        assert_eq!(neutralize_formula("-3.5".into()), "-3.5");
        assert_eq!(neutralize_formula("plain".into()), "plain");
    }
}
