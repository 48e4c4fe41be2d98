use std::fs;

use pubplot::storage;
use pubplot::{Column, ColumnKind, Dataset, DatasetError};
use tempfile::tempdir;

fn sample() -> Dataset {
    Dataset::from_columns(vec![
        Column::from_strs("label", ["a", "b", "c"]),
        Column::numeric("value", vec![Some(1.5), None, Some(-2.0)]),
    ])
    .unwrap()
}

#[test]
fn save_csv_and_json() {
    let dir = tempdir().unwrap();
    let rows = sample();

    let csv_path = dir.path().join("out.csv");
    storage::save_csv(&rows, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("label,value"));
    assert_eq!(csv_txt.lines().count(), 1 + rows.row_count());

    let json_path = dir.path().join("out.json");
    storage::save_json(&rows, &json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["value"], 1.5);
    assert!(arr[1]["value"].is_null());
}

#[test]
fn csv_round_trip_keeps_kinds_and_nulls() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rt.csv");
    storage::save_csv(&sample(), &path).unwrap();
    let back = storage::load_file(&path).unwrap();
    assert_eq!(back.kind("label"), Some(ColumnKind::Categorical));
    assert_eq!(back.numeric_values("value").unwrap(), vec![Some(1.5), None, Some(-2.0)]);
}

//test if the CSV file is save and won't include executable formulas
//spreadsheets evaluate cells starting with = + - @, so text cells are prefixed with a quote
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let dir = tempdir().unwrap();
    let data = Dataset::from_columns(vec![
        Column::from_strs("name", ["=HYPERLINK(\"http://evil\")", "+SUM(A1:A9)", "@foo", "plain"]),
        Column::from_f64("n", [-1.0, 2.0, 3.0, 4.0]),
    ])
    .unwrap();
    let path = dir.path().join("inj.csv");
    storage::save_csv(&data, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[0][0], "'=HYPERLINK(\"http://evil\")");
    assert_eq!(&rows[1][0], "'+SUM(A1:A9)");
    assert_eq!(&rows[2][0], "'@foo");
    assert_eq!(&rows[3][0], "plain");
    // negative numbers stay numbers
    assert_eq!(&rows[0][1], "-1");
}

#[test]
fn json_records_become_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("in.json");
    fs::write(
        &path,
        r#"[{"t":"2024-03-01","v":1,"g":"x"},{"t":"2024-03-02","g":"y"},{"t":"2024-03-03","v":2.5,"g":null}]"#,
    )
    .unwrap();
    let ds = storage::load_json(&path).unwrap();
    assert_eq!(ds.column_names(), ["t", "v", "g"]);
    assert_eq!(ds.kind("t"), Some(ColumnKind::Datetime));
    assert_eq!(ds.numeric_values("v").unwrap(), vec![Some(1.0), None, Some(2.5)]);
    assert_eq!(ds.column_info()[2].null_count, 1);
}

#[test]
fn bad_inputs_are_typed_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    assert!(matches!(storage::load_file(&missing), Err(DatasetError::NotFound(_))));

    let xlsx = dir.path().join("data.xlsx");
    fs::write(&xlsx, "x").unwrap();
    assert!(matches!(storage::load_file(&xlsx), Err(DatasetError::UnsupportedFormat(_))));

    let obj = dir.path().join("obj.json");
    fs::write(&obj, r#"{"a":[1,2]}"#).unwrap();
    assert!(matches!(storage::load_file(&obj), Err(DatasetError::JsonShape)));
}
