use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("pubplot").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pubplot"));
}

#[test]
fn list_shows_categories_and_ids() {
    let mut cmd = Command::cargo_bin("pubplot").unwrap();
    cmd.arg("list");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("temporal"))
        .stdout(predicate::str::contains("statistical.heatmap"));
}

#[test]
fn info_prints_descriptor_json() {
    let out = Command::cargo_bin("pubplot")
        .unwrap()
        .args(["info", "statistical.scatter"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["name"], "Scatter Plot");
    assert_eq!(v["required_params"][1][0], "y_column");
}

#[test]
fn info_unknown_id_fails() {
    let mut cmd = Command::cargo_bin("pubplot").unwrap();
    cmd.args(["info", "temporal.nope"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown plot type"));
}

#[test]
fn sample_then_describe_then_plot() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("bars.csv");

    Command::cargo_bin("pubplot")
        .unwrap()
        .args(["sample", "bar", "--out"])
        .arg(&csv)
        .assert()
        .success();
    assert!(csv.exists());

    Command::cargo_bin("pubplot")
        .unwrap()
        .args(["describe", "--data"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("10 rows, 4 columns"))
        .stdout(predicate::str::contains("value2  count=10"));

    let out_dir = dir.path().join("figs");
    Command::cargo_bin("pubplot")
        .unwrap()
        .args([
            "plot",
            "--plot",
            "categorical.bar",
            "--param",
            "x_column=category",
            "--param",
            "y_columns=value1,value2",
            "--param",
            "stacked=true",
            "--preset",
            "ieee",
            "--dpi",
            "72",
            "--name",
            "stack",
            "--data",
        ])
        .arg(&csv)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();
    assert!(out_dir.join("stack.png").exists());
}

#[test]
fn plot_writes_pdf_and_rejects_eps_and_bad_params() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("d.csv");
    std::fs::write(&csv, "x,y\n1,2\n2,4\n3,5\n").unwrap();

    Command::cargo_bin("pubplot")
        .unwrap()
        .args(["plot", "--plot", "statistical.scatter", "--format", "pdf", "--data"])
        .arg(&csv)
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .success();
    assert!(dir.path().join("statistical_scatter.pdf").exists());

    Command::cargo_bin("pubplot")
        .unwrap()
        .args(["plot", "--plot", "statistical.scatter", "--format", "eps", "--data"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("eps"));

    Command::cargo_bin("pubplot")
        .unwrap()
        .args(["plot", "--plot", "statistical.histogram", "--param", "bins=many", "--data"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bins"));
}

#[test]
fn palettes_lists_groups() {
    let mut cmd = Command::cargo_bin("pubplot").unwrap();
    cmd.arg("palettes");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Colorblind Safe: default, tol, okabe_ito"));
}
