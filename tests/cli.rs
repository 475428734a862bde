use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE_CSV: &str = "\
Level,Department_Code,Department_Name,Agency_Code,Agency_Name,Sub_Agency_Code,Sub_Agency_Name,House,Increase,Decrease,Net,Senate
Summary,,TOTAL_NEW_APPROPRIATIONS,,,,,5000,300,-100,200,5200
Department,01,Health,,,,,1000,50,0,50,1050
Agency,01,Health,01A,Hospitals,,,600,20,0,20,620
Department,02,Education,,,,,3000,0,-40,-40,2960
Sub-Agency,03,Public Works,03A,Highways,03A1,Regional Office,10,0,0,0,10
";

/// A command isolated from the user's settings file and terminal colors.
fn budgetview(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("budgetview").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("BUDGETVIEW_SOURCE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_sample(dir: &Path) -> String {
    let path = dir.join("budget.csv");
    std::fs::write(&path, SAMPLE_CSV).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_table_prints_tree() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["table", "--source", &csv])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amounts in Thousand Pesos"))
        .stdout(predicate::str::contains("Hospitals"))
        .stdout(predicate::str::contains("Regional Office"))
        .stdout(predicate::str::contains("5,200"));
}

#[test]
fn test_table_search_narrows_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["table", "--source", &csv, "--search", "hea"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Health"))
        .stdout(predicate::str::contains("Education").not());
}

#[test]
fn test_source_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .env("BUDGETVIEW_SOURCE", &csv)
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TOTAL_NEW_APPROPRIATIONS row"))
        .stdout(predicate::str::contains("Sub-Agency"));
}

#[test]
fn test_unknown_level_fails() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["table", "--source", &csv, "--level", "Ministry"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Unknown level: Ministry"));
}

#[test]
fn test_missing_source_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    budgetview(dir.path())
        .args(["table", "--source", missing.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rows match."))
        .stderr(predicate::str::contains("Could not load"));
}

#[test]
fn test_export_json_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    let out = dir.path().join("out").join("depts.json");
    budgetview(dir.path())
        .args([
            "export",
            "--source",
            &csv,
            "--level",
            "Department",
            "--sort",
            "senate",
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 rows)"));

    let text = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["Department_Name"], "Education");
    assert_eq!(value[1]["Department_Name"], "Health");
}

#[test]
fn test_export_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["export", "--source", &csv, "--format", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn test_chart_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["chart", "--source", &csv, "--top", "1", "--text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 1 Department rows by Senate"))
        .stdout(predicate::str::contains("Education"))
        .stdout(predicate::str::contains("Others"));
}

#[test]
fn test_check_reports_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    // Education: 2960 - 3000 = -40 matches; bump Net to break it.
    let broken = std::fs::read_to_string(&csv)
        .unwrap()
        .replace("3000,0,-40,-40,2960", "3000,0,-40,-10,2960");
    std::fs::write(&csv, broken).unwrap();
    budgetview(dir.path())
        .args(["check", "--source", &csv])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 5 rows"))
        .stdout(predicate::str::contains("Education"));
}

#[test]
fn test_convert_and_compare() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("report.json");
    std::fs::write(
        &json,
        r#"{"COMMITTEE_REPORT": {
            "unit": "Thousand Pesos",
            "DEPARTMENTS": [
              {"code": "01", "name": "Health", "house": 1000, "senate": 1200,
               "agencies": [{"code": "01.A", "name": "Hospitals",
                             "house": 600, "increase": 20, "net": 20, "senate": 620}]}
            ]
        }}"#,
    )
    .unwrap();
    budgetview(dir.path())
        .args(["convert", json.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 rows from COMMITTEE_REPORT"));

    let converted = dir.path().join("report.csv");
    assert!(converted.exists());
    let old = write_sample(dir.path());
    budgetview(dir.path())
        .args(["compare", &old, converted.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 added, 3 removed, 1 changed, 1 unchanged"));
}

#[test]
fn test_load_saves_default_source() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    budgetview(dir.path())
        .args(["load", &csv])
        .assert()
        .success()
        .stdout(predicate::str::contains("(5 rows)"));

    let settings = dir.path().join(".config").join("budgetview").join("settings.json");
    assert!(settings.exists());

    budgetview(dir.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:       5"));
}
