//! Loading measurement files end to end.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use ckpi_core::{CkpiError, KpiName, Label};
use ckpi_ingest::{load_measurements, FilterSelection};

const CSV: &str = "\
CKPI_Statistics_Date,AVE,CKPI,Floor,EQ
03/04/2024,40.0,doorfriction,1,EQ1
04/04/2024,55.0,doorfriction,1,EQ1
05/04/2024,,doorfriction,1,EQ1
06/04/2024 10:30,0.4,lockHookTime,2,EQ1
not-a-date,0.4,lockHookTime,2,EQ1
07/04/2024,12.0,doorfriction,3,EQ9
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn csv_rows_become_measurements() {
    let dir = TempDir::new().unwrap();
    let out = load_measurements(&write(&dir, "kpi.csv", CSV)).unwrap();

    assert_eq!(out.measurements.len(), 5);
    assert_eq!(out.dropped_rows, 1);
    assert_eq!(out.unparsed_dates, 1);

    let first = &out.measurements[0];
    assert_eq!(first.timestamp.date(), NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    assert_eq!(first.kpi, KpiName::new("DoorFriction"));
    assert_eq!(first.floor, Label::Int(1));
    assert_eq!(out.measurements[2].ave, None);
}

#[test]
fn unknown_extension_reads_as_csv() {
    let dir = TempDir::new().unwrap();
    let out = load_measurements(&write(&dir, "kpi.txt", CSV)).unwrap();
    assert_eq!(out.measurements.len(), 5);
}

#[test]
fn json_records_load() {
    let dir = TempDir::new().unwrap();
    let json = r#"[
        {"ckpi_statistics_date": "01/02/2024", "ave": 0.3, "ckpi": "lockHookTime", "floor": 4, "eq": "EQ2"},
        {"ckpi_statistics_date": "02/02/2024", "ave": "0.5", "ckpi": "lockHookTime", "floor": 4.0, "eq": "EQ2"}
    ]"#;
    let out = load_measurements(&write(&dir, "kpi.json", json)).unwrap();
    assert_eq!(out.measurements.len(), 2);
    assert!(out.measurements.iter().all(|m| m.floor == Label::Int(4)));
    assert_eq!(out.measurements[1].ave, Some(0.5));
    assert_eq!(out.measurements[1].timestamp.date(), NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
}

#[test]
fn missing_floor_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "kpi.csv", "ckpi_statistics_date,ave,ckpi,eq\n03/04/2024,1,a,EQ1\n");
    let err = load_measurements(&path).unwrap_err();
    assert!(matches!(err, CkpiError::MissingColumn(ref c) if c == "floor"));
}

#[test]
fn no_parsable_dates_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "kpi.csv", "ckpi_statistics_date,ave,ckpi,floor,eq\nsoon,1,a,1,EQ1\nlater,2,a,1,EQ1\n");
    assert!(matches!(load_measurements(&path), Err(CkpiError::NoParsableDates)));
}

#[test]
fn header_only_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "kpi.csv", "ckpi_statistics_date,ave,ckpi,floor,eq\n");
    assert!(matches!(load_measurements(&path), Err(CkpiError::EmptyInput)));
}

#[test]
fn spreadsheets_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "kpi.xlsx", "PK");
    assert!(matches!(load_measurements(&path), Err(CkpiError::UnsupportedFormat(_))));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_measurements(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, CkpiError::Io(_)));
}

#[test]
fn default_filter_keeps_first_two_floors_and_equipment() {
    let dir = TempDir::new().unwrap();
    let out = load_measurements(&write(&dir, "kpi.csv", CSV)).unwrap();
    let selection = FilterSelection::defaults_for(
        &out.measurements,
        vec![KpiName::new("doorfriction"), KpiName::new("lockhooktime")],
    );
    assert_eq!(selection.floors, vec![Label::Int(1), Label::Int(2)]);

    let kept = selection.apply(&out.measurements);
    // Floor 3 / EQ9 falls outside the default choice.
    assert_eq!(kept.len(), 4);
}
