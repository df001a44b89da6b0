use std::fs::File;
use std::io::Write;

use glucose_config::{ReadingRow, load_readings_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("readings.csv");
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    (dir, path)
}

#[rstest]
fn loads_minimal_three_column_history() {
    let (_dir, path) = write_csv(&[
        "timestamp,value,sensor",
        "1700000000000,112,libre2",
        "1700000060000,113.5,libre2",
    ]);
    let rows = load_readings_csv(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1],
        ReadingRow {
            timestamp: 1_700_000_060_000,
            value: 113.5,
            sensor: "libre2".to_string(),
            filled_gap: false,
            nightscout_id: None,
        }
    );
}

#[rstest]
fn optional_columns_are_parsed_and_blank_ids_dropped() {
    let (_dir, path) = write_csv(&[
        "timestamp,value,sensor,filled_gap,nightscout_id",
        "1700000000000,112,dexcom_g6,false,abc123",
        "1700000300000,115,dexcom_g6,true,",
    ]);
    let rows = load_readings_csv(&path).unwrap();
    assert_eq!(rows[0].nightscout_id.as_deref(), Some("abc123"));
    assert!(rows[1].filled_gap);
    assert_eq!(rows[1].nightscout_id, None);
}

#[rstest]
#[case("timestamp,value")]
#[case("time,value,sensor")]
#[case("timestamp,value,sensor,nightscout_id")]
#[case("timestamp,value,sensor,filled_gap,nightscout_id,extra")]
fn rejects_unexpected_headers(#[case] header: &str) {
    let (_dir, path) = write_csv(&[header, "1700000000000,112,libre2"]);
    let err = load_readings_csv(&path).unwrap_err();
    assert!(
        err.to_string().contains("readings CSV must have headers"),
        "unexpected error: {err}"
    );
}

#[rstest]
fn reports_row_number_of_bad_value() {
    let (_dir, path) = write_csv(&[
        "timestamp,value,sensor",
        "1700000000000,112,libre2",
        "1700000060000,high,libre2",
    ]);
    let err = load_readings_csv(&path).unwrap_err();
    assert!(err.to_string().contains("invalid CSV row 3"), "{err}");
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_readings_csv(&dir.path().join("nope.csv")).unwrap_err();
    assert!(err.to_string().contains("open readings CSV"));
}
