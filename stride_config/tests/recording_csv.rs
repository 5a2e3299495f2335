use std::fs::File;
use std::io::Write;

use rstest::rstest;
use stride_config::{RecordingRow, load_recording_csv};
use tempfile::tempdir;

fn write_csv(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("rec.csv");
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[rstest]
fn loads_rows_in_order() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        &dir,
        "timestamp_ns,x,y,z\n0,0.1,0.2,9.8\n20000000,0.0,0.0,9.81\n20000000,1.5,-0.5,11.0\n",
    );
    let rows = load_recording_csv(&path).expect("load");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        RecordingRow {
            timestamp_ns: 0,
            x: 0.1,
            y: 0.2,
            z: 9.8
        }
    );
    // Equal timestamps are allowed; only going backwards is rejected.
    assert_eq!(rows[1].timestamp_ns, rows[2].timestamp_ns);
}

#[rstest]
fn tolerates_whitespace_around_fields() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "timestamp_ns, x, y, z\n 5 , 1.0 , 2.0 , 3.0\n");
    let rows = load_recording_csv(&path).expect("load");
    assert_eq!(rows[0].timestamp_ns, 5);
    assert!((rows[0].z - 3.0).abs() < f32::EPSILON);
}

#[rstest]
#[case("t,x,y,z\n0,0,0,0\n")]
#[case("timestamp_ns,x,y\n0,0,0\n")]
#[case("timestamp_ns,z,y,x\n0,0,0,0\n")]
fn rejects_wrong_headers(#[case] body: &str) {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, body);
    let err = load_recording_csv(&path).expect_err("bad header");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("recording csv must have headers")
    );
}

#[rstest]
fn rejects_backwards_timestamps() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "timestamp_ns,x,y,z\n100,0,0,9.8\n50,0,0,9.8\n");
    let err = load_recording_csv(&path).expect_err("backwards time");
    let msg = format!("{err}");
    assert!(msg.contains("non-decreasing"), "{msg}");
    assert!(msg.contains("row 3"), "{msg}");
}

#[rstest]
fn rejects_unparseable_row_with_row_number() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "timestamp_ns,x,y,z\n0,0,0,9.8\n-5,abc,0,9.8\n");
    let err = load_recording_csv(&path).expect_err("bad row");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn rejects_empty_recording() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "timestamp_ns,x,y,z\n");
    let err = load_recording_csv(&path).expect_err("empty");
    assert!(format!("{err}").contains("contains no samples"));
}

#[rstest]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    let err = load_recording_csv(&path).expect_err("missing");
    assert!(format!("{err}").contains("open recording CSV"));
}
