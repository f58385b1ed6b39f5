mod common;

use assert_cmd::Command;
use partsize::measure::save_frame;
use predicates::prelude::*;

fn partsize() -> Command {
    let mut cmd = Command::cargo_bin("partsize").expect("binary");
    cmd.arg("--log-level").arg("warn");
    cmd
}

#[test]
fn dictionary_info_lists_builtins() {
    partsize()
        .arg("dictionary-info")
        .assert()
        .success()
        .stdout(predicate::str::contains("dictionary PARTSIZE_5X5_50"))
        .stdout(predicate::str::contains("PARTSIZE_4X4_50"));
}

#[test]
fn exported_dictionary_can_be_loaded_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dict.json");

    partsize()
        .args(["export-dictionary", "--builtin", "PARTSIZE_4X4_50", "--out"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    partsize()
        .arg("dictionary-info")
        .arg("--dictionary")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("4x4 bits"));
}

#[test]
fn opencv_export_is_accepted_as_dictionary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("opencv.json");
    // Two 4x4 markers as written by `getBitsFromByteList` (white = 1).
    std::fs::write(
        &path,
        r#"{
            "name": "DICT_4X4_TWO",
            "marker_size": 4,
            "bits": [
                [[1,0,1,1],[0,1,0,1],[0,0,1,1],[0,0,1,0]],
                [[0,0,0,0],[1,1,1,1],[1,0,0,1],[1,0,1,0]]
            ]
        }"#,
    )
    .expect("write");

    partsize()
        .arg("dictionary-info")
        .arg("--dictionary")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("dictionary DICT_4X4_TWO"))
        .stdout(predicate::str::contains("4x4 bits"));
}

#[test]
fn unknown_builtin_fails() {
    partsize()
        .args(["dictionary-info", "--builtin", "DICT_6X6_250"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DICT_6X6_250"));
}

#[test]
fn print_marker_writes_sized_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("marker.png");

    partsize()
        .args(["print-marker", "--id", "3", "--side-cm", "5", "--dpi", "300", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote marker 3"));

    // 84 px per cell, 7 cells of marker plus one quiet-zone cell per side.
    let img = image::open(&out).expect("png");
    assert_eq!((img.width(), img.height()), (756, 756));
}

#[test]
fn print_marker_rejects_unknown_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    partsize()
        .args(["print-marker", "--id", "500", "--out"])
        .arg(dir.path().join("marker.png"))
        .assert()
        .failure();
}

#[test]
fn measure_writes_report_and_annotated_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("desk.png");
    save_frame(&common::scene(), &input).expect("save");
    let out_dir = dir.path().join("out");
    let report = dir.path().join("report.json");

    partsize()
        .arg("measure")
        .arg(&input)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--report")
        .arg(&report)
        .arg("--exclude-marker")
        .assert()
        .success()
        .stdout(predicate::str::contains("marker 0"))
        .stdout(predicate::str::contains("Width"));

    assert!(out_dir.join("desk_measured.png").exists());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(json["dictionary"], "PARTSIZE_5X5_50");
    assert_eq!(json["marker_side_cm"], 5.0);
    let frame = &json["frames"][0];
    assert_eq!(frame["marker"]["id"], 0);
    assert_eq!(frame["measurements"].as_array().map(Vec::len), Some(1));
    let ratio = frame["px_per_cm"].as_f64().expect("ratio");
    assert!((ratio - 27.8).abs() < 0.3, "ratio {ratio}");
}

#[test]
fn measure_reports_bad_inputs_and_keeps_going() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bad = dir.path().join("broken.jpg");
    std::fs::write(&bad, b"not a jpeg").expect("write");
    let good = dir.path().join("desk.png");
    save_frame(&common::scene(), &good).expect("save");
    let report = dir.path().join("report.json");

    partsize()
        .arg("measure")
        .arg(&bad)
        .arg(&good)
        .arg("--report")
        .arg(&report)
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken.jpg: error"))
        .stdout(predicate::str::contains("desk.png: marker 0"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert!(json["frames"][0]["error"].is_string());
    assert!(json["frames"][1]["error"].is_null());
    assert_eq!(json["frames"][1]["measurements"].as_array().map(Vec::len), Some(2));
}

#[test]
fn config_file_sets_marker_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("desk.png");
    save_frame(&common::scene(), &input).expect("save");
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "params": { "marker": { "side_cm": 10.0 } } }"#)
        .expect("config");
    let report = dir.path().join("report.json");

    partsize()
        .arg("measure")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(json["marker_side_cm"], 10.0);
    let ratio = json["frames"][0]["px_per_cm"].as_f64().expect("ratio");
    assert!((ratio - 13.9).abs() < 0.2, "ratio {ratio}");
}
