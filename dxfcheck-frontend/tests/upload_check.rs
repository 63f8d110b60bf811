use std::fs;
use std::path::Path;

use dxfcheck_config::{AppConfig, OutputFormat};
use dxfcheck_frontend::cli::{check_path, check_upload};
use dxfcheck_frontend::errors::FrontendError;
use dxfcheck_io::IoError;

const FLOOR_PLAN: &[u8] = include_bytes!("../../dxfcheck-io/tests/data/floor_plan.dxf");

const MISSING_LAYERS: &str = "0
SECTION
2
TABLES
0
TABLE
2
LAYER
0
LAYER
2
Planon_floor
70
0
0
ENDTAB
0
ENDSEC
0
SECTION
2
ENTITIES
0
LINE
8
Planon_floor
10
0.0
20
0.0
11
1.0
21
1.0
0
ENDSEC
0
EOF
";

fn status_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| matches!(*line, "PASS" | "FAIL" | "UNKNOWN"))
        .collect()
}

#[test]
fn sample_plan_passes_every_rule() {
    let outcome = check_upload("floor_plan.dxf", FLOOR_PLAN, &AppConfig::default()).unwrap();
    assert!(outcome.passed, "{}", outcome.output);
    assert!(outcome.output.starts_with("Reading dxf file: floor_plan.dxf\n\n"));
    assert_eq!(status_lines(&outcome.output), vec!["PASS"; 11]);
    assert!(
        outcome
            .output
            .contains("Checking number of entities:\n\n9 entities.\n\nPASS\n")
    );
    assert!(
        outcome
            .output
            .contains("Checking workspaces are enclosed:\n\n1 workspace numbers found.\n\nPASS\n")
    );
    assert!(
        outcome
            .output
            .contains("Checking space numbers are unique:\n\n\nPASS\n\n")
    );
}

#[test]
fn missing_layers_stop_after_two_results() {
    let outcome =
        check_upload("partial.DXF", MISSING_LAYERS.as_bytes(), &AppConfig::default()).unwrap();
    assert!(!outcome.passed);
    assert_eq!(status_lines(&outcome.output), vec!["PASS", "FAIL"]);
    assert!(outcome.output.contains("Planon_floor: FOUND\n"));
    assert!(outcome.output.contains("Planon_construction: NOT FOUND\n"));
    assert!(!outcome.output.contains("Checking the Planon_floor polyline:"));
}

#[test]
fn json_format_is_machine_readable() {
    let mut config = AppConfig::default();
    config.output.format = OutputFormat::Json;
    let outcome = check_upload("floor_plan.dxf", FLOOR_PLAN, &config).unwrap();
    let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
    assert_eq!(value["file"], "floor_plan.dxf");
    assert_eq!(value["passed"], true);
    assert_eq!(value["entries"].as_array().unwrap().len(), 11);
    assert_eq!(value["entries"][4]["rule"], "floor-enclosed");
}

#[test]
fn local_file_is_checked_through_staging() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Level 1.dxf");
    fs::write(&path, FLOOR_PLAN).unwrap();
    let outcome = check_path(&path, &AppConfig::default()).unwrap();
    assert!(outcome.output.starts_with("Reading dxf file: Level_1.dxf\n\n"));
    assert!(outcome.passed);
}

#[test]
fn malformed_drawing_is_a_load_error() {
    let err = check_upload(
        "broken.dxf",
        b"0\nSECTION\n2\nENTITIES\n",
        &AppConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FrontendError::Load(IoError::InvalidDocument(_))));
}

#[test]
fn wrong_extension_is_rejected_before_loading() {
    let err = check_upload("floor_plan.dwg", FLOOR_PLAN, &AppConfig::default()).unwrap_err();
    assert!(matches!(err, FrontendError::UnsupportedExtension { .. }));
}

#[test]
fn unreadable_path_is_reported() {
    let err = check_path(Path::new("/no/such/dir/plan.dxf"), &AppConfig::default()).unwrap_err();
    assert!(matches!(err, FrontendError::Read { .. }));
}
