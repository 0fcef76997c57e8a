mod common;

use common::{CodegenProcess, exit_code};

#[test]
fn validate_valid_config() {
    let config = CodegenProcess::fixture("speed_only.yaml");
    let output = CodegenProcess::spawn_command(&["validate", &config]);
    assert!(
        output.status.success(),
        "validate should succeed for valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("speed_only.yaml: ok"), "stdout: {stdout}");
}

#[test]
fn validate_multiple_files_counts_failures() {
    let good = CodegenProcess::fixture("speed_only.yaml");
    let bad = CodegenProcess::fixture("unknown_key.yaml");
    let missing = CodegenProcess::fixture("missing_reference.yaml");
    let output = CodegenProcess::spawn_command(&["validate", &good, &bad, &missing]);
    assert_eq!(exit_code(&output), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("2 file(s) failed validation"),
        "stderr: {stderr}"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("speed_only.yaml: ok"), "stdout: {stdout}");
}

#[test]
fn validate_quiet_prints_nothing_for_valid_config() {
    let config = CodegenProcess::fixture("speed_only.yaml");
    let output = CodegenProcess::spawn_command(&["validate", "-q", &config]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    assert!(output.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn validate_quiet_still_reports_failures() {
    let good = CodegenProcess::fixture("speed_only.yaml");
    let bad = CodegenProcess::fixture("unknown_key.yaml");
    let output = CodegenProcess::spawn_command(&["validate", "--quiet", &good, &bad]);
    assert_eq!(exit_code(&output), 2);
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown_key.yaml"), "stderr: {stderr}");
}

#[test]
fn validate_json_output() {
    let good = CodegenProcess::fixture("full_device.yaml");
    let bad = CodegenProcess::fixture("missing_reference.yaml");
    let output = CodegenProcess::spawn_command(&["validate", "--format", "json", &good, &bad]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("output should be valid JSON");
    let reports = parsed.as_array().expect("reports should be an array");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[0]["components"], 1);
    assert_eq!(reports[0]["outputs"], 6);
    assert_eq!(reports[1]["valid"], false);
    assert_eq!(reports[1]["kind"], "reference");
}

#[test]
fn validate_missing_file() {
    let output = CodegenProcess::spawn_command(&[
        "validate",
        "/tmp/nonexistent_ld2415h_codegen_test_file.yaml",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("file not found"), "stderr: {stderr}");
}

#[test]
fn validate_reports_binding_conflict() {
    let config = CodegenProcess::fixture("double_speed.yaml");
    let output = CodegenProcess::spawn_command(&["validate", "--format", "json", &config]);
    assert!(!output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be valid JSON");
    assert_eq!(parsed[0]["kind"], "binding");
}

#[test]
fn generate_cpp_to_stdout() {
    let config = CodegenProcess::fixture("speed_only.yaml");
    let output = CodegenProcess::spawn_command(&["generate", &config]);
    assert!(
        output.status.success(),
        "generate should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("App.register_component(radar1);"));
    assert!(stdout.contains("radar1->set_uart_parent(uart_bus);"));
    assert!(stdout.contains("sensor::Sensor *radar1_speed = new sensor::Sensor();"));
    assert!(stdout.contains("radar1->set_speed_sensor(radar1_speed);"));
    assert!(!stdout.contains("set_velocity_sensor"));
}

#[test]
fn generate_json_to_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let out = dir.path().join("graph.json");
    let config = CodegenProcess::fixture("full_device.yaml");
    let output = CodegenProcess::spawn_command(&[
        "generate",
        &config,
        "--format",
        "json",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "generate should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    let hub = &parsed["graph"]["components"][0];
    assert_eq!(hub["id"], "radar1");
    assert_eq!(hub["uart_id"], "radar_uart");
    assert_eq!(hub["outputs"]["speed"], "radar1_speed");
    assert_eq!(hub["outputs"]["velocity"], "driveway_velocity");
    assert_eq!(hub["settings"]["sensitivity"], 12);
}

#[test]
fn generate_binding_conflict_exit_code() {
    let config = CodegenProcess::fixture("double_speed.yaml");
    let output = CodegenProcess::spawn_command(&["generate", &config]);
    assert_eq!(exit_code(&output), 4);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already has a speed sensor bound"), "stderr: {stderr}");
}

#[test]
fn generate_reference_error_exit_code() {
    let config = CodegenProcess::fixture("missing_reference.yaml");
    let output = CodegenProcess::spawn_command(&["generate", &config]);
    assert_eq!(exit_code(&output), 2);
    assert!(output.stdout.is_empty(), "nothing should be generated");
}

#[test]
fn usage_error_exit_code() {
    let output = CodegenProcess::spawn_command(&["generate", "--format", "rust", "x.yaml"]);
    assert_eq!(exit_code(&output), 64);
}

#[test]
fn completions_bash() {
    let output = CodegenProcess::spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ld2415h-codegen"));
}

#[test]
fn version_json() {
    let output = CodegenProcess::spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["name"], "ld2415h-codegen");
    assert_eq!(parsed["platform"], "ld2415h");
}
