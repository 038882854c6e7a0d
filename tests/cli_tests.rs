use std::process::Command;

mod support;

#[test]
fn cli_exits_one_and_prints_the_plan_when_changes_are_needed() {
    let fixture = support::fixture_dir("finance");

    let output = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(fixture.join("spec.yml"))
        .arg("--snapshot")
        .arg(fixture.join("snapshot.json"))
        .output()
        .expect("should run privsync binary");

    assert_eq!(
        output.status.code(),
        Some(1),
        "expected exit code 1 when changes are pending, got {:?}",
        output.status
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(r#"GRANT USAGE ON SCHEMA finance TO "analysts";"#),
        "unexpected stdout:\n{stdout}"
    );
}

#[test]
fn cli_exits_zero_when_database_already_matches() {
    let temp = support::unique_temp_dir("privsync_no_changes");
    let spec_path = temp.join("spec.yml");
    let snapshot_path = temp.join("snapshot.json");

    std::fs::write(
        &spec_path,
        "postgres:\n  is_superuser: true\nreader:\n  privileges:\n    schemas:\n      read: [app]\n",
    )
    .expect("should write temp spec");
    std::fs::write(
        &snapshot_path,
        r#"{
  "superusers": ["postgres"],
  "objects": [{"kind": "schemas", "schema": "app", "owner": "svc"}],
  "grants": [{"role": "reader", "kind": "schemas", "object": "app", "privilege": "USAGE"}]
}"#,
    )
    .expect("should write temp snapshot");

    let output = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(&spec_path)
        .arg("--snapshot")
        .arg(&snapshot_path)
        .output()
        .expect("should run privsync binary");

    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"-- Skipping privilege configuration for superuser "postgres""#
    );
}

#[test]
fn cli_exits_two_on_authoring_error_without_printing_a_plan() {
    let temp = support::unique_temp_dir("privsync_authoring_err");
    let spec_path = temp.join("spec.yml");
    let snapshot_path = temp.join("snapshot.json");

    std::fs::write(
        &spec_path,
        "analyst:\n  privileges:\n    tables:\n      read: [ghost.nonexistent_table]\n",
    )
    .expect("should write temp spec");
    std::fs::write(&snapshot_path, "{}").expect("should write temp snapshot");

    let output = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(&spec_path)
        .arg("--snapshot")
        .arg(&snapshot_path)
        .output()
        .expect("should run privsync binary");

    assert_eq!(output.status.code(), Some(2), "{:?}", output);
    assert!(output.stdout.is_empty(), "no partial plan should be printed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: "), "{stderr}");
    assert!(stderr.contains("analyst"), "{stderr}");
    assert!(stderr.contains("nonexistent_table"), "{stderr}");
    assert!(!stderr.contains("Error: Error"), "{stderr}");
}

#[test]
fn cli_writes_script_and_report_to_output_dir() {
    let fixture = support::fixture_dir("finance");
    let temp = support::unique_temp_dir("privsync_output_dir");
    let output_dir = temp.join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(fixture.join("spec.yml"))
        .arg("--snapshot")
        .arg(fixture.join("snapshot.json"))
        .arg("--output-dir")
        .arg(&output_dir)
        .arg("--name")
        .arg("finance")
        .status()
        .expect("should run privsync binary");
    assert_eq!(status.code(), Some(1));

    let script_path = output_dir.join("finance.sql");
    let report_path = output_dir.join("finance_report.md");
    let script = std::fs::read_to_string(&script_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", script_path.display()));
    let report = std::fs::read_to_string(&report_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", report_path.display()));

    assert!(script.ends_with("RESET ROLE;\nGRANT USAGE ON SCHEMA finance TO \"etl_writers\";\nGRANT CREATE ON SCHEMA finance TO \"etl_writers\";\n"));
    assert!(report.starts_with("# privsync Plan Report"), "{report}");
    assert!(report.contains("| analysts |"), "{report}");
    assert!(report.contains("postgres"), "{report}");
}

#[test]
fn cli_rejects_output_names_with_path_separators() {
    let fixture = support::fixture_dir("finance");
    let temp = support::unique_temp_dir("privsync_bad_name");

    let output = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(fixture.join("spec.yml"))
        .arg("--snapshot")
        .arg(fixture.join("snapshot.json"))
        .arg("--output-dir")
        .arg(&temp)
        .arg("--name")
        .arg("../escape")
        .output()
        .expect("should run privsync binary");

    assert_eq!(output.status.code(), Some(2), "{:?}", output);
    assert!(!temp.join("../escape.sql").exists());
}

#[test]
fn cli_requires_a_snapshot_source() {
    let fixture = support::fixture_dir("finance");

    let output = Command::new(env!("CARGO_BIN_EXE_privsync"))
        .arg(fixture.join("spec.yml"))
        .output()
        .expect("should run privsync binary");

    assert_eq!(output.status.code(), Some(2), "{:?}", output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--snapshot"), "{stderr}");
}
