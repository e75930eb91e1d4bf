use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn no_args_prints_usage() {
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn create_requires_epic_id() {
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.arg("create");
    cmd.assert().failure().stderr(predicate::str::contains(
        "required arguments were not provided",
    ));
}

#[test]
fn land_requires_epic_id() {
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.arg("land");
    cmd.assert().failure().stderr(predicate::str::contains(
        "required arguments were not provided",
    ));
}

#[test]
fn status_outside_a_rig_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.current_dir(tmp.path()).args(["status", "gt-epic"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not inside a Gas Town rig"));
}

#[test]
fn explicit_rig_that_is_not_a_rig_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.args([
        "land",
        "gt-epic",
        "--dry-run",
        "--rig",
        tmp.path().to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is not a rig"));
}

#[test]
fn resolve_outside_a_rig_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.current_dir(tmp.path()).args(["resolve", "gt-task"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not inside a Gas Town rig"));
}

#[test]
fn schema_emits_parseable_json() {
    let mut cmd = Command::cargo_bin("gt").unwrap();
    let output = cmd.arg("schema").assert().success().get_output().clone();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let schema: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rendered = schema.to_string();
    assert!(rendered.contains("merge_queue"));
    assert!(rendered.contains("integration_branch_template"));
}

#[test]
fn patrol_on_unconfigured_rig_is_a_noop() {
    // A rig with a bare-repo marker but no settings: auto-land defaults to
    // false, so the tick exits 0 without needing bd or git.
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join(".repo.git")).unwrap();

    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.args(["patrol", "--rig", tmp.path().to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Auto-land is disabled"));
}

#[test]
fn patrol_respects_refinery_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join(".repo.git")).unwrap();
    std::fs::create_dir(tmp.path().join("settings")).unwrap();
    std::fs::write(
        tmp.path().join("settings/config.json"),
        r#"{
            "type": "rig-settings",
            "version": 1,
            "merge_queue": {
                "integration_branch_refinery_enabled": false,
                "integration_branch_auto_land": true
            }
        }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.args(["patrol", "--rig", tmp.path().to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Refinery is disabled"));
}

#[test]
fn resolve_with_detection_disabled_fails() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join(".repo.git")).unwrap();
    std::fs::create_dir(tmp.path().join("settings")).unwrap();
    std::fs::write(
        tmp.path().join("settings/config.json"),
        r#"{"merge_queue": {"integration_branch_refinery_enabled": false}}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.args(["resolve", "gt-task", "--rig", tmp.path().to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("detection is disabled"));
}
