use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

use clusterup::testkit::config::{two_worker_environment, write_environment};

/// The binary with settings pointed at a file that does not exist, so the
/// user's own settings never leak into a test.
fn clusterup(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clusterup").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--color")
        .arg("never")
        .arg("--settings")
        .arg(dir.join("settings.toml"));
    cmd
}

#[test]
fn prints_help() {
    let dir = tempfile::tempdir().unwrap();
    clusterup(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("storage"));
}

#[test]
fn hostname_is_derived_from_parts_and_uid() {
    let dir = tempfile::tempdir().unwrap();
    clusterup(dir.path())
        .args(["name", "hostname", "worker1", "c1", "--uid", "42"])
        .assert()
        .success()
        .stdout("worker1.c1.42.dev\n");
}

#[test]
fn node_name_carries_the_role_prefix() {
    let dir = tempfile::tempdir().unwrap();
    clusterup(dir.path())
        .args(["name", "node", "worker1", "c1", "--uid", "42"])
        .assert()
        .success()
        .stdout("worker@worker1.c1.42.dev\n");
}

#[test]
fn dotted_name_part_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    clusterup(dir.path())
        .args(["name", "hostname", "worker.1", "--uid", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("worker.1"));
}

#[test]
fn valid_environment_passes_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_environment(dir.path(), &two_worker_environment(Some("couchbase"))).unwrap();

    clusterup(dir.path())
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("c1"))
        .stdout(predicate::str::contains("worker2"));
}

#[test]
fn unsupported_driver_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_environment(dir.path(), &two_worker_environment(Some("mongodb"))).unwrap();

    clusterup(dir.path())
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mongodb"));
}

#[test]
fn up_with_missing_document_fails_before_starting_anything() {
    let dir = tempfile::tempdir().unwrap();
    clusterup(dir.path())
        .args(["up", "--image", "worker:test", "--uid", "1", "--dns", "none"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn invalid_dns_argument_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_environment(dir.path(), &two_worker_environment(None)).unwrap();

    clusterup(dir.path())
        .args(["up", "--image", "worker:test", "--dns", "somewhere"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("somewhere"));
}

#[test]
fn malformed_settings_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.toml"), "[timeouts]\npoll_interval_ms = 0\n").unwrap();

    clusterup(dir.path())
        .args(["name", "hostname", "worker1", "--uid", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll_interval_ms"));
}

#[test]
fn json_mode_reports_errors_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_environment(dir.path(), &two_worker_environment(Some("mongodb"))).unwrap();

    clusterup(dir.path())
        .args(["--json", "config", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"type\":\"error\""));
}
