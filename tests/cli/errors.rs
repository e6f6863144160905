//! Error output and hints.

use std::fs;

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_push_requires_login() {
    let t = Test::new();
    t.cmd()
        .arg("push")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"))
        .stderr(predicate::str::contains("sentra login"));
}

#[test]
fn test_projects_requires_login() {
    let t = Test::new();
    t.cmd()
        .arg("projects")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn test_insecure_server_url_rejected() {
    let t = Test::new();
    t.cmd()
        .env("SENTRA_SERVER_URL", "http://sync.example.com")
        .env("SENTRA_SESSION_TOKEN", TEST_TOKEN)
        .arg("projects")
        .assert()
        .failure()
        .stderr(predicate::str::contains("insecure connection"));
}

#[test]
fn test_malformed_config_reported() {
    let t = Test::new();
    fs::write(t.state().join("config.toml"), "timeout_secs = \"soon\"\n").unwrap();

    t.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn test_zero_timeout_rejected() {
    let t = Test::new();
    fs::write(t.state().join("config.toml"), "timeout_secs = 0\n").unwrap();

    t.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn test_unreachable_server_fails_without_marking_pushed() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));

    // Nothing listens on port 1.
    t.cmd()
        .env("SENTRA_SERVER_URL", "http://127.0.0.1:1")
        .env("SENTRA_SESSION_TOKEN", TEST_TOKEN)
        .arg("push")
        .assert()
        .failure();
    assert!(!t.state().join("pushed.json").exists());
}

#[test]
fn test_files_requires_project_root() {
    let t = Test::new();
    t.cmd()
        .env("SENTRA_SESSION_TOKEN", TEST_TOKEN)
        .args(["files", "./"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project root"));
}

#[test]
fn test_completions() {
    let t = Test::new();
    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sentra"));
}
