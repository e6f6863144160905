//! Tests for the add, commit, status, and log commands.

use std::fs;

use crate::support::*;

#[test]
fn test_add_all_then_commit() {
    let t = Test::with_projects(&["api", "web"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("web/.env", SAMPLE_ENV);

    let output = t.add_all();
    assert_success(&output);
    assert_stdout_contains(&output, "api/.env");
    assert_stdout_contains(&output, "web/.env");
    assert_stdout_contains(&output, "staged 2 files");

    let output = t.commit("initial");
    assert_success(&output);
    assert_stdout_contains(&output, "committed");
    assert_stdout_contains(&output, "(2 files)");

    let commits: Vec<_> = fs::read_dir(t.state().join("commits")).unwrap().collect();
    assert_eq!(commits.len(), 1);
}

#[test]
fn test_add_specific_path() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("api/.env.production", SAMPLE_ENV_PROD);

    let output = t.run(&["add", "api/.env.production"]);
    assert_success(&output);
    assert_stdout_contains(&output, "staged 1 files");

    let index = fs::read_to_string(t.state().join("index.json")).unwrap();
    assert!(index.contains("api/.env.production"));
    assert!(!index.contains("\"api/.env\""));
}

#[test]
fn test_add_rejects_non_env_file() {
    let t = Test::with_projects(&["api"]);
    t.write("api/main.rs", "fn main() {}\n");

    let output = t.run(&["add", "api/main.rs"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "not an env file");
}

#[test]
fn test_add_rejects_path_outside_scan_root() {
    let t = Test::with_projects(&["api"]);
    let outside = tempfile::TempDir::new().unwrap();
    let path = outside.path().join(".env");
    fs::write(&path, SAMPLE_ENV).unwrap();

    let output = t.cmd().arg("add").arg(&path).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "escapes the scan root");
}

#[test]
fn test_add_without_arguments_fails() {
    let t = Test::new();
    let output = t.run(&["add"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "--all");
}

#[test]
fn test_commit_with_nothing_staged() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);

    let output = t.commit("empty");
    assert_failure(&output);
    assert_stderr_contains(&output, "nothing to commit");
    assert_stderr_contains(&output, "sentra add --all");
}

#[test]
fn test_commit_with_blank_message() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());

    let output = t.commit("   ");
    assert_failure(&output);
    assert_stderr_contains(&output, "message cannot be empty");
}

#[test]
fn test_commit_refuses_file_changed_after_staging() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());

    t.write("api/.env", SAMPLE_ENV_PROD);
    let output = t.commit("stale");
    assert_failure(&output);
    assert_stderr_contains(&output, "changed since it was staged");
    assert_stderr_contains(&output, "sentra add api/.env");

    // Re-staging picks up the new content.
    assert_success(&t.add_all());
    assert_success(&t.commit("fresh"));
}

#[test]
fn test_commit_clears_staging() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("first"));

    let output = t.commit("second");
    assert_failure(&output);
    assert_stderr_contains(&output, "nothing to commit");
}

#[test]
fn test_status_reports_each_state() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("api/.env.production", SAMPLE_ENV_PROD);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));

    t.write("api/.env", "CHANGED=1\n");
    t.write("api/.env.test", SAMPLE_ENV);

    let output = t.status();
    assert_success(&output);
    assert_stdout_contains(&output, "M api/.env");
    assert_stdout_contains(&output, "? api/.env.test");
    assert_stdout_excludes(&output, "api/.env.production");
    assert_stdout_contains(&output, "unpushed  1");
}

#[test]
fn test_status_warns_on_stale_stage() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    t.write("api/.env", SAMPLE_ENV_PROD);

    let output = t.status();
    assert_success(&output);
    assert_stdout_contains(&output, "! api/.env");
    assert_stdout_contains(&output, "changed since staging");
}

#[test]
fn test_status_clean_workspace() {
    let t = Test::with_projects(&["api"]);
    let output = t.status();
    assert_success(&output);
    assert_stdout_contains(&output, "nothing to commit");
}

#[test]
fn test_log_lists_commits_newest_first() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("first"));
    t.write("api/.env", SAMPLE_ENV_PROD);
    assert_success(&t.add_all());
    assert_success(&t.commit("second"));

    let output = t.log();
    assert_success(&output);
    let out = stdout(&output);
    let first = out.find("first").expect("first commit missing");
    let second = out.find("second").expect("second commit missing");
    assert!(second < first, "log should be newest first:\n{}", out);
    assert!(out.contains("local"));
}

#[test]
fn test_log_empty() {
    let t = Test::new();
    let output = t.log();
    assert_success(&output);
    assert_stdout_contains(&output, "no commits yet");
}
