//! Tests for `sentra login`, `sentra logout`, and `sentra device`.

use std::fs;

use crate::support::*;

#[test]
fn test_login_saves_token() {
    let t = Test::new();
    let output = t.run(&["login", "--token", TEST_TOKEN]);
    assert_success(&output);
    assert_stdout_contains(&output, "logged in");

    let config = fs::read_to_string(t.state().join("config.toml")).unwrap();
    assert!(config.contains(TEST_TOKEN));
}

#[cfg(unix)]
#[test]
fn test_config_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::new();
    assert_success(&t.run(&["login", "--token", TEST_TOKEN]));
    let mode = fs::metadata(t.state().join("config.toml"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_login_rejects_blank_token() {
    let t = Test::new();
    let output = t.run(&["login", "--token", "  "]);
    assert_failure(&output);
    assert_stderr_contains(&output, "session_token");
}

#[test]
fn test_login_removes_legacy_session_files() {
    let t = Test::new();
    fs::write(t.state().join("session.json"), "{}").unwrap();
    fs::write(t.state().join("session.key"), "old").unwrap();

    assert_success(&t.run(&["login", "--token", TEST_TOKEN]));
    assert!(!t.state().join("session.json").exists());
    assert!(!t.state().join("session.key").exists());
}

#[test]
fn test_logout_clears_token() {
    let t = Test::new();
    assert_success(&t.run(&["login", "--token", TEST_TOKEN]));

    let output = t.run(&["logout"]);
    assert_success(&output);
    assert_stdout_contains(&output, "logged out");

    let config = fs::read_to_string(t.state().join("config.toml")).unwrap();
    assert!(!config.contains(TEST_TOKEN));

    let output = t.run(&["logout"]);
    assert_success(&output);
    assert_stdout_contains(&output, "not logged in");
}

#[test]
fn test_logout_removes_legacy_session_files() {
    let t = Test::new();
    fs::write(t.state().join("session.json"), "{}").unwrap();

    let output = t.run(&["logout"]);
    assert_success(&output);
    assert_stdout_contains(&output, "logged out");
    assert!(!t.state().join("session.json").exists());
}

#[test]
fn test_device_is_stable() {
    let t = Test::new();
    let first = t.run(&["device"]);
    assert_success(&first);
    assert_stdout_contains(&first, "machine_id");
    assert_stdout_contains(&first, "public_key");

    let second = t.run(&["device"]);
    assert_success(&second);
    assert_eq!(stdout(&first), stdout(&second));

    let machine_id = fs::read_to_string(t.state().join("machine_id")).unwrap();
    assert!(stdout(&first).contains(machine_id.trim()));
}
