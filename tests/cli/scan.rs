//! Tests for `sentra scan`.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_scan_lists_env_files_per_project() {
    let t = Test::with_projects(&["api", "web"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("api/config/.env.production", SAMPLE_ENV_PROD);
    t.write("web/.env.local", SAMPLE_ENV);
    t.write("web/README.md", "# web\n");

    t.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("config/.env.production"))
        .stdout(predicate::str::contains(".env.local"))
        .stdout(predicate::str::contains("README.md").not())
        .stdout(predicate::str::contains("3 env files in 2 projects"));
}

#[test]
fn test_scan_honors_gitignore() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("api/.gitignore", GITIGNORE_SECRETS_DIR);
    t.write("api/secrets/.env.hidden", SAMPLE_ENV);

    t.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env.hidden").not())
        .stdout(predicate::str::contains("1 env files in 1 projects"));
}

#[cfg(unix)]
#[test]
fn test_scan_reports_symlinked_env_file() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    std::os::unix::fs::symlink("../shared/env", t.project("api").join(".env.local")).unwrap();

    t.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env.local"))
        .stdout(predicate::str::contains("2 env files in 1 projects"));
}

#[test]
fn test_scan_skips_dependency_dirs() {
    let t = Test::with_projects(&["api"]);
    t.write("api/node_modules/pkg/.env", SAMPLE_ENV);

    t.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("no env files found"));
}

#[test]
fn test_scan_ignores_directories_without_git() {
    let t = Test::new();
    t.write("loose/.env", SAMPLE_ENV);

    t.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("no env files found"));
}

#[test]
fn test_scan_missing_root_fails() {
    let t = Test::new();
    let missing = t.root.path().join("nope");

    t.cmd()
        .env("SENTRA_SCAN_ROOT", &missing)
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}
