//! Push construction from a real workspace.

mod support;

use sentra::core::cipher::{self, KeyContext};
use sentra::core::constants;
use sentra::core::hash::sha256_hex;
use sentra::core::push::build_push_requests;
use sentra::core::store::Commit;
use sentra::core::workspace::Workspace;
use sentra::error::{Error, PushError};
use support::*;

#[test]
fn test_commit_builds_one_encrypted_request_per_project() {
    let t = Test::with_projects(&["web", "api"]);
    t.write("api/.env", SAMPLE_ENV);
    t.write("api/.env.production", SAMPLE_ENV_PROD);
    t.write("web/.env", SAMPLE_ENV);

    let workspace = Workspace::new(t.root.path(), t.state());
    workspace.stage_all().unwrap();
    let commit = workspace.commit("initial").unwrap();

    let keys = KeyContext::new(t.state().join(constants::INSTALLATION_KEY_FILE));
    let key = keys.key().unwrap();
    let requests =
        build_push_requests(t.root.path(), "machine-1", "laptop", &commit, key).unwrap();

    let roots: Vec<_> = requests.iter().map(|r| r.project.root.as_str()).collect();
    assert_eq!(roots, ["api", "web"]);
    assert!(requests.iter().all(|r| r.commit.client_id == commit.id));

    let api = &requests[0];
    let paths: Vec<_> = api.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["api/.env", "api/.env.production"]);

    for file in &api.files {
        assert!(file.encrypted);
        assert_eq!(file.cipher, constants::CIPHER_NAME);
        assert!(!file.blob.contains("DATABASE_URL"));

        let plaintext = cipher::decrypt(key, &file.blob).unwrap();
        assert_eq!(sha256_hex(&plaintext), file.sha256);
        assert_eq!(sha256_hex(&plaintext), commit.files[&file.path]);
    }
}

#[test]
fn test_unpushed_until_marked() {
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);

    let workspace = Workspace::new(t.root.path(), t.state());
    workspace.stage_all().unwrap();
    let commit = workspace.commit("initial").unwrap();
    assert_eq!(workspace.unpushed().unwrap(), vec![commit.clone()]);

    workspace.mark_pushed(&commit.id).unwrap();
    assert!(workspace.unpushed().unwrap().is_empty());
    assert_eq!(workspace.status().unwrap().unpushed, 0);
}

#[test]
fn test_deleted_file_fails_the_build() {
    let t = Test::with_projects(&["api"]);
    let path = t.write("api/.env", SAMPLE_ENV);

    let workspace = Workspace::new(t.root.path(), t.state());
    workspace.stage_all().unwrap();
    let commit = workspace.commit("initial").unwrap();
    std::fs::remove_file(path).unwrap();

    let keys = KeyContext::new(t.state().join(constants::INSTALLATION_KEY_FILE));
    let err = build_push_requests(t.root.path(), "m", "n", &commit, keys.key().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::Push(PushError::Read { .. })));
}

#[test]
fn test_commit_without_project_root_fails() {
    let t = Test::new();
    let commit = Commit::new("odd", [("/".to_string(), "h".to_string())].into());

    let keys = KeyContext::new(t.state().join(constants::INSTALLATION_KEY_FILE));
    let err = build_push_requests(t.root.path(), "m", "n", &commit, keys.key().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::Push(PushError::NoProjectRoot)));
}
