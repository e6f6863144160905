//! End-to-end push against an in-process sync server.

use std::sync::Arc;

use sentra::core::identity::DeviceIdentity;
use sentra::server::auth::StaticSessions;
use sentra::server::repo::MemoryRepository;
use sentra::server::{self, AppState};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

use crate::support::*;

/// A server on an ephemeral port. Dropping it stops the server.
struct Server {
    url: String,
    repo: Arc<MemoryRepository>,
    runtime: Runtime,
}

impl Server {
    fn start() -> Self {
        let runtime = Runtime::new().expect("failed to create runtime");
        let repo = Arc::new(MemoryRepository::new());
        let mut sessions = StaticSessions::new();
        sessions.insert(TEST_TOKEN, TEST_USER);
        let state = AppState::new(repo.clone(), Arc::new(sessions));

        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("failed to bind");
        let url = format!("http://{}", listener.local_addr().unwrap());
        runtime.spawn(server::serve(listener, state, std::future::pending()));

        Self { url, repo, runtime }
    }

    /// Register the device stored in `state_dir` for the test user.
    fn pair(&self, state_dir: &std::path::Path) {
        let identity = DeviceIdentity::load_or_create(state_dir).unwrap();
        self.runtime.block_on(self.repo.register_device(
            TEST_USER,
            identity.machine_id(),
            &identity.public_key_b64(),
        ));
    }

    fn commit_count(&self, root: &str) -> usize {
        self.runtime.block_on(self.repo.commit_count(TEST_USER, root))
    }
}

impl Test {
    fn remote(&self, server: &Server, args: &[&str]) -> std::process::Output {
        self.cmd()
            .env("SENTRA_SERVER_URL", &server.url)
            .env("SENTRA_SESSION_TOKEN", TEST_TOKEN)
            .args(args)
            .output()
            .unwrap()
    }
}

#[test]
fn test_push_fans_out_per_project() {
    let server = Server::start();
    let t = Test::with_projects(&["api", "web"]);
    server.pair(t.state());

    t.write("api/.env", SAMPLE_ENV);
    t.write("api/.env.production", SAMPLE_ENV_PROD);
    t.write("web/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));

    let output = t.remote(&server, &["push"]);
    assert_success(&output);
    assert_stdout_contains(&output, "to 2 projects");
    assert_eq!(server.commit_count("api"), 1);
    assert_eq!(server.commit_count("web"), 1);

    let output = t.remote(&server, &["push"]);
    assert_success(&output);
    assert_stdout_contains(&output, "everything up to date");

    let output = t.log();
    assert_stdout_contains(&output, "pushed");
}

#[test]
fn test_projects_and_files_after_push() {
    let server = Server::start();
    let t = Test::with_projects(&["api"]);
    server.pair(t.state());

    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));
    assert_success(&t.remote(&server, &["push"]));

    let output = t.remote(&server, &["projects"]);
    assert_success(&output);
    assert_stdout_contains(&output, "api");
    assert_stdout_contains(&output, "initial");

    let output = t.remote(&server, &["files", "api"]);
    assert_success(&output);
    assert_stdout_contains(&output, "api/.env");
    assert_stdout_excludes(&output, SAMPLE_ENV);
}

#[test]
fn test_files_accepts_a_file_path() {
    let server = Server::start();
    let t = Test::with_projects(&["api"]);
    server.pair(t.state());

    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));
    assert_success(&t.remote(&server, &["push"]));

    let output = t.remote(&server, &["files", "./api/.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "api/.env");
}

#[test]
fn test_push_from_unpaired_device_is_rejected() {
    let server = Server::start();
    let t = Test::with_projects(&["api"]);
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));

    let output = t.remote(&server, &["push"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unauthorized");
    assert_stderr_contains(&output, "sentra login");
    assert_eq!(server.commit_count("api"), 0);

    let output = t.status();
    assert_stdout_contains(&output, "unpushed  1");
}

#[test]
fn test_push_with_unknown_token_is_rejected() {
    let server = Server::start();
    let t = Test::with_projects(&["api"]);
    server.pair(t.state());
    t.write("api/.env", SAMPLE_ENV);
    assert_success(&t.add_all());
    assert_success(&t.commit("initial"));

    let output = t
        .cmd()
        .env("SENTRA_SERVER_URL", &server.url)
        .env("SENTRA_SESSION_TOKEN", "wrong-token")
        .arg("push")
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "unauthorized");
}
