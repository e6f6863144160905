//! RPC backend and backend sessions against an in-process stand-in server.

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use sentra::core::types::{PushCommit, PushMachine, PushProject, PushRequest};
use sentra::error::RepoError;
use sentra::server::auth::{BackendSessions, SessionVerifier, User};
use sentra::server::repo::{Repository, RpcClient, RpcFunctions, RpcRepository};

const SERVICE_KEY: &str = "service-key";

async fn rpc(
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(args): Json<Value>,
) -> impl IntoResponse {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(SERVICE_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad key" }))).into_response();
    }

    match function.as_str() {
        "sentra_push_v1" => Json(json!([{
            "out_project_id": "p",
            "out_commit_id": args["p_payload"]["commit"]["client_id"],
            "received_at": "t",
            "deduped": true
        }]))
        .into_response(),
        "sentra_projects_v1" => Json(json!([
            { "root_path": "api", "last_commit_id": "c1", "file_count": 2 },
            { "root_path": args["p_user_id"] }
        ]))
        .into_response(),
        "sentra_device_pubkey_v1" if args["p_machine_id"] == "m1" => {
            Json(json!([{ "pub_key": "abc" }])).into_response()
        }
        "sentra_device_pubkey_v1" => Json(json!([])).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn auth_user(headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match token {
        "Bearer good" => (StatusCode::OK, Json(json!({ "id": "user-1" }))).into_response(),
        "Bearer blank" => (StatusCode::OK, Json(json!({ "id": " " }))).into_response(),
        "Bearer forbidden" => StatusCode::FORBIDDEN.into_response(),
        "Bearer broken" => StatusCode::BAD_GATEWAY.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn start_backend() -> String {
    let app = Router::new()
        .route("/rest/v1/rpc/:function", post(rpc))
        .route("/auth/v1/user", get(auth_user));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

fn client(base: &str, key: &str) -> RpcClient {
    RpcClient::new(base, key, Duration::from_secs(5)).unwrap()
}

fn push_request() -> PushRequest {
    PushRequest {
        v: 1,
        project: PushProject { root: "api".into() },
        machine: PushMachine {
            id: "m1".into(),
            name: "laptop".into(),
        },
        commit: PushCommit {
            client_id: "2f1c7c3e-9a8b-4b7a-9d0e-1f2a3b4c5d6e".into(),
            message: "initial".into(),
        },
        files: Vec::new(),
    }
}

#[tokio::test]
async fn test_push_decodes_first_row() {
    let base = start_backend().await;
    let repo = RpcRepository::new(client(&base, SERVICE_KEY), RpcFunctions::default());

    let result = repo.push("user-1", &push_request()).await.unwrap();
    assert_eq!(result.project_id, "p");
    assert_eq!(result.commit_id, "2f1c7c3e-9a8b-4b7a-9d0e-1f2a3b4c5d6e");
    assert_eq!(result.received_at, "t");
    assert!(result.deduped);
}

#[tokio::test]
async fn test_list_projects_forwards_user() {
    let base = start_backend().await;
    let repo = RpcRepository::new(client(&base, SERVICE_KEY), RpcFunctions::default());

    let projects = repo.list_projects(" user-1 ").await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].root_path, "api");
    assert_eq!(projects[0].file_count, 2);
    assert_eq!(projects[1].root_path, "user-1");
    assert!(projects[1].last_commit_id.is_empty());
}

#[tokio::test]
async fn test_device_pub_key_over_http() {
    let base = start_backend().await;
    let repo = RpcRepository::new(client(&base, SERVICE_KEY), RpcFunctions::default());

    assert_eq!(
        repo.device_pub_key("user-1", "m1").await.unwrap(),
        Some("abc".to_string())
    );
    assert_eq!(repo.device_pub_key("user-1", "m2").await.unwrap(), None);
}

#[tokio::test]
async fn test_non_2xx_maps_to_backend_error() {
    let base = start_backend().await;
    let repo = RpcRepository::new(client(&base, SERVICE_KEY), RpcFunctions::default());

    let err = repo.list_files("user-1", "api", None).await.unwrap_err();
    assert!(matches!(err, RepoError::Backend { status: 500, ref body } if body == "boom"));
    assert!(!err.is_unavailable());

    let repo = RpcRepository::new(client(&base, "wrong"), RpcFunctions::default());
    let err = repo.list_projects("user-1").await.unwrap_err();
    assert!(matches!(err, RepoError::Backend { status: 401, .. }));
}

#[tokio::test]
async fn test_backend_sessions() {
    let base = start_backend().await;
    let sessions = BackendSessions::new(client(&base, SERVICE_KEY));

    assert_eq!(
        sessions.verify("good").await.unwrap(),
        Some(User { id: "user-1".into() })
    );
    assert_eq!(sessions.verify("blank").await.unwrap(), None);
    assert_eq!(sessions.verify("expired").await.unwrap(), None);
    assert_eq!(sessions.verify("forbidden").await.unwrap(), None);
    assert!(matches!(
        sessions.verify("broken").await,
        Err(RepoError::Backend { status: 502, .. })
    ));
}
