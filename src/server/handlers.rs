//! Route handlers.

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::User;
use super::errors::ApiError;
use super::middleware::Device;
use super::AppState;
use crate::core::constants;
use crate::core::types::{FileInfo, ProjectInfo, PushRequest, PushResult};

pub async fn health() -> &'static str {
    "ok"
}

pub async fn projects(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ProjectInfo>>, ApiError> {
    let projects = state.repo.list_projects(&user.id).await.map_err(|e| {
        warn!(user_id = %user.id, error = %e, "projects list failed");
        ApiError::from_repo(e, "projects failed")
    })?;
    Ok(Json(projects))
}

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    #[serde(default)]
    pub root: String,
    pub at: Option<String>,
}

pub async fn files(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Vec<FileInfo>>, ApiError> {
    let root = query.root.trim();
    if root.is_empty() {
        return Err(ApiError::bad_request("missing root"));
    }
    let at = query.at.as_deref().map(str::trim).filter(|a| !a.is_empty());

    let mut files = state
        .repo
        .list_files(&user.id, root, at)
        .await
        .map_err(|e| {
            warn!(user_id = %user.id, root, error = %e, "files list failed");
            ApiError::from_repo(e, "files failed")
        })?;
    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(Json(files))
}

/// Reject payloads the backend should never see, plaintext files above all.
fn validate_push(device: &Device, payload: &PushRequest) -> Result<(), ApiError> {
    if payload.v != constants::PUSH_VERSION {
        return Err(ApiError::bad_request("unsupported push version"));
    }
    if payload.project.root.trim().is_empty() {
        return Err(ApiError::bad_request("missing project.root"));
    }
    if Uuid::parse_str(payload.commit.client_id.trim()).is_err() {
        return Err(ApiError::bad_request("commit.client_id must be a UUID"));
    }
    if payload.machine.id.trim() != device.machine_id {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized")
            .with_detail("machine.id does not match the signing device"));
    }
    if payload.files.is_empty() {
        return Err(ApiError::bad_request("no files"));
    }
    if payload
        .files
        .iter()
        .any(|f| !f.encrypted || f.blob.is_empty() || f.path.trim().is_empty())
    {
        return Err(ApiError::bad_request("files must be encrypted"));
    }
    Ok(())
}

pub async fn push(
    State(state): State<AppState>,
    Extension(device): Extension<Device>,
    Json(payload): Json<PushRequest>,
) -> Result<Json<PushResult>, ApiError> {
    validate_push(&device, &payload)?;

    let result = state
        .repo
        .push(&device.user_id, &payload)
        .await
        .map_err(|e| {
            warn!(user_id = %device.user_id, error = %e, "push failed");
            ApiError::from_repo(e, "push failed")
        })?;

    info!(
        user_id = %device.user_id,
        machine_id = %device.machine_id,
        root = %payload.project.root,
        files = payload.files.len(),
        deduped = result.deduped,
        "push applied"
    );
    Ok(Json(result))
}
