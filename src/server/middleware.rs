//! Request authentication layers.
//!
//! `require_session` runs first on every authenticated route and stores the
//! [`User`]. `require_device_signature` runs after it on state-changing
//! routes: it looks up the machine's registered key, reads the body once to
//! verify the signature, then puts the body back for the handler.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::auth::{bearer_token, User};
use super::errors::ApiError;
use super::AppState;
use crate::core::constants;
use crate::core::signing::verify_signature;
use crate::error::RepoError;

/// Largest request body accepted on signed routes.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// A verified device, available to handlers behind the signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub user_id: String,
    pub machine_id: String,
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Owned so no borrow of the (non-Sync) request lives across the await.
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return ApiError::unauthorized().into_response();
    };

    let user = match state.sessions.verify(&token).await {
        Ok(Some(user)) if !user.id.trim().is_empty() => user,
        Ok(_) => return ApiError::unauthorized().into_response(),
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "session backend unavailable");
            return ApiError::from_repo(e, "unauthorized").into_response();
        }
        Err(e) => {
            debug!(error = %e, "session check failed");
            return ApiError::unauthorized().with_detail(e).into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub async fn require_device_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match verify_device(&state, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

async fn verify_device(state: &AppState, request: Request) -> Result<Request, ApiError> {
    let user_id = request
        .extensions()
        .get::<User>()
        .map(|u| u.id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    let (machine_id, timestamp, signature) = match (
        header(&request, constants::HEADER_MACHINE_ID),
        header(&request, constants::HEADER_TIMESTAMP),
        header(&request, constants::HEADER_SIGNATURE),
    ) {
        (Some(m), Some(t), Some(s)) => (m.to_string(), t.to_string(), s.to_string()),
        _ => {
            debug!("missing device signature headers");
            return Err(ApiError::unauthorized());
        }
    };

    let public_key = match state.repo.device_pub_key(&user_id, &machine_id).await {
        Ok(Some(key)) if !key.trim().is_empty() => key,
        Ok(_) => {
            debug!(user_id = %user_id, machine_id = %machine_id, "unregistered device");
            return Err(ApiError::unauthorized());
        }
        Err(e @ (RepoError::NotConfigured | RepoError::Unavailable(_))) => {
            warn!(error = %e, "device lookup unavailable");
            return Err(ApiError::from_repo(e, "unauthorized"));
        }
        Err(e) => {
            warn!(error = %e, "device lookup failed");
            return Err(ApiError::unauthorized().with_detail(e));
        }
    };

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::bad_request("unreadable body").with_detail(e))?;

    verify_signature(
        &public_key,
        &machine_id,
        &timestamp,
        parts.method.as_str(),
        parts.uri.path(),
        &bytes,
        &signature,
    )
    .map_err(|e| {
        debug!(user_id = %user_id, machine_id = %machine_id, error = %e, "signature rejected");
        ApiError::unauthorized().with_detail(e)
    })?;

    parts.extensions.insert(Device {
        user_id,
        machine_id,
    });
    Ok(Request::from_parts(parts, Body::from(bytes)))
}
