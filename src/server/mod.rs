//! Sync server.
//!
//! ```text
//! GET  /health                 no auth
//! GET  /projects               session
//! GET  /files?root=&at=        session
//! POST /push                   session + device signature
//! ```
//!
//! The server never sees plaintext. It authenticates the user and device,
//! then hands the encrypted payload to the storage backend.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod repo;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware as layer, Router};
use tokio::net::TcpListener;
use tracing::info;

use self::auth::SessionVerifier;
use self::repo::Repository;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub sessions: Arc<dyn SessionVerifier>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, sessions: Arc<dyn SessionVerifier>) -> Self {
        Self { repo, sessions }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let signed = Router::new()
        .route("/push", post(handlers::push))
        .route_layer(layer::from_fn_with_state(
            state.clone(),
            middleware::require_device_signature,
        ));

    let authenticated = Router::new()
        .route("/projects", get(handlers::projects))
        .route("/files", get(handlers::files))
        .merge(signed)
        .route_layer(layer::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(authenticated)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
