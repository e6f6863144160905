//! HTTP error responses.
//!
//! Bodies carry a short public message. With `SENTRA_DEBUG_HTTP_ERRORS=1`
//! they carry the underlying error text instead, for local debugging.

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::client::truncate;
use crate::error::RepoError;

pub const DEBUG_ERRORS_ENV: &str = "SENTRA_DEBUG_HTTP_ERRORS";

const MAX_DETAIL: usize = 4000;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    public: &'static str,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, public: &'static str) -> Self {
        Self {
            status,
            public,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn bad_request(public: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, public)
    }

    /// Map a backend failure. Unconfigured or unreachable backends are 503
    /// so clients retry instead of re-authenticating.
    pub fn from_repo(err: RepoError, public: &'static str) -> Self {
        let base = match &err {
            RepoError::NotConfigured => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "db not configured")
            }
            RepoError::Unavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "backend unavailable")
            }
            RepoError::Invalid(_) => Self::bad_request("invalid request"),
            RepoError::Backend { .. } | RepoError::Decode(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, public)
            }
        };
        base.with_detail(err)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn debug_enabled() -> bool {
    std::env::var(DEBUG_ERRORS_ENV).map(|v| v == "1").unwrap_or(false)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.detail {
            Some(detail) if debug_enabled() => {
                let detail = detail.trim();
                if detail.is_empty() {
                    self.public.to_string()
                } else {
                    truncate(detail, MAX_DETAIL).to_string()
                }
            }
            _ => self.public.to_string(),
        };
        (self.status, body).into_response()
    }
}
