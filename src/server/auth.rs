//! Session tokens.
//!
//! The bearer token identifies the user; it says nothing about which device
//! sent the request. Device proof is checked separately by the signature
//! middleware.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use tracing::debug;

use super::repo::RpcClient;
use crate::error::RepoError;

/// The authenticated user of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
}

/// Resolves bearer tokens to users.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// `Ok(None)` for an unknown or expired token.
    async fn verify(&self, token: &str) -> Result<Option<User>, RepoError>;
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Fixed token table for local development.
#[derive(Debug, Default, Clone)]
pub struct StaticSessions {
    tokens: HashMap<String, String>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: &str, user_id: &str) {
        self.tokens
            .insert(token.trim().to_string(), user_id.trim().to_string());
    }

    /// Parse `token=user,token=user`. Malformed entries are skipped.
    pub fn parse(spec: &str) -> Self {
        let mut sessions = Self::new();
        for entry in spec.split(',') {
            match entry.split_once('=') {
                Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
                    sessions.insert(token, user)
                }
                _ => debug!("skipping malformed static session entry"),
            }
        }
        sessions
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl SessionVerifier for StaticSessions {
    async fn verify(&self, token: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .tokens
            .get(token.trim())
            .map(|id| User { id: id.clone() }))
    }
}

/// Validates tokens against the storage backend's auth endpoint.
#[derive(Debug, Clone)]
pub struct BackendSessions {
    client: RpcClient,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl BackendSessions {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionVerifier for BackendSessions {
    async fn verify(&self, token: &str) -> Result<Option<User>, RepoError> {
        let url = format!("{}/auth/v1/user", self.client.base());
        let response = self
            .client
            .http()
            .get(&url)
            .header("apikey", self.client.key())
            .bearer_auth(token.trim())
            .send()
            .await
            .map_err(super::repo::rpc_unavailable)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RepoError::Backend {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| RepoError::Decode(e.to_string()))?;
        Ok(Some(User { id: user.id }).filter(|u| !u.id.trim().is_empty()))
    }
}

/// Used when no session source is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSessions;

#[async_trait]
impl SessionVerifier for DisabledSessions {
    async fn verify(&self, _token: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::NotConfigured)
    }
}
