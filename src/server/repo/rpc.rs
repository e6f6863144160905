//! PostgREST-style RPC backend.
//!
//! Each operation is one stored function called as
//! `POST {base}/rest/v1/rpc/{function}` with a JSON object of `p_*`
//! arguments. RPC results come back as JSON arrays.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{require, Repository};
use crate::client::truncate;
use crate::core::types::{FileInfo, ProjectInfo, PushRequest, PushResult};
use crate::error::RepoError;

const MAX_ERROR_BODY: usize = 4000;

/// Authenticated HTTP access to the storage backend.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base: String,
    key: String,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").field("base", &self.base).finish_non_exhaustive()
    }
}

impl RpcClient {
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self, RepoError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            base: base_url.trim().trim_end_matches('/').to_string(),
            key: key.trim().to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Call stored function `function` and return the raw response body.
    pub async fn call(&self, function: &str, args: &Value) -> Result<Vec<u8>, RepoError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base, function);
        debug!(function, "rpc call");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(header::ACCEPT, "application/json")
            .header("Prefer", "return=representation")
            .json(args)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.bytes().await.map_err(unavailable)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            warn!(function, status = status.as_u16(), "rpc call failed");
            return Err(RepoError::Backend {
                status: status.as_u16(),
                body: truncate(text.trim(), MAX_ERROR_BODY).to_string(),
            });
        }
        Ok(body.to_vec())
    }
}

pub(crate) fn unavailable(e: reqwest::Error) -> RepoError {
    RepoError::Unavailable(e.to_string())
}

fn parse<T: DeserializeOwned>(function: &str, body: &[u8]) -> Result<T, RepoError> {
    serde_json::from_slice(body).map_err(|e| RepoError::Decode(format!("{}: {}", function, e)))
}

/// Stored function names.
#[derive(Debug, Clone)]
pub struct RpcFunctions {
    pub projects: String,
    pub files: String,
    pub push: String,
    pub device_pub_key: String,
}

impl Default for RpcFunctions {
    fn default() -> Self {
        Self {
            projects: "sentra_projects_v1".to_string(),
            files: "sentra_files_v1".to_string(),
            push: "sentra_push_v1".to_string(),
            device_pub_key: "sentra_device_pubkey_v1".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcRepository {
    client: RpcClient,
    functions: RpcFunctions,
}

impl RpcRepository {
    pub fn new(client: RpcClient, functions: RpcFunctions) -> Self {
        Self { client, functions }
    }
}

#[async_trait]
impl Repository for RpcRepository {
    async fn list_projects(&self, user_id: &str) -> Result<Vec<ProjectInfo>, RepoError> {
        require("user_id", user_id)?;
        let function = &self.functions.projects;
        let body = self
            .client
            .call(function, &json!({ "p_user_id": user_id.trim() }))
            .await?;
        parse(function, &body)
    }

    async fn list_files(
        &self,
        user_id: &str,
        root: &str,
        at: Option<&str>,
    ) -> Result<Vec<FileInfo>, RepoError> {
        require("user_id", user_id)?;
        require("root", root)?;
        let function = &self.functions.files;
        let args = json!({
            "p_user_id": user_id.trim(),
            "p_root": root.trim(),
            "p_at": at.map(str::trim).unwrap_or(""),
        });
        let body = self.client.call(function, &args).await?;
        parse(function, &body)
    }

    async fn push(&self, user_id: &str, payload: &PushRequest) -> Result<PushResult, RepoError> {
        require("user_id", user_id)?;
        let function = &self.functions.push;
        let args = json!({ "p_user_id": user_id.trim(), "p_payload": payload });
        let body = self.client.call(function, &args).await?;

        let rows: Vec<PushResult> = parse(function, &body)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::Decode(format!("{}: empty result", function)))
    }

    async fn device_pub_key(
        &self,
        user_id: &str,
        machine_id: &str,
    ) -> Result<Option<String>, RepoError> {
        require("user_id", user_id)?;
        require("machine_id", machine_id)?;
        let function = &self.functions.device_pub_key;
        let args = json!({ "p_user_id": user_id.trim(), "p_machine_id": machine_id.trim() });
        let body = self.client.call(function, &args).await?;
        let value: Value = parse(function, &body)?;
        Ok(extract_pub_key(value))
    }
}

/// Pull a public key out of a scalar or single-row RPC result.
fn extract_pub_key(value: Value) -> Option<String> {
    match value {
        Value::String(key) => Some(key.trim().to_string()).filter(|k| !k.is_empty()),
        Value::Array(rows) => rows.into_iter().next().and_then(extract_pub_key),
        Value::Object(mut row) => ["pub_key", "public_key", "sentra_device_pubkey_v1"]
            .iter()
            .find_map(|field| row.remove(*field))
            .and_then(extract_pub_key),
        _ => None,
    }
}
