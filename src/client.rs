//! Sync server HTTP client.
//!
//! Every call carries the configured timeout. Pushes are additionally signed
//! with the device key; reads only need the session token.

use std::time::Duration;

use reqwest::{header, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::core::constants;
use crate::core::identity::DeviceIdentity;
use crate::core::signing::sign_request;
use crate::core::types::{FileInfo, ProjectInfo, PushRequest, PushResult};
use crate::error::{ClientError, Result};

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY: usize = 512;

pub struct SyncClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl SyncClient {
    /// Client for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sentra/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base, path))
            .map_err(|e| ClientError::Decode(format!("bad request URL: {}", e)).into())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.token)
    }

    pub async fn projects(&self) -> Result<Vec<ProjectInfo>> {
        let url = self.url("/projects")?;
        let response = send(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    /// Files stored for `root`, optionally as of commit `at`.
    pub async fn files(&self, root: &str, at: Option<&str>) -> Result<Vec<FileInfo>> {
        let mut url = self.url("/files")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("root", root);
            if let Some(at) = at {
                query.append_pair("at", at);
            }
        }
        let response = send(self.request(Method::GET, url)).await?;
        decode(response).await
    }

    /// Send one signed push request.
    pub async fn push(
        &self,
        identity: &DeviceIdentity,
        request: &PushRequest,
    ) -> Result<PushResult> {
        let url = self.url("/push")?;
        let body = serde_json::to_vec(request).map_err(crate::error::PushError::Encode)?;
        let signed = sign_request(identity, "POST", url.path(), &body);

        debug!(
            root = %request.project.root,
            files = request.files.len(),
            client_id = %request.commit.client_id,
            "pushing"
        );

        let builder = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(constants::HEADER_MACHINE_ID, signed.machine_id)
            .header(constants::HEADER_TIMESTAMP, signed.timestamp)
            .header(constants::HEADER_SIGNATURE, signed.signature)
            .body(body);

        let response = send(builder).await?;
        decode(response).await
    }
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e)
        }
    })?;

    let status = response.status();
    trace!(status = status.as_u16(), "response");
    if status.is_success() {
        return Ok(response);
    }

    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
        StatusCode::SERVICE_UNAVAILABLE => ClientError::Unavailable,
        _ => {
            let body = response.text().await.unwrap_or_default();
            ClientError::Status {
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY).to_string(),
            }
        }
    };
    Err(err.into())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(e)
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()).into())
}

/// Cut `s` to at most `max` bytes on a character boundary.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
