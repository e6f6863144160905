//! Server configuration from the environment.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::auth::{BackendSessions, DisabledSessions, SessionVerifier, StaticSessions};
use super::repo::{
    DisabledRepository, MemoryRepository, Repository, RpcClient, RpcFunctions, RpcRepository,
};
use super::AppState;
use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Environment variables read by the server.
pub mod env {
    pub const LISTEN_ADDR: &str = "SENTRA_LISTEN_ADDR";
    pub const PORT: &str = "SERVER_PORT";
    pub const BACKEND: &str = "SENTRA_BACKEND";
    pub const BACKEND_URL: &str = "SENTRA_BACKEND_URL";
    pub const BACKEND_KEY: &str = "SENTRA_BACKEND_KEY";
    pub const BACKEND_TIMEOUT_SECS: &str = "SENTRA_BACKEND_TIMEOUT_SECS";
    pub const STATIC_SESSIONS: &str = "SENTRA_STATIC_SESSIONS";
    pub const STATIC_DEVICES: &str = "SENTRA_STATIC_DEVICES";
    pub const LOG_FORMAT: &str = "SENTRA_LOG_FORMAT";
}

/// Which storage backend serves requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// No storage; data routes answer 503.
    Disabled,
    /// PostgREST-style RPC at `url`, authenticated with `key`.
    Rpc { url: String, key: String },
    /// In-process storage, lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub backend: Backend,
    pub backend_timeout: Duration,
    /// `token=user` pairs.
    pub static_sessions: Option<String>,
    /// `user:machine:public_key` triples, memory backend only.
    pub static_devices: Option<String>,
    pub json_logs: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Fails fast on invalid values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host: IpAddr = match var(env::LISTEN_ADDR) {
            Some(addr) => addr.parse().map_err(|_| ConfigError::InvalidValue {
                field: env::LISTEN_ADDR,
                reason: format!("not an IP address: {}", addr),
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port: u16 = var(env::PORT)
            .unwrap_or_else(|| constants::DEFAULT_SERVER_PORT.to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: env::PORT,
                reason: format!("{}", e),
            })?;

        let backend = match var(env::BACKEND).as_deref() {
            None | Some("disabled") => Backend::Disabled,
            Some("memory") => Backend::Memory,
            Some("rpc") => {
                let url = var(env::BACKEND_URL).ok_or(ConfigError::InvalidValue {
                    field: env::BACKEND_URL,
                    reason: "required for the rpc backend".to_string(),
                })?;
                let key = var(env::BACKEND_KEY).ok_or(ConfigError::InvalidValue {
                    field: env::BACKEND_KEY,
                    reason: "required for the rpc backend".to_string(),
                })?;
                Backend::Rpc { url, key }
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: env::BACKEND,
                    reason: format!(
                        "unknown backend '{}' (expected rpc, memory or disabled)",
                        other
                    ),
                }
                .into())
            }
        };

        let timeout_secs = match var(env::BACKEND_TIMEOUT_SECS) {
            Some(v) => v.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: env::BACKEND_TIMEOUT_SECS,
                    reason: format!("expected a positive number of seconds, got {}", v),
                }
            })?,
            None => constants::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            listen: SocketAddr::new(host, port),
            backend,
            backend_timeout: Duration::from_secs(timeout_secs),
            static_sessions: var(env::STATIC_SESSIONS),
            static_devices: var(env::STATIC_DEVICES),
            json_logs: var(env::LOG_FORMAT).is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Construct the repository and session verifier.
    pub async fn build_state(&self) -> Result<AppState> {
        let static_sessions = self
            .static_sessions
            .as_deref()
            .map(StaticSessions::parse)
            .filter(|s| !s.is_empty());

        let mut backend_sessions: Option<Arc<dyn SessionVerifier>> = None;
        let repo: Arc<dyn Repository> = match &self.backend {
            Backend::Disabled => Arc::new(DisabledRepository),
            Backend::Memory => {
                let repo = MemoryRepository::new();
                let devices = self.static_devices.as_deref().unwrap_or("");
                for (user, machine, key) in parse_devices(devices) {
                    repo.register_device(user, machine, key).await;
                }
                Arc::new(repo)
            }
            Backend::Rpc { url, key } => {
                let client = RpcClient::new(url, key, self.backend_timeout)?;
                backend_sessions = Some(Arc::new(BackendSessions::new(client.clone())));
                Arc::new(RpcRepository::new(client, RpcFunctions::default()))
            }
        };

        let sessions: Arc<dyn SessionVerifier> = match (static_sessions, backend_sessions) {
            (Some(s), _) => Arc::new(s),
            (None, Some(backend)) => backend,
            (None, None) => Arc::new(DisabledSessions),
        };

        info!(backend = self.backend_name(), "storage backend ready");
        Ok(AppState { repo, sessions })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Disabled => "disabled",
            Backend::Rpc { .. } => "rpc",
            Backend::Memory => "memory",
        }
    }
}

/// Parse `user:machine:key` triples separated by commas.
fn parse_devices(spec: &str) -> Vec<(&str, &str, &str)> {
    spec.split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(u), Some(m), Some(k)) if !u.is_empty() && !m.is_empty() && !k.is_empty() => {
                    Some((u, m, k))
                }
                _ => None,
            }
        })
        .collect()
}
