//! Client configuration.
//!
//! Handles reading, writing, and validating `config.toml` in the state
//! directory, and resolving the effective [`Settings`] once environment
//! overrides are applied.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Environment variables read by the client.
pub mod env {
    pub const SERVER_URL: &str = "SENTRA_SERVER_URL";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const SCAN_ROOT: &str = "SENTRA_SCAN_ROOT";
    pub const SESSION_TOKEN: &str = "SENTRA_SESSION_TOKEN";
}

/// Persisted client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sync server base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// Directory scanned for projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_root: Option<PathBuf>,
    /// Human-readable name sent with pushes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    /// Timeout for every request to the sync server.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token identifying the user to the sync server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            scan_root: None,
            machine_name: None,
            timeout_secs: default_timeout_secs(),
            session_token: None,
        }
    }
}

/// Resolve the state directory: `$SENTRA_HOME`, else `~/.sentra`.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(constants::STATE_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(constants::STATE_DIR))
}

impl Config {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(constants::CONFIG_FILE)
    }

    /// Load `config.toml`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and any validation
    /// failure from [`Config::validate`].
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = Self::path(state_dir);
        debug!(path = %path.display(), "loading config");

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::ReadFile(e).into()),
        };

        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to `config.toml`. The file holds the session token, so it is
    /// written owner-only.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        fs::create_dir_all(state_dir)?;
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(Self::path(state_dir))?;
        file.write_all(contents.as_bytes())?;
        debug!("config saved");
        Ok(())
    }

    /// Validate field values.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` for a zero timeout or blank machine name,
    /// and the server URL errors from [`validate_server_url`].
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if let Some(name) = &self.machine_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "machine_name",
                    reason: "cannot be blank".to_string(),
                }
                .into());
            }
        }
        if let Some(url) = &self.server_url {
            validate_server_url(url)?;
        }
        Ok(())
    }
}

/// Effective client settings after environment overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub scan_root: PathBuf,
    pub machine_name: String,
    pub timeout: Duration,
    pub session_token: Option<String>,
}

impl Settings {
    /// Load the config file and apply the process environment.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config = Config::load(state_dir)?;
        Self::resolve(&config, |name| std::env::var(name).ok())
    }

    /// Merge `config` with variables from `lookup`. Environment wins.
    pub fn resolve(config: &Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let server_url = match var(env::SERVER_URL).or_else(|| config.server_url.clone()) {
            Some(url) => validate_server_url(&url)?,
            None => {
                let port = var(env::SERVER_PORT)
                    .unwrap_or_else(|| constants::DEFAULT_SERVER_PORT.to_string());
                format!("http://127.0.0.1:{}", port)
            }
        };

        let scan_root = match var(env::SCAN_ROOT)
            .map(PathBuf::from)
            .or_else(|| config.scan_root.clone())
        {
            Some(root) => root,
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(constants::DEFAULT_SCAN_DIR),
        };

        let machine_name = config
            .machine_name
            .clone()
            .unwrap_or_else(default_machine_name);

        let session_token = var(env::SESSION_TOKEN).or_else(|| {
            config
                .session_token
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        });

        Ok(Self {
            server_url,
            scan_root,
            machine_name,
            timeout: Duration::from_secs(config.timeout_secs),
            session_token,
        })
    }

    /// The session token, or `ConfigError::NotLoggedIn`.
    pub fn require_session(&self) -> Result<&str> {
        self.session_token
            .as_deref()
            .ok_or_else(|| ConfigError::NotLoggedIn.into())
    }
}

fn default_machine_name() -> String {
    whoami::fallible::hostname().unwrap_or_else(|_| whoami::devicename())
}

/// Validate a sync server URL and return it without trailing slashes.
///
/// Only `http` and `https` are accepted, and plain `http` only for loopback
/// hosts.
pub fn validate_server_url(raw: &str) -> std::result::Result<String, ConfigError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidServerUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidServerUrl(format!(
                "unsupported scheme: {}",
                other
            )))
        }
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigError::InvalidServerUrl("missing host".to_string()))?;

    if url.scheme() == "http" && !is_loopback_host(host) {
        return Err(ConfigError::InsecureServerUrl);
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn is_loopback_host(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    if host == "localhost" {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
