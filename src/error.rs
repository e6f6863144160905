//! Error types.
//!
//! Each domain gets its own enum; [`Error`] wraps them so callers can
//! propagate with `?` and still match on the specific failure.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Push(#[from] PushError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Configuration errors. Never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid server URL: {0}")]
    InvalidServerUrl(String),

    #[error("insecure connection: HTTP is only allowed for localhost connections")]
    InsecureServerUrl,

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("not logged in")]
    NotLoggedIn,
}

/// Filesystem scan errors. A scan that fails returns no projects at all.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Local staging and commit store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("commit message cannot be empty")]
    EmptyMessage,

    #[error("nothing to commit (no staged env files)")]
    NothingStaged,

    #[error("{path} changed since it was staged")]
    StaleStage { path: String },

    #[error("not an env file: {0}")]
    NotEnvFile(String),

    #[error("path escapes the scan root: {0}")]
    OutsideScanRoot(String),

    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Envelope encryption errors. Always fatal: there is no plaintext fallback.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid encryption key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("corrupt installation key: {0}")]
    CorruptKey(String),

    #[error("randomness source failed: {0}")]
    Rng(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("failed to access key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Device identity and request signing errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("corrupt device key: {0}")]
    CorruptKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding")]
    InvalidSignatureEncoding,

    #[error("signature verification failed")]
    BadSignature,

    #[error("failed to access identity file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Push request construction errors.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("cannot determine project.root")]
    NoProjectRoot,

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode push request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sync server client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("server unavailable, retry later")]
    Unavailable,

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Server-side storage backend errors.
///
/// `NotConfigured` and `Unavailable` are the "retry later" cases and map to
/// 503; everything else is a failed request.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("storage backend not configured")]
    NotConfigured,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("invalid backend response: {0}")]
    Decode(String),
}

impl RepoError {
    /// Whether the caller should retry later rather than re-authenticate.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
