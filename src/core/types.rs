//! Wire types shared by the sync client and server.
//!
//! Field names match the JSON the server and its storage backend exchange,
//! so these types serialize directly onto the wire.

use serde::{Deserialize, Serialize};

/// One project's worth of a commit, ready to push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Payload version, always 1.
    pub v: u32,
    pub project: PushProject,
    pub machine: PushMachine,
    pub commit: PushCommit,
    pub files: Vec<PushFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushProject {
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMachine {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    /// Idempotency key. Always a UUID.
    pub client_id: String,
    pub message: String,
}

/// An encrypted file inside a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFile {
    pub path: String,
    /// SHA-256 of the plaintext, hex.
    pub sha256: String,
    /// Length of the sealed blob in bytes.
    pub size: usize,
    pub encrypted: bool,
    pub cipher: String,
    pub blob: String,
}

/// Server acknowledgement of a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResult {
    #[serde(rename = "out_project_id")]
    pub project_id: String,
    #[serde(rename = "out_commit_id")]
    pub commit_id: String,
    pub received_at: String,
    /// True when the idempotency key had already been applied.
    pub deduped: bool,
}

/// A project as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub root_path: String,
    #[serde(default)]
    pub last_commit_id: String,
    #[serde(default)]
    pub last_commit_message: String,
    #[serde(default)]
    pub file_count: usize,
}

/// A stored file version as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub commit_id: String,
    pub file_path: String,
    pub sha256: String,
    pub size: usize,
}
