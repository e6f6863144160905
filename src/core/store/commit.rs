//! Commit snapshots and history.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{read_json, write_atomic};
use crate::error::{Result, StoreError};

/// An immutable snapshot of staged files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Random UUID, independent of content.
    pub id: String,
    pub message: String,
    /// Path → plaintext SHA-256.
    pub files: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Commit {
    /// Create a commit with a fresh ID.
    pub fn new(message: &str, files: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            files,
            created_at: Utc::now(),
        }
    }

    /// First eight characters of the ID, for display.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(end, _)| &id[..end])
}

/// Append-only commit history, one JSON file per commit.
#[derive(Debug)]
pub struct CommitLog {
    dir: PathBuf,
}

impl CommitLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{}.json", id)))
    }

    /// Store `commit`. Storing the same ID again overwrites it, which keeps
    /// retries after a partial failure safe.
    pub fn save(&self, commit: &Commit) -> Result<()> {
        let path = self
            .path_for(&commit.id)
            .ok_or_else(|| StoreError::InvalidCommitId(commit.id.clone()))?;
        let json = serde_json::to_vec_pretty(commit).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &json)?;
        Ok(())
    }

    /// Load one commit by ID.
    pub fn get(&self, id: &str) -> Result<Commit> {
        let path = self
            .path_for(id)
            .ok_or_else(|| StoreError::CommitNotFound(id.to_string()))?;
        read_json(&path)?.ok_or_else(|| StoreError::CommitNotFound(id.to_string()).into())
    }

    /// All commits, oldest first.
    pub fn list(&self) -> Result<Vec<Commit>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.dir.clone(),
                    source,
                }
                .into())
            }
        };

        let mut commits = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StoreError::Read {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(commit) = read_json::<Commit>(&path)? {
                commits.push(commit);
            }
        }

        commits.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(commits)
    }
}
