//! Local version store.
//!
//! Two pieces of durable state live in the state directory:
//!
//! - `index.json`: the staging index, the single "what goes into the next
//!   commit" set.
//! - `commits/<id>.json`: append-only commit history, one immutable file
//!   per commit.
//!
//! Committing writes the commit first and clears staging second. A crash in
//! between leaves the files staged (re-committable) rather than lost, and
//! saving the same commit twice is a harmless overwrite.

mod commit;
mod index;
mod pushed;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use commit::{short_id, Commit, CommitLog};
pub use index::StagingIndex;
pub use pushed::PushedLedger;

use crate::core::constants;
use crate::error::{Result, StoreError};

/// Staging index plus commit history rooted at one state directory.
#[derive(Debug)]
pub struct LocalStore {
    index_path: PathBuf,
    commits: CommitLog,
    pushed: PushedLedger,
}

impl LocalStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            index_path: state_dir.join(constants::INDEX_FILE),
            commits: CommitLog::new(state_dir.join(constants::COMMITS_DIR)),
            pushed: PushedLedger::new(state_dir.join(constants::PUSHED_FILE)),
        }
    }

    /// Load the staging index.
    ///
    /// `None` means no index has been written yet; `Some` with an empty map
    /// means an index exists but nothing is staged.
    pub fn load(&self) -> Result<Option<StagingIndex>> {
        StagingIndex::load(&self.index_path)
    }

    /// Stage `path` at `hash`, replacing any earlier entry for the path.
    /// Persisted before returning.
    pub fn stage(&self, path: &str, hash: &str) -> Result<()> {
        self.stage_many(&BTreeMap::from([(path.to_string(), hash.to_string())]))
    }

    /// Stage every `path -> hash` entry with one index write. Either all
    /// entries are persisted or none are.
    pub fn stage_many(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let mut index = self.load()?.unwrap_or_default();
        for (path, hash) in entries {
            index.stage(path, hash);
            debug!(path = %path, hash = %hash, "staged");
        }
        index.save(&self.index_path)
    }

    /// Create a commit from `staged`, store it, then clear staging.
    ///
    /// # Errors
    ///
    /// `StoreError::EmptyMessage` or `StoreError::NothingStaged` before any
    /// I/O; otherwise any failure writing the commit or the index.
    pub fn commit(&self, message: &str, staged: &BTreeMap<String, String>) -> Result<Commit> {
        let message = message.trim();
        if message.is_empty() {
            return Err(StoreError::EmptyMessage.into());
        }
        if staged.is_empty() {
            return Err(StoreError::NothingStaged.into());
        }

        let commit = Commit::new(message, staged.clone());
        self.commits.save(&commit)?;
        debug!(id = %commit.id, files = commit.files.len(), "commit saved");

        StagingIndex::default().save(&self.index_path)?;
        debug!("staging cleared");

        Ok(commit)
    }

    pub fn commits(&self) -> &CommitLog {
        &self.commits
    }

    pub fn pushed(&self) -> &PushedLedger {
        &self.pushed
    }
}

/// Replace `path` with `bytes` via a temporary sibling and rename, so
/// readers never see a half-written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::result::Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(write_err)
}

/// Read a JSON file, returning `None` if it does not exist.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> std::result::Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}
