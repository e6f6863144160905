//! Staging index.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, write_atomic};
use crate::error::{Result, StoreError};

/// Files staged for the next commit: path → plaintext SHA-256 at stage time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingIndex {
    #[serde(default)]
    pub staged: BTreeMap<String, String>,
}

impl StagingIndex {
    /// Load the index at `path`; `None` if no index file exists.
    ///
    /// A zero-length file reads as an empty index.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) {
            return Ok(Some(Self::default()));
        }
        Ok(read_json(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &json)?;
        Ok(())
    }

    /// Insert or replace the entry for `path`.
    pub fn stage(&mut self, path: &str, hash: &str) {
        self.staged.insert(path.to_string(), hash.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
