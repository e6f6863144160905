//! Record of commits the sync server has acknowledged.

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{read_json, write_atomic};
use crate::error::{Result, StoreError};

/// Commit IDs whose every push request got a success response.
#[derive(Debug)]
pub struct PushedLedger {
    path: PathBuf,
}

impl PushedLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<BTreeSet<String>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.load()?.contains(id))
    }

    /// Record `id` as applied on the server.
    pub fn mark(&self, id: &str) -> Result<()> {
        let mut ids = self.load()?;
        if ids.insert(id.to_string()) {
            let json = serde_json::to_vec_pretty(&ids).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
            write_atomic(&self.path, &json)?;
        }
        Ok(())
    }
}
