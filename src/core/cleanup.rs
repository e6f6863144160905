//! Removal of files left behind by older releases.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::constants;
use crate::error::Result;

/// How to treat failures while removing legacy files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Log and continue on any failure.
    BestEffort,
    /// Fail on anything except a file that is already gone.
    Strict,
}

/// Legacy session files inside `state_dir`.
pub fn legacy_session_files(state_dir: &Path) -> Vec<PathBuf> {
    constants::LEGACY_SESSION_FILES
        .iter()
        .map(|name| state_dir.join(name))
        .collect()
}

/// Remove each of `paths`, returning how many were actually deleted.
///
/// A missing file is never an error under either policy.
pub fn remove_legacy_files(paths: &[PathBuf], policy: CleanupPolicy) -> Result<usize> {
    let mut removed = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed legacy file");
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => match policy {
                CleanupPolicy::BestEffort => {
                    warn!(path = %path.display(), error = %e, "could not remove legacy file");
                }
                CleanupPolicy::Strict => return Err(e.into()),
            },
        }
    }
    Ok(removed)
}
