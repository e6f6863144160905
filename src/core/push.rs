//! Push request construction.
//!
//! A commit may span several projects. Its files are grouped by project root
//! (the first path segment) and each group becomes one [`PushRequest`], with
//! every file read from disk and sealed under the installation key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::core::cipher::{self, InstallationKey};
use crate::core::constants;
use crate::core::hash::sha256_hex;
use crate::core::store::Commit;
use crate::core::types::{PushCommit, PushFile, PushMachine, PushProject, PushRequest};
use crate::error::{PushError, Result};

/// Build one push request per project root touched by `commit`.
///
/// Roots and paths come out sorted. Files with no resolvable root are
/// skipped; if that leaves nothing, the build fails before reading anything.
///
/// # Errors
///
/// `PushError::NoProjectRoot` when no file has a root, `PushError::Read` when
/// a committed file cannot be read, and any cipher failure.
pub fn build_push_requests(
    scan_root: &Path,
    machine_id: &str,
    machine_name: &str,
    commit: &Commit,
    key: &InstallationKey,
) -> Result<Vec<PushRequest>> {
    let mut by_root: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for path in commit.files.keys() {
        match project_root_from_path(path) {
            Some(root) => by_root.entry(root).or_default().push(path),
            None => debug!(path = %path, "no project root, skipping"),
        }
    }
    if by_root.is_empty() {
        return Err(PushError::NoProjectRoot.into());
    }

    let client_id = idempotency_key(&commit.id);
    let mut requests = Vec::with_capacity(by_root.len());

    for (root, mut paths) in by_root {
        paths.sort_unstable();

        let files = paths
            .into_iter()
            .map(|path| seal_file(scan_root, path, key))
            .collect::<Result<Vec<_>>>()?;

        debug!(root, files = files.len(), client_id = %client_id, "built push request");
        requests.push(PushRequest {
            v: constants::PUSH_VERSION,
            project: PushProject {
                root: root.to_string(),
            },
            machine: PushMachine {
                id: machine_id.to_string(),
                name: machine_name.to_string(),
            },
            commit: PushCommit {
                client_id: client_id.clone(),
                message: commit.message.trim().to_string(),
            },
            files,
        });
    }

    Ok(requests)
}

fn seal_file(scan_root: &Path, path: &str, key: &InstallationKey) -> Result<PushFile> {
    let plaintext = fs::read(resolve(scan_root, path)).map_err(|source| PushError::Read {
        path: path.to_string(),
        source,
    })?;
    let sealed = cipher::encrypt(key, &plaintext)?;

    Ok(PushFile {
        path: path.to_string(),
        sha256: sha256_hex(&plaintext),
        size: sealed.size,
        encrypted: true,
        cipher: sealed.cipher.to_string(),
        blob: sealed.blob,
    })
}

/// Join a `/`-separated relative path onto `base`.
pub fn resolve(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

/// The project root a relative path belongs to: its first segment.
pub fn project_root_from_path(path: &str) -> Option<&str> {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/')
        .next()
        .map(str::trim)
        .filter(|root| !root.is_empty())
}

/// Idempotency key for a commit.
///
/// UUID commit IDs are used as-is. Older releases used non-UUID IDs; those
/// map to a name-based UUID under the OID namespace, so a retried legacy
/// commit always carries the same key.
pub fn idempotency_key(commit_id: &str) -> String {
    let id = commit_id.trim();
    match Uuid::parse_str(id) {
        Ok(_) => id.to_string(),
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string(),
    }
}
