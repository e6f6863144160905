//! Project and secret file discovery.
//!
//! Scanning runs in two passes. The first finds project roots (directories
//! holding a `.git` marker) below the scan root. The second walks each
//! project, honoring its ignore files, and collects `.env*` files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::core::constants;
use crate::core::ignore::{IgnoreScope, IgnoreStack};
use crate::error::ScanError;

/// A project root and the secret files found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Absolute path of the project root.
    pub root_path: PathBuf,
    /// Secret files relative to the root, `/`-separated and sorted.
    pub env_files: Vec<String>,
}

/// Scan `scan_root` for projects and their secret files.
///
/// Projects are sorted by root path. Any read failure aborts the scan.
pub fn scan(scan_root: &Path) -> Result<Vec<Project>, ScanError> {
    let metadata = fs::metadata(scan_root).map_err(|source| ScanError::Io {
        path: scan_root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(scan_root.to_path_buf()));
    }

    let mut roots = find_project_roots(scan_root)?;
    roots.sort();
    debug!(root = %scan_root.display(), projects = roots.len(), "found project roots");

    roots
        .into_iter()
        .map(|root_path| {
            let env_files = scan_project_env_files(&root_path)?;
            Ok(Project {
                root_path,
                env_files,
            })
        })
        .collect()
}

/// Find every directory below `scan_root` that holds a project marker.
///
/// A project root's own subtree is not searched further, so repositories
/// nested inside a project are never reported separately.
pub fn find_project_roots(scan_root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut roots = Vec::new();
    walk_roots(scan_root, &mut roots)?;
    Ok(roots)
}

fn walk_roots(dir: &Path, roots: &mut Vec<PathBuf>) -> Result<(), ScanError> {
    let entries = read_entries(dir)?;

    if entries
        .iter()
        .any(|entry| entry.name == constants::PROJECT_MARKER && !entry.kind.is_symlink())
    {
        trace!(path = %dir.display(), "project root");
        roots.push(dir.to_path_buf());
        return Ok(());
    }

    for entry in entries {
        if !entry.kind.is_dir() || is_ignored_dir_name(&entry.name) {
            continue;
        }
        walk_roots(&entry.path, roots)?;
    }

    Ok(())
}

/// Collect secret files in one project, honoring its ignore files.
pub fn scan_project_env_files(project_root: &Path) -> Result<Vec<String>, ScanError> {
    let mut env_files = Vec::new();
    let mut stack = IgnoreStack::new();
    walk_project(project_root, "", &mut stack, &mut env_files)?;
    env_files.sort();
    Ok(env_files)
}

fn walk_project(
    dir: &Path,
    rel: &str,
    stack: &mut IgnoreStack,
    env_files: &mut Vec<String>,
) -> Result<(), ScanError> {
    let scope = IgnoreScope::load(dir, rel)?;
    let mut stack = stack.enter(scope);

    for entry in read_entries(dir)? {
        let child_rel = if rel.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", rel, entry.name)
        };

        if entry.kind.is_dir() {
            if is_ignored_dir_name(&entry.name) || stack.is_ignored(&child_rel, true) {
                continue;
            }
            walk_project(&entry.path, &child_rel, &mut stack, env_files)?;
        } else if entry.kind.is_file() || entry.kind.is_symlink() {
            if stack.is_ignored(&child_rel, false) {
                trace!(path = %child_rel, "ignored");
                continue;
            }
            if is_env_file_name(&entry.name) {
                env_files.push(child_rel);
            }
        }
    }

    Ok(())
}

/// Built-in directory names that are never walked.
pub fn is_ignored_dir_name(name: &str) -> bool {
    constants::IGNORED_DIRS.contains(&name)
}

/// Whether a file name marks a secret file (`.env`, `.env.local`, ...).
pub fn is_env_file_name(name: &str) -> bool {
    name.starts_with(constants::ENV_FILE_PREFIX)
}

struct Entry {
    name: String,
    path: PathBuf,
    kind: fs::FileType,
}

/// Read a directory's entries sorted by name. Symlinks are reported with
/// their own file type and never followed.
fn read_entries(dir: &Path) -> Result<Vec<Entry>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let kind = entry.file_type().map_err(io_err)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "skipping non-UTF-8 file name");
            continue;
        };
        entries.push(Entry {
            name,
            path: entry.path(),
            kind,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
