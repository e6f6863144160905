//! Scan-stage-commit workflow over one scan root and one state directory.
//!
//! Paths in the store are relative to the scan root and `/`-separated, so
//! the first segment is always the project root.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::core::hash::sha256_hex;
use crate::core::push::resolve;
use crate::core::scanner::{self, is_env_file_name, Project};
use crate::core::store::{Commit, LocalStore};
use crate::error::{Result, StoreError};

/// Where a discovered or staged file stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Never committed and not staged.
    New,
    /// Committed before, changed since, not staged.
    Modified,
    /// Staged and unchanged since staging.
    Staged,
    /// Staged, but the content changed afterwards.
    StaleStage,
    /// Staged, but the file is gone.
    Missing,
    /// Matches the last commit.
    Clean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: String,
    pub state: FileState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Every discovered or staged file, sorted by path.
    pub files: Vec<FileStatus>,
    /// Commits not yet acknowledged by the server.
    pub unpushed: usize,
}

impl Status {
    pub fn count(&self, state: FileState) -> usize {
        self.files.iter().filter(|f| f.state == state).count()
    }
}

pub struct Workspace {
    scan_root: PathBuf,
    store: LocalStore,
}

impl Workspace {
    pub fn new(scan_root: impl Into<PathBuf>, state_dir: &Path) -> Self {
        Self {
            scan_root: scan_root.into(),
            store: LocalStore::open(state_dir),
        }
    }

    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn scan(&self) -> Result<Vec<Project>> {
        Ok(scanner::scan(&self.scan_root)?)
    }

    /// Every discovered secret file as a scan-root-relative path.
    pub fn discover(&self) -> Result<Vec<String>> {
        let root = normalize(&self.scan_root);
        let mut out = Vec::new();
        for project in self.scan()? {
            let project_root = normalize(&project.root_path);
            let prefix = relative_to(&root, &project_root).unwrap_or_default();
            for file in project.env_files {
                out.push(if prefix.is_empty() {
                    file
                } else {
                    format!("{}/{}", prefix, file)
                });
            }
        }
        out.sort();
        Ok(out)
    }

    /// Stage specific files, given as absolute paths or relative to the
    /// current directory. Returns the staged scan-root-relative paths.
    ///
    /// Every path is validated and hashed before anything is staged.
    pub fn stage_files(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        let cwd = std::env::current_dir()?;
        let root = normalize(&self.scan_root);

        let mut rels = Vec::with_capacity(paths.len());
        for path in paths {
            let abs = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            let rel = relative_to(&root, &normalize(&abs))
                .filter(|rel| !rel.is_empty())
                .ok_or_else(|| StoreError::OutsideScanRoot(path.display().to_string()))?;
            let name = rel.rsplit('/').next().unwrap_or(&rel);
            if !is_env_file_name(name) {
                return Err(StoreError::NotEnvFile(rel).into());
            }
            rels.push(rel);
        }

        self.stage_rel(rels)
    }

    /// Scan and stage every discovered secret file.
    pub fn stage_all(&self) -> Result<Vec<String>> {
        let rels = self.discover()?;
        self.stage_rel(rels)
    }

    fn stage_rel(&self, rels: Vec<String>) -> Result<Vec<String>> {
        let hashed = rels
            .into_iter()
            .map(|rel| {
                let hash = self.hash(&rel)?;
                Ok((rel, hash))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        self.store.stage_many(&hashed)?;
        info!(files = hashed.len(), "staged");
        Ok(hashed.into_keys().collect())
    }

    fn hash(&self, rel: &str) -> Result<String> {
        let path = resolve(&self.scan_root, rel);
        let bytes = fs::read(&path).map_err(|source| StoreError::Read { path, source })?;
        Ok(sha256_hex(&bytes))
    }

    /// Commit everything staged.
    ///
    /// Each staged file is re-hashed first; if any changed since it was
    /// staged the commit is refused and staging is left untouched.
    pub fn commit(&self, message: &str) -> Result<Commit> {
        if message.trim().is_empty() {
            return Err(StoreError::EmptyMessage.into());
        }
        let staged = self.store.load()?.unwrap_or_default().staged;
        if staged.is_empty() {
            return Err(StoreError::NothingStaged.into());
        }

        for (path, hash) in &staged {
            if self.hash(path)? != *hash {
                return Err(StoreError::StaleStage { path: path.clone() }.into());
            }
        }

        let commit = self.store.commit(message, &staged)?;
        info!(id = %commit.id, files = commit.files.len(), "committed");
        Ok(commit)
    }

    pub fn status(&self) -> Result<Status> {
        let staged = self.store.load()?.unwrap_or_default().staged;
        let commits = self.store.commits().list()?;

        let mut last_committed: BTreeMap<&str, &str> = BTreeMap::new();
        for commit in &commits {
            for (path, hash) in &commit.files {
                last_committed.insert(path, hash);
            }
        }

        let mut paths: BTreeSet<String> = self.discover()?.into_iter().collect();
        paths.extend(staged.keys().cloned());

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let current = match self.hash(&path) {
                Ok(hash) => Some(hash),
                Err(crate::error::Error::Store(StoreError::Read { source, .. }))
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    None
                }
                Err(e) => return Err(e),
            };

            let state = match (staged.get(&path), current.as_deref()) {
                (Some(_), None) => FileState::Missing,
                (Some(s), Some(c)) if s == c => FileState::Staged,
                (Some(_), Some(_)) => FileState::StaleStage,
                (None, None) => continue,
                (None, Some(c)) => match last_committed.get(path.as_str()) {
                    None => FileState::New,
                    Some(&h) if h == c => FileState::Clean,
                    Some(_) => FileState::Modified,
                },
            };
            files.push(FileStatus { path, state });
        }

        let pushed = self.store.pushed().load()?;
        let unpushed = commits.iter().filter(|c| !pushed.contains(&c.id)).count();

        Ok(Status { files, unpushed })
    }

    /// Commits not yet acknowledged by the server, oldest first.
    pub fn unpushed(&self) -> Result<Vec<Commit>> {
        let pushed = self.store.pushed().load()?;
        let commits = self.store.commits().list()?;
        debug!(total = commits.len(), pushed = pushed.len(), "checking unpushed commits");
        Ok(commits
            .into_iter()
            .filter(|c| !pushed.contains(&c.id))
            .collect())
    }

    pub fn mark_pushed(&self, id: &str) -> Result<()> {
        self.store.pushed().mark(id)
    }
}

/// Resolve symlinks where the path exists, otherwise normalize lexically.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// `path` relative to `root` as a `/`-separated string, if it is inside.
fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
