//! In-process backend for local development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{require, Repository};
use crate::core::types::{FileInfo, ProjectInfo, PushFile, PushRequest, PushResult};
use crate::error::RepoError;

struct StoredCommit {
    commit_id: String,
    client_id: String,
    message: String,
    files: Vec<PushFile>,
}

struct StoredProject {
    id: String,
    commits: Vec<StoredCommit>,
}

impl StoredProject {
    /// Latest version of every file, up to and including commit `at`.
    fn snapshot(&self, at: Option<&str>) -> Option<BTreeMap<&str, FileInfo>> {
        let end = match at {
            None => self.commits.len(),
            Some(at) => {
                self.commits
                    .iter()
                    .position(|c| c.commit_id == at || c.client_id == at)?
                    + 1
            }
        };

        let mut files = BTreeMap::new();
        for commit in &self.commits[..end] {
            for file in &commit.files {
                files.insert(
                    file.path.as_str(),
                    FileInfo {
                        commit_id: commit.commit_id.clone(),
                        file_path: file.path.clone(),
                        sha256: file.sha256.clone(),
                        size: file.size,
                    },
                );
            }
        }
        Some(files)
    }
}

#[derive(Default)]
struct State {
    /// (user, machine) → public key.
    devices: HashMap<(String, String), String>,
    /// (user, root) → project.
    projects: BTreeMap<(String, String), StoredProject>,
    /// (user, root, client_id) → first result.
    applied: HashMap<(String, String, String), PushResult>,
}

/// Backend holding everything in memory behind one lock, so concurrent
/// pushes with the same key converge on a single stored commit.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a device with a user.
    pub async fn register_device(&self, user_id: &str, machine_id: &str, public_key: &str) {
        let mut state = self.state.lock().await;
        state.devices.insert(
            (user_id.trim().to_string(), machine_id.trim().to_string()),
            public_key.trim().to_string(),
        );
        debug!(user_id, machine_id, "device registered");
    }

    /// Number of commits stored for a project.
    pub async fn commit_count(&self, user_id: &str, root: &str) -> usize {
        let state = self.state.lock().await;
        state
            .projects
            .get(&(user_id.to_string(), root.to_string()))
            .map_or(0, |p| p.commits.len())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_projects(&self, user_id: &str) -> Result<Vec<ProjectInfo>, RepoError> {
        require("user_id", user_id)?;
        let state = self.state.lock().await;

        Ok(state
            .projects
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, root), project)| {
                let last = project.commits.last();
                ProjectInfo {
                    root_path: root.clone(),
                    last_commit_id: last.map(|c| c.commit_id.clone()).unwrap_or_default(),
                    last_commit_message: last.map(|c| c.message.clone()).unwrap_or_default(),
                    file_count: project.snapshot(None).map_or(0, |files| files.len()),
                }
            })
            .collect())
    }

    async fn list_files(
        &self,
        user_id: &str,
        root: &str,
        at: Option<&str>,
    ) -> Result<Vec<FileInfo>, RepoError> {
        require("user_id", user_id)?;
        require("root", root)?;
        let state = self.state.lock().await;

        let Some(project) = state.projects.get(&(user_id.to_string(), root.to_string())) else {
            return Ok(Vec::new());
        };
        Ok(project
            .snapshot(at.map(str::trim).filter(|a| !a.is_empty()))
            .map(|files| files.into_values().collect())
            .unwrap_or_default())
    }

    async fn push(&self, user_id: &str, payload: &PushRequest) -> Result<PushResult, RepoError> {
        require("user_id", user_id)?;
        require("project.root", &payload.project.root)?;
        require("commit.client_id", &payload.commit.client_id)?;

        let user = user_id.to_string();
        let root = payload.project.root.clone();
        let key = (user.clone(), root.clone(), payload.commit.client_id.clone());

        let mut state = self.state.lock().await;
        if let Some(previous) = state.applied.get(&key) {
            debug!(client_id = %payload.commit.client_id, "push deduped");
            return Ok(PushResult {
                deduped: true,
                ..previous.clone()
            });
        }

        let project = state
            .projects
            .entry((user, root))
            .or_insert_with(|| StoredProject {
                id: Uuid::new_v4().to_string(),
                commits: Vec::new(),
            });

        let commit_id = Uuid::new_v4().to_string();
        project.commits.push(StoredCommit {
            commit_id: commit_id.clone(),
            client_id: payload.commit.client_id.clone(),
            message: payload.commit.message.clone(),
            files: payload.files.clone(),
        });

        let result = PushResult {
            project_id: project.id.clone(),
            commit_id,
            received_at: Utc::now().to_rfc3339(),
            deduped: false,
        };
        state.applied.insert(key, result.clone());
        Ok(result)
    }

    async fn device_pub_key(
        &self,
        user_id: &str,
        machine_id: &str,
    ) -> Result<Option<String>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .devices
            .get(&(user_id.trim().to_string(), machine_id.trim().to_string()))
            .cloned())
    }
}
