use async_trait::async_trait;

use super::Repository;
use crate::core::types::{FileInfo, ProjectInfo, PushRequest, PushResult};
use crate::error::RepoError;

/// Backend used when no storage is configured. Every call fails with
/// [`RepoError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRepository;

#[async_trait]
impl Repository for DisabledRepository {
    async fn list_projects(&self, _user_id: &str) -> Result<Vec<ProjectInfo>, RepoError> {
        Err(RepoError::NotConfigured)
    }

    async fn list_files(
        &self,
        _user_id: &str,
        _root: &str,
        _at: Option<&str>,
    ) -> Result<Vec<FileInfo>, RepoError> {
        Err(RepoError::NotConfigured)
    }

    async fn push(&self, _user_id: &str, _payload: &PushRequest) -> Result<PushResult, RepoError> {
        Err(RepoError::NotConfigured)
    }

    async fn device_pub_key(
        &self,
        _user_id: &str,
        _machine_id: &str,
    ) -> Result<Option<String>, RepoError> {
        Err(RepoError::NotConfigured)
    }
}
