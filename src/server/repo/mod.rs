//! Storage backends behind the sync server.
//!
//! Handlers only see [`Repository`]. Which implementation sits behind it is
//! decided once at startup.

mod disabled;
mod memory;
mod rpc;

pub use disabled::DisabledRepository;
pub use memory::MemoryRepository;
pub use rpc::{RpcClient, RpcFunctions, RpcRepository};
pub(crate) use rpc::unavailable as rpc_unavailable;

use async_trait::async_trait;

use crate::core::types::{FileInfo, ProjectInfo, PushRequest, PushResult};
use crate::error::RepoError;

/// Storage backend operations used by the server.
///
/// Every method reports an unconfigured backend as
/// [`RepoError::NotConfigured`], never as an empty result.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_projects(&self, user_id: &str) -> Result<Vec<ProjectInfo>, RepoError>;

    /// Files of `root`, as of commit `at` when given, latest otherwise.
    async fn list_files(
        &self,
        user_id: &str,
        root: &str,
        at: Option<&str>,
    ) -> Result<Vec<FileInfo>, RepoError>;

    /// Apply a push at most once per idempotency key.
    async fn push(&self, user_id: &str, payload: &PushRequest) -> Result<PushResult, RepoError>;

    /// Registered public key for a user's machine, `None` if unregistered.
    async fn device_pub_key(
        &self,
        user_id: &str,
        machine_id: &str,
    ) -> Result<Option<String>, RepoError>;
}

fn require(field: &str, value: &str) -> Result<(), RepoError> {
    if value.trim().is_empty() {
        return Err(RepoError::Invalid(format!("missing {}", field)));
    }
    Ok(())
}
