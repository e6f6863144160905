//! Shared setup for commands: state directory, settings, workspace, client.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::client::SyncClient;
use crate::core::config::{self, Settings};
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};

pub struct Context {
    state_dir: PathBuf,
    settings: Settings,
}

impl Context {
    /// Resolve the state directory and load settings.
    pub fn load() -> Result<Self> {
        let state_dir = config::state_dir()?;
        let settings = Settings::load(&state_dir)?;
        Ok(Self {
            state_dir,
            settings,
        })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.settings.scan_root, &self.state_dir)
    }

    /// Client for the configured server. Requires a session token.
    pub fn client(&self) -> Result<SyncClient> {
        let token = self.settings.require_session()?;
        SyncClient::new(&self.settings.server_url, token, self.settings.timeout)
    }
}

/// Drive a future to completion on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("failed to create runtime: {}", e)))?;
    Ok(rt.block_on(future))
}
