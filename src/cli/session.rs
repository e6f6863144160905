//! Login and logout commands.
//!
//! The session token lives in `config.toml`. Both commands also remove
//! session files written by older releases: login tolerates failures,
//! logout does not.

use tracing::info;

use crate::cli::output;
use crate::core::cleanup::{legacy_session_files, remove_legacy_files, CleanupPolicy};
use crate::core::config::{self, Config};
use crate::error::{ConfigError, Result};

pub fn login(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "session_token",
            reason: "cannot be empty".to_string(),
        }
        .into());
    }

    let state_dir = config::state_dir()?;
    let mut config = Config::load(&state_dir)?;
    config.session_token = Some(token.to_string());
    config.save(&state_dir)?;

    let removed =
        remove_legacy_files(&legacy_session_files(&state_dir), CleanupPolicy::BestEffort)?;
    info!(removed, "logged in");
    output::success("logged in");
    Ok(())
}

pub fn logout() -> Result<()> {
    let state_dir = config::state_dir()?;
    let mut config = Config::load(&state_dir)?;
    let had_token = config.session_token.take().is_some();
    if had_token {
        config.save(&state_dir)?;
    }

    let removed = remove_legacy_files(&legacy_session_files(&state_dir), CleanupPolicy::Strict)?;
    info!(removed, "logged out");

    if had_token || removed > 0 {
        output::success("logged out");
    } else {
        output::dimmed("not logged in");
    }
    Ok(())
}
