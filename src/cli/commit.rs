//! Commit and log commands.

use crate::cli::context::Context;
use crate::cli::output;
use crate::error::Result;

/// Commit everything staged.
pub fn execute(message: &str) -> Result<()> {
    let ctx = Context::load()?;
    let commit = ctx.workspace().commit(message)?;

    output::success(&format!(
        "committed {} ({} files)",
        commit.short_id(),
        commit.files.len()
    ));
    Ok(())
}

/// Show local commits, newest first.
pub fn log() -> Result<()> {
    let ctx = Context::load()?;
    let workspace = ctx.workspace();
    let commits = workspace.store().commits().list()?;
    if commits.is_empty() {
        output::dimmed("no commits yet");
        return Ok(());
    }

    let pushed = workspace.store().pushed().load()?;
    for commit in commits.iter().rev() {
        let state = if pushed.contains(&commit.id) {
            "pushed"
        } else {
            "local"
        };
        println!(
            "{}  {}  {}  {}",
            output::path(commit.short_id()),
            commit.created_at.format("%Y-%m-%d %H:%M:%S"),
            state,
            commit.message
        );
    }
    Ok(())
}
