//! Add command.
//!
//! Stages env files for the next commit.

use std::path::PathBuf;

use crate::cli::context::Context;
use crate::cli::output;
use crate::error::{Error, Result};

/// Stage `paths`, or everything discovered when `all` is set.
pub fn execute(paths: &[PathBuf], all: bool) -> Result<()> {
    if paths.is_empty() && !all {
        return Err(Error::Other("nothing to add (pass paths or --all)".to_string()));
    }

    let ctx = Context::load()?;
    let workspace = ctx.workspace();
    let staged = if all {
        workspace.stage_all()?
    } else {
        workspace.stage_files(paths)?
    };

    if staged.is_empty() {
        output::dimmed("no env files found");
        return Ok(());
    }

    for path in &staged {
        output::list_item("+", path);
    }
    output::success(&format!("staged {} files", staged.len()));
    Ok(())
}
