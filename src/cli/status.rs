//! Status command.
//!
//! Shows staged, changed, and new env files plus unpushed commits.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::workspace::FileState;
use crate::error::Result;

fn marker(state: FileState) -> &'static str {
    match state {
        FileState::New => "?",
        FileState::Modified => "M",
        FileState::Staged => "A",
        FileState::StaleStage => "!",
        FileState::Missing => "D",
        FileState::Clean => " ",
    }
}

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    let workspace = ctx.workspace();
    let status = workspace.status()?;

    output::header(&workspace.scan_root().display().to_string());
    output::rule();

    let changed: Vec<_> = status
        .files
        .iter()
        .filter(|f| f.state != FileState::Clean)
        .collect();
    if changed.is_empty() {
        output::dimmed("nothing to commit");
    } else {
        for file in &changed {
            output::list_item(marker(file.state), &file.path);
        }
    }

    println!();
    output::kv("staged", status.count(FileState::Staged));
    output::kv("clean", status.count(FileState::Clean));
    output::kv("unpushed", status.unpushed);

    if status.count(FileState::StaleStage) > 0 {
        println!();
        output::warn("some staged files changed since staging");
        output::hint(&format!("run: {}", output::cmd("sentra add <path>")));
    } else if status.unpushed > 0 {
        println!();
        output::hint(&format!("run: {}", output::cmd("sentra push")));
    }
    Ok(())
}
