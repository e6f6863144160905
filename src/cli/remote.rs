//! Projects and files commands: read-only views of what the server holds.

use crate::cli::context::{block_on, Context};
use crate::cli::output;
use crate::core::push::project_root_from_path;
use crate::core::store::short_id;
use crate::error::{Error, Result};

pub fn projects() -> Result<()> {
    let ctx = Context::load()?;
    let client = ctx.client()?;
    let projects = block_on(client.projects())??;

    if projects.is_empty() {
        output::dimmed("no projects on the server");
        return Ok(());
    }

    for project in &projects {
        output::header(&project.root_path);
        output::kv("files", project.file_count);
        if !project.last_commit_id.is_empty() {
            output::kv(
                "last",
                format!(
                    "{}  {}",
                    short_id(&project.last_commit_id),
                    project.last_commit_message
                ),
            );
        }
    }
    Ok(())
}

pub fn files(path: &str, at: Option<&str>) -> Result<()> {
    let root = project_root_from_path(path)
        .ok_or_else(|| Error::Other(format!("invalid project root: {:?}", path)))?;
    let ctx = Context::load()?;
    let client = ctx.client()?;
    let files = block_on(client.files(root, at))??;

    if files.is_empty() {
        output::dimmed(&format!("no files for {}", root));
        return Ok(());
    }

    for file in &files {
        println!(
            "{}  {}  {:>8}  {}",
            short_id(&file.commit_id),
            file.sha256.get(..12).unwrap_or(&file.sha256),
            file.size,
            output::path(&file.file_path)
        );
    }
    Ok(())
}
