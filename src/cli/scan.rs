//! Scan command.
//!
//! Lists every project under the scan root and the secret files found in it.

use tracing::info;

use crate::cli::context::Context;
use crate::cli::output;
use crate::error::Result;

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    let workspace = ctx.workspace();
    let root = workspace.scan_root().display().to_string();
    info!(root = %root, "scanning");

    let projects = workspace.scan()?;
    let with_files: Vec<_> = projects.iter().filter(|p| !p.env_files.is_empty()).collect();

    if with_files.is_empty() {
        output::dimmed(&format!("no env files found under {}", root));
        return Ok(());
    }

    let mut total = 0;
    for project in &with_files {
        output::header(&project.root_path.display().to_string());
        for file in &project.env_files {
            output::list_item("·", file);
        }
        total += project.env_files.len();
    }

    println!();
    output::success(&format!(
        "{} env files in {} projects ({} scanned)",
        total,
        with_files.len(),
        projects.len()
    ));
    Ok(())
}
