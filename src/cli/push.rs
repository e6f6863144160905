//! Push command.
//!
//! Sends every unpushed commit to the sync server, encrypted and signed. A
//! commit is recorded as pushed only once every project request for it has
//! been accepted.

use tracing::{debug, info};

use crate::cli::context::{block_on, Context};
use crate::cli::output;
use crate::core::cipher::KeyContext;
use crate::core::constants;
use crate::core::identity::DeviceIdentity;
use crate::core::push::build_push_requests;
use crate::error::Result;

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    let client = ctx.client()?;
    let workspace = ctx.workspace();

    let commits = workspace.unpushed()?;
    if commits.is_empty() {
        output::dimmed("everything up to date");
        return Ok(());
    }

    let keys = KeyContext::new(ctx.state_dir().join(constants::INSTALLATION_KEY_FILE));
    let key = keys.key()?;
    let identity = DeviceIdentity::load_or_create(ctx.state_dir())?;
    let settings = ctx.settings();

    for commit in &commits {
        let requests = build_push_requests(
            &settings.scan_root,
            identity.machine_id(),
            &settings.machine_name,
            commit,
            key,
        )?;

        let mut deduped = 0;
        block_on(async {
            for request in &requests {
                let result = client.push(&identity, request).await?;
                debug!(
                    root = %request.project.root,
                    project_id = %result.project_id,
                    commit_id = %result.commit_id,
                    deduped = result.deduped,
                    "push accepted"
                );
                if result.deduped {
                    deduped += 1;
                }
            }
            Ok::<_, crate::error::Error>(())
        })??;

        workspace.mark_pushed(&commit.id)?;
        info!(id = %commit.id, projects = requests.len(), deduped, "commit pushed");
        output::success(&format!(
            "pushed {} to {} projects{}",
            commit.short_id(),
            requests.len(),
            if deduped > 0 { " (already on server)" } else { "" }
        ));
    }
    Ok(())
}
