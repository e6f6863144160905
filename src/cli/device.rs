//! Device command.
//!
//! Prints this machine's identity so it can be registered with the server.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::identity::DeviceIdentity;
use crate::error::Result;

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    let identity = DeviceIdentity::load_or_create(ctx.state_dir())?;

    output::header("device");
    output::kv("machine_id", identity.machine_id());
    output::kv("name", &ctx.settings().machine_name);
    output::kv("public_key", identity.public_key_b64());
    output::kv("server", &ctx.settings().server_url);
    Ok(())
}
