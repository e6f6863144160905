//! Command-line interface.

pub mod add;
pub mod commit;
pub mod completions;
pub mod context;
pub mod device;
pub mod output;
pub mod push;
pub mod remote;
pub mod scan;
pub mod session;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sentra - version and sync .env files with client-side encryption.
#[derive(Parser)]
#[command(
    name = "sentra",
    about = "Discover, version, and sync .env files across repositories",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// List projects and env files under the scan root
    Scan,

    /// Stage env files for the next commit
    Add {
        /// Files to stage
        paths: Vec<PathBuf>,
        /// Stage every discovered env file
        #[arg(short, long, conflicts_with = "paths")]
        all: bool,
    },

    /// Show staged, changed, and new env files
    Status,

    /// Record staged files as a commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show local commits
    Log,

    /// Send unpushed commits to the server
    Push,

    /// List projects stored on the server
    Projects,

    /// List files stored on the server for a project
    Files {
        /// Project root, or any path inside it
        root: String,
        /// Commit ID to view instead of the latest
        #[arg(long)]
        at: Option<String>,
    },

    /// Show this device's machine ID and public key
    Device,

    /// Save a session token
    Login {
        /// Session token issued by the server
        #[arg(long, env = "SENTRA_SESSION_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Remove the saved session token
    Logout,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Scan => scan::execute(),
        Add { paths, all } => add::execute(&paths, all),
        Status => status::execute(),
        Commit { message } => commit::execute(&message),
        Log => commit::log(),
        Push => push::execute(),
        Projects => remote::projects(),
        Files { root, at } => remote::files(&root, at.as_deref()),
        Device => device::execute(),
        Login { token } => session::login(&token),
        Logout => session::logout(),
        Completions { shell } => completions::execute(shell),
    }
}
