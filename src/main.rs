//! Sentra - discover, version, and sync .env files.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentra::cli::output;
use sentra::cli::{execute, Cli};
use sentra::error::{ClientError, ConfigError, Error, StoreError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("SENTRA_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("sentra=debug")
        } else {
            EnvFilter::new("sentra=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = execute(cli.command) {
        let suggestion = match &e {
            Error::Config(ConfigError::NotLoggedIn) | Error::Client(ClientError::Unauthorized) => {
                Some("run: sentra login --token <token>".to_string())
            }
            Error::Client(ClientError::Unavailable | ClientError::Timeout) => {
                Some("the server is unavailable, retry later".to_string())
            }
            Error::Store(StoreError::NothingStaged) => Some("run: sentra add --all".to_string()),
            Error::Store(StoreError::StaleStage { path }) => {
                Some(format!("run: sentra add {}", path))
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}
