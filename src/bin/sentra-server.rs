//! Sentra sync server.

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentra::server::{self, config::ServerConfig};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sentra-server: {}", e);
            std::process::exit(1);
        }
    };

    let filter =
        EnvFilter::try_from_env("SENTRA_LOG").unwrap_or_else(|_| EnvFilter::new("sentra=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> sentra::error::Result<()> {
    let state = config.build_state().await?;
    let listener = TcpListener::bind(config.listen).await?;
    info!(backend = config.backend_name(), "sentra-server starting");

    server::serve(listener, state, shutdown_signal()).await?;
    info!("sentra-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
