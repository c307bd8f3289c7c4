//! The `vitrine serve` command.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use vitrine::AppState;
use vitrine_core::{Config, CreditGate, Vitrine};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides server.host)
    #[arg(long, env = "VITRINE_HOST")]
    pub host: Option<String>,

    /// Port (overrides server.port)
    #[arg(long, env = "VITRINE_PORT")]
    pub port: Option<u16>,
}

/// Load everything, then serve.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let gate = if config.credits.enabled {
        Some(Arc::new(CreditGate::from_config(&config.credits)?))
    } else {
        tracing::warn!("Credit gate disabled, API routes are open");
        None
    };

    let vitrine = tokio::task::spawn_blocking(move || Vitrine::load(config))
        .await?
        .context("Failed to load models, index or catalog")?;

    vitrine::start_server(AppState::new(Arc::new(vitrine), gate), addr).await
}
