//! Vitrine CLI - fashion vision API server.
//!
//! Vitrine serves catalog retrieval, zero-shot classification, garment
//! detection, and human parsing over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Build the catalog embedding index
//! vitrine catalog index
//!
//! # Start the API server
//! vitrine serve --port 8000
//!
//! # View configuration
//! vitrine config show
//!
//! # Check model files
//! vitrine models list
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Vitrine - fashion vision API server.
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "VITRINE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Serve(cli::serve::ServeArgs),

    /// Build the catalog embedding index
    Catalog(cli::catalog::CatalogArgs),

    /// Inspect model files
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(vitrine_core::Config::default_path);
    let config = match &cli.config {
        Some(path) if !matches!(cli.command, Commands::Config(_)) => {
            vitrine_core::Config::load_from(path)?
        }
        _ => match vitrine_core::Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                if config_path.exists() {
                    eprintln!(
                        "Warning: Failed to load config: {e}\n  \
                         Using default configuration. Check your config file with `vitrine config path`."
                    );
                }
                vitrine_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Vitrine v{}", vitrine_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Catalog(args) => cli::catalog::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}
