//! The `vitrine config` command.

use std::path::Path;

use clap::{Args, Subcommand};
use vitrine_core::{Config, CreditGate};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a default config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config file and resolve credit gate secrets
    Check,
}

pub async fn execute(args: ConfigArgs, config: &Config, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => print!("{}", config.to_toml()?),

        ConfigCommand::Path => println!("{}", path.display()),

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists, pass --force to replace it",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, Config::default().to_toml()?)?;
            tracing::info!("Wrote default config to {}", path.display());
            println!("{}", path.display());
        }

        ConfigCommand::Check => {
            let checked = if path.exists() {
                Config::load_from(path)?
            } else {
                println!("{} not found, checking built-in defaults", path.display());
                Config::default()
            };

            if checked.credits.enabled {
                CreditGate::from_config(&checked.credits)?;
                println!("credits: enabled, secrets resolved");
            } else {
                println!("credits: disabled");
            }
            println!("models: {}", checked.model_dir().display());
            println!("catalog: {}", checked.metadata_path().display());
            println!("index: {}", checked.embeddings_path().display());
            println!("OK");
        }
    }

    Ok(())
}
