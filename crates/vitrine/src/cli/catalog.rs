//! The `vitrine catalog` command: build the search index from catalog images.

use std::time::Instant;

use clap::{Args, Subcommand};
use vitrine_core::embedding::ClipEngine;
use vitrine_core::index::{build_index, Catalog, VectorIndex};
use vitrine_core::Config;

/// Arguments for the `catalog` command.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Embed every catalog image and write the embedding index
    Index,
}

/// Execute the catalog command.
pub async fn execute(args: CatalogArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        CatalogCommand::Index => {
            let start = Instant::now();
            let output = config.embeddings_path();

            let count = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
                let catalog = Catalog::load(&config.metadata_path())?;
                let engine = ClipEngine::load(&config.embedding, &config.model_dir())?;
                let index = build_index(&engine, &catalog, &config.data_dir())?;
                index.save(&config.embeddings_path())?;
                Ok(index.len())
            })
            .await??;

            println!(
                "Indexed {} catalog images into {} in {:.1}s",
                count,
                output.display(),
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
