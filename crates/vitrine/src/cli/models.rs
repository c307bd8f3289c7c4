//! The `vitrine models` command: report which model files are in place.

use clap::{Args, Subcommand};
use vitrine_core::detection::DetrDetector;
use vitrine_core::embedding::{
    ClipEngine, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME, VISUAL_MODEL_FILENAME,
};
use vitrine_core::segmentation::SegmentationEngine;
use vitrine_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List expected model files and whether each is installed
    List,

    /// Show model directory path
    Path,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    match args.command {
        ModelsCommand::List => {
            println!("Model directory: {}\n", model_dir.display());

            let clip_dir = ClipEngine::model_path(&config.embedding, &model_dir);
            let detr_dir = DetrDetector::model_path(&config.detection, &model_dir);
            let schp_dir = SegmentationEngine::model_path(&config.segmentation, &model_dir);

            let groups = [
                (
                    "Embedding (CLIP)",
                    ClipEngine::model_exists(&config.embedding, &model_dir),
                    vec![
                        clip_dir.join(VISUAL_MODEL_FILENAME),
                        clip_dir.join(TEXT_MODEL_FILENAME),
                        clip_dir.join(TOKENIZER_FILENAME),
                    ],
                ),
                (
                    "Detection (DETR)",
                    DetrDetector::model_exists(&config.detection, &model_dir),
                    vec![
                        detr_dir.join(vitrine_core::detection::DETECTOR_MODEL_FILENAME),
                        detr_dir.join(vitrine_core::detection::DETECTOR_CONFIG_FILENAME),
                    ],
                ),
                (
                    "Segmentation (SCHP)",
                    SegmentationEngine::model_exists(&config.segmentation, &model_dir),
                    vec![
                        schp_dir.join(&config.segmentation.atr_file),
                        schp_dir.join(&config.segmentation.lip_file),
                    ],
                ),
            ];

            let mut all_present = true;
            for (name, ready, files) in groups {
                all_present &= ready;
                println!("  {name}: {}", if ready { "ready" } else { "incomplete" });
                for file in files {
                    let status = if file.exists() { "installed" } else { "missing" };
                    println!("    - {:50} {}", file.display(), status);
                }
            }

            println!("\n  Catalog:");
            for path in [config.metadata_path(), config.embeddings_path()] {
                let status = if path.exists() { "present" } else { "missing" };
                println!("    - {:50} {}", path.display(), status);
            }

            if !all_present {
                println!("\nExport the models to ONNX and place them at the paths above.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", model_dir.display());
        }
    }

    Ok(())
}
