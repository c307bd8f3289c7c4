//! CLIP embedding generation.
//!
//! Converts images and text into unit-length vectors in a shared space, using
//! a CLIP vision tower and text tower running locally via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vitrine_core::embedding::{ClipEngine, Embedder};
//! use vitrine_core::Config;
//!
//! let config = Config::default();
//! let engine = ClipEngine::load(&config.embedding, &config.model_dir())?;
//! let query = engine.embed_text("red leather jacket")?;
//! ```

pub(crate) mod preprocess;
pub(crate) mod text;
pub(crate) mod visual;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::EmbeddingConfig;
use crate::error::{PipelineError, PipelineResult};

use self::preprocess::preprocess;
use self::text::ClipTextEncoder;
use self::visual::ClipVisualSession;

/// The vision encoder ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";
/// The text encoder ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";
/// The tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Anything that maps images and text into one unit-normalized embedding space.
pub trait Embedder: Send + Sync {
    /// Embed one image.
    fn embed_image(&self, image: &DynamicImage) -> PipelineResult<Vec<f32>>;

    /// Embed a batch of strings, one vector per input, in order.
    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>>;

    /// Embed one string.
    fn embed_text(&self, text: &str) -> PipelineResult<Vec<f32>> {
        self.embed_texts(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Embedding {
                message: "Text encoder returned empty result for single input".to_string(),
            })
    }
}

/// CLIP vision + text encoders loaded from one model directory.
pub struct ClipEngine {
    visual: ClipVisualSession,
    text: ClipTextEncoder,
    image_size: u32,
}

impl ClipEngine {
    /// Load both encoders.
    ///
    /// Expects `visual.onnx`, `text_model.onnx` and `tokenizer.json` in
    /// `{model_dir}/{model}/`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let dir = Self::model_path(config, model_dir);
        let visual_path = dir.join(VISUAL_MODEL_FILENAME);
        let text_path = dir.join(TEXT_MODEL_FILENAME);

        tracing::info!("Loading CLIP encoders from {:?}", dir);
        let visual = ClipVisualSession::load(&visual_path, &config.image_output)?;
        let text = ClipTextEncoder::load(
            &text_path,
            &dir.join(TOKENIZER_FILENAME),
            config.max_text_length,
            &config.text_output,
        )?;
        tracing::info!("CLIP encoders loaded successfully");

        Ok(Self {
            visual,
            text,
            image_size: config.image_size,
        })
    }

    /// Directory the encoder files are expected in.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model)
    }

    /// Check whether all encoder files exist on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        let dir = Self::model_path(config, model_dir);
        [VISUAL_MODEL_FILENAME, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME]
            .iter()
            .all(|name| dir.join(name).exists())
    }
}

impl Embedder for ClipEngine {
    fn embed_image(&self, image: &DynamicImage) -> PipelineResult<Vec<f32>> {
        let tensor = preprocess(image, self.image_size);
        self.visual.embed(&tensor)
    }

    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        self.text.encode_batch(texts)
    }
}
