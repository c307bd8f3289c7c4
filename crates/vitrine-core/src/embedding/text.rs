//! CLIP text encoder.
//!
//! Loads the CLIP text tower (ONNX) and its tokenizer, and encodes strings to
//! vectors aligned with the vision encoder's space.

use std::path::Path;

use ort::value::Value;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::PipelineError;
use crate::onnx::OnnxSession;

/// CLIP end-of-text token, also used for padding.
const END_OF_TEXT: &str = "<|endoftext|>";

/// CLIP text encoder wrapper.
pub struct ClipTextEncoder {
    session: OnnxSession,
    tokenizer: Tokenizer,
    max_length: usize,
    output_name: String,
    needs_attention_mask: bool,
}

impl ClipTextEncoder {
    /// Load the text encoder and tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_length: usize,
        output_name: &str,
    ) -> Result<Self, PipelineError> {
        if !tokenizer_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Tokenizer not found at {:?}", tokenizer_path),
            });
        }

        let session = OnnxSession::open(model_path, "CLIP text")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            PipelineError::Model {
                message: format!("Failed to load tokenizer: {e}"),
            }
        })?;

        let pad_id = tokenizer.token_to_id(END_OF_TEXT).unwrap_or(0);
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token: END_OF_TEXT.to_string(),
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to configure tokenizer truncation: {e}"),
            })?;

        let needs_attention_mask = session.has_input("attention_mask");

        Ok(Self {
            session,
            tokenizer,
            max_length,
            output_name: output_name.to_string(),
            needs_attention_mask,
        })
    }

    /// Encode a batch of text strings to normalized embeddings.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| PipelineError::Embedding {
                message: format!("Tokenization failed: {e}"),
            })?;

        let mut input_ids = vec![0i64; batch_size * self.max_length];
        let mut attention_mask = vec![0i64; batch_size * self.max_length];
        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * self.max_length;
            for (j, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .take(self.max_length)
                .enumerate()
            {
                input_ids[row + j] = id as i64;
                attention_mask[row + j] = mask as i64;
            }
        }

        let shape = vec![batch_size as i64, self.max_length as i64];
        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| PipelineError::Embedding {
                message: format!("Failed to create input_ids tensor: {e}"),
            })?;

        let mut session = self
            .session
            .lock()
            .map_err(|message| PipelineError::Embedding { message })?;

        let outputs = if self.needs_attention_mask {
            let mask_value = Value::from_array((shape, attention_mask)).map_err(|e| {
                PipelineError::Embedding {
                    message: format!("Failed to create attention_mask tensor: {e}"),
                }
            })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        }
        .map_err(|e| PipelineError::Embedding {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let (_, embeds) = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| PipelineError::Embedding {
                message: format!("Text encoder did not produce {}", self.output_name),
            })?;
        let (shape, data) =
            embeds
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Embedding {
                    message: format!("Failed to extract {}: {e}", self.output_name),
                })?;

        // [batch, dim]
        if shape.len() != 2 || shape[0] as usize != batch_size {
            return Err(PipelineError::Embedding {
                message: format!(
                    "Text embedding has shape {:?}, expected [{batch_size}, dim]",
                    shape
                ),
            });
        }
        let embeddings = data
            .chunks_exact(shape[1] as usize)
            .map(crate::math::l2_normalize)
            .collect();

        Ok(embeddings)
    }
}
