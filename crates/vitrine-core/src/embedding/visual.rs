//! CLIP vision tower.
//!
//! The exported graph must include the projection head, so its output already
//! lives in the joint text/image space.

use std::path::Path;

use ndarray::Array4;

use crate::error::PipelineError;
use crate::onnx::{image_tensor, OnnxSession};

pub struct ClipVisualSession {
    session: OnnxSession,
    pixel_input: String,
    embeds_output: String,
}

impl ClipVisualSession {
    /// Open the vision tower. Fails early if `embeds_output` is not one of its outputs.
    pub fn load(model_path: &Path, embeds_output: &str) -> Result<Self, PipelineError> {
        let session = OnnxSession::open(model_path, "CLIP vision")?;
        if !session.has_output(embeds_output) {
            return Err(PipelineError::Model {
                message: format!(
                    "Vision encoder {:?} has no output named {embeds_output:?}",
                    model_path
                ),
            });
        }

        Ok(Self {
            pixel_input: session.first_input("pixel_values"),
            embeds_output: embeds_output.to_string(),
            session,
        })
    }

    /// Embed one `[1, 3, size, size]` tensor into a unit vector.
    pub fn embed(&self, pixels: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
        let failed = |message: String| PipelineError::Embedding { message };

        let input = image_tensor(pixels).map_err(|e| failed(format!("Bad pixel tensor: {e}")))?;
        let mut session = self.session.lock().map_err(failed)?;
        let outputs = session
            .run(ort::inputs![self.pixel_input.as_str() => input])
            .map_err(|e| failed(format!("Vision encoder inference failed: {e}")))?;

        let (_, embeds) = outputs
            .iter()
            .find(|(name, _)| *name == self.embeds_output)
            .ok_or_else(|| failed(format!("Missing {} output", self.embeds_output)))?;
        let (shape, data) = embeds
            .try_extract_tensor::<f32>()
            .map_err(|e| failed(format!("Unreadable {}: {e}", self.embeds_output)))?;

        let width = match shape.len() {
            1 | 2 => shape[shape.len() - 1] as usize,
            _ => return Err(failed(format!("Image embedding has shape {:?}", shape))),
        };
        Ok(crate::math::l2_normalize(&data[..width]))
    }
}
