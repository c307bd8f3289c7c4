//! Self-Correction Human Parsing network via ONNX Runtime.
//!
//! Input: BGR, resized to a square, normalized, NCHW.
//! Output: `[1, classes, h, w]` logits; argmax per pixel, then nearest
//! neighbour resampled back to the source size.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use crate::error::{PipelineError, PipelineResult};
use crate::onnx::{image_tensor, OnnxSession};

use super::composite::LabelMask;
use super::HumanParser;

/// Per-channel mean in BGR order.
const BGR_MEAN: [f32; 3] = [0.406, 0.456, 0.485];
/// Per-channel std in BGR order.
const BGR_STD: [f32; 3] = [0.225, 0.224, 0.229];

/// One SCHP network (ATR or LIP weights).
pub struct SchpParser {
    session: OnnxSession,
    input_name: String,
    input_size: u32,
    num_classes: usize,
}

impl SchpParser {
    pub fn load(model_path: &Path, input_size: u32, num_classes: usize) -> Result<Self, PipelineError> {
        let session = OnnxSession::open(model_path, "Segmentation")?;
        let input_name = session.first_input("input");

        tracing::info!(
            "Loaded human parser from {:?} ({} classes, {}px input)",
            model_path,
            num_classes,
            input_size
        );

        Ok(Self {
            session,
            input_name,
            input_size,
            num_classes,
        })
    }
}

impl HumanParser for SchpParser {
    fn parse(&self, image: &DynamicImage) -> PipelineResult<LabelMask> {
        let tensor = preprocess(image, self.input_size);
        let input_value = image_tensor(&tensor).map_err(|e| PipelineError::Segmentation {
            message: format!("Failed to create input tensor: {e}"),
        })?;

        let mut session = self
            .session
            .lock()
            .map_err(|message| PipelineError::Segmentation { message })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| PipelineError::Segmentation {
                message: format!("ONNX inference failed: {e}"),
            })?;

        // Parsing logits come first; auxiliary edge outputs, if any, follow.
        let (_, logits) = outputs.iter().next().ok_or_else(|| PipelineError::Segmentation {
            message: "Parser produced no outputs".to_string(),
        })?;
        let (shape, data) =
            logits
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Segmentation {
                    message: format!("Failed to extract parsing logits: {e}"),
                })?;

        if shape.len() != 4 || shape[1] as usize != self.num_classes {
            return Err(PipelineError::Segmentation {
                message: format!(
                    "Unexpected parsing output shape {:?}, expected [1, {}, h, w]",
                    shape, self.num_classes
                ),
            });
        }
        let (h, w) = (shape[2] as usize, shape[3] as usize);

        let indices = argmax_channels(data, self.num_classes, h, w);
        let small = LabelMask::new(w as u32, h as u32, indices)?;
        Ok(resize_nearest(&small, image.width(), image.height()))
    }
}

/// BGR, square-resized, normalized NCHW tensor.
fn preprocess(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            // channel c of the tensor is BGR, pixel is RGB
            let value = pixel[2 - c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - BGR_MEAN[c]) / BGR_STD[c];
        }
    }
    tensor
}

/// Class index with the highest logit per pixel of a `[classes, h, w]` block.
pub(crate) fn argmax_channels(data: &[f32], classes: usize, h: usize, w: usize) -> Vec<u8> {
    let plane = h * w;
    (0..plane)
        .map(|p| {
            let mut best = 0usize;
            let mut best_val = f32::NEG_INFINITY;
            for c in 0..classes {
                let v = data[c * plane + p];
                if v > best_val {
                    best_val = v;
                    best = c;
                }
            }
            best as u8
        })
        .collect()
}

/// Nearest-neighbour resample of a label mask.
pub(crate) fn resize_nearest(mask: &LabelMask, width: u32, height: u32) -> LabelMask {
    if mask.width == width && mask.height == height {
        return mask.clone();
    }
    let mut data = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as u64 {
        let sy = (y * mask.height as u64 / height.max(1) as u64) as usize;
        for x in 0..width as u64 {
            let sx = (x * mask.width as u64 / width.max(1) as u64) as usize;
            data.push(mask.data[sy * mask.width as usize + sx]);
        }
    }
    LabelMask {
        width,
        height,
        data,
    }
}
