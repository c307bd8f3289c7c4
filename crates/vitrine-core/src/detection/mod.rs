//! Fashion object detection.
//!
//! A DETR-family detector exported to ONNX (`logits` + `pred_boxes` outputs)
//! with Hugging Face style post-processing.

pub mod labels;
pub mod postprocess;
pub(crate) mod preprocess;

pub use labels::LabelMap;
pub use postprocess::{postprocess, DetectionHead};

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ort::value::Value;

use crate::config::{DetectionConfig, ScoreActivation};
use crate::error::{PipelineError, PipelineResult};
use crate::onnx::{image_tensor, OnnxSession};
use crate::types::DetectedObject;

/// The detector ONNX model filename.
pub const DETECTOR_MODEL_FILENAME: &str = "model.onnx";
/// The detector's Hugging Face config (carries `id2label`).
pub const DETECTOR_CONFIG_FILENAME: &str = "config.json";

const LOGITS_OUTPUT: &str = "logits";
const BOXES_OUTPUT: &str = "pred_boxes";

/// Finds fashion items in an image.
pub trait ObjectDetector: Send + Sync {
    /// Detections scoring above `threshold`, best first.
    fn detect(&self, image: &DynamicImage, threshold: f32) -> PipelineResult<Vec<DetectedObject>>;
}

/// ONNX Runtime DETR detector.
pub struct DetrDetector {
    session: OnnxSession,
    input_name: String,
    needs_pixel_mask: bool,
    labels: LabelMap,
    shortest_edge: u32,
    longest_edge: u32,
    activation: ScoreActivation,
}

impl DetrDetector {
    /// Load `model.onnx` and `config.json` from `{model_dir}/{model}/`.
    pub fn load(config: &DetectionConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let dir = Self::model_path(config, model_dir);
        let model_path = dir.join(DETECTOR_MODEL_FILENAME);
        let session = OnnxSession::open(&model_path, "Detection")?;
        let labels = LabelMap::load(&dir.join(DETECTOR_CONFIG_FILENAME))?;

        let input_name = session.first_input("pixel_values");
        let needs_pixel_mask = session.has_input("pixel_mask");

        tracing::info!(
            "Loaded detector from {:?} ({} classes, activation: {:?})",
            model_path,
            labels.len(),
            config.activation
        );

        Ok(Self {
            session,
            input_name,
            needs_pixel_mask,
            labels,
            shortest_edge: config.shortest_edge,
            longest_edge: config.longest_edge,
            activation: config.activation,
        })
    }

    /// Directory the detector files are expected in.
    pub fn model_path(config: &DetectionConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model)
    }

    /// Check whether the detector files exist on disk.
    pub fn model_exists(config: &DetectionConfig, model_dir: &Path) -> bool {
        let dir = Self::model_path(config, model_dir);
        dir.join(DETECTOR_MODEL_FILENAME).exists() && dir.join(DETECTOR_CONFIG_FILENAME).exists()
    }
}

impl ObjectDetector for DetrDetector {
    fn detect(&self, image: &DynamicImage, threshold: f32) -> PipelineResult<Vec<DetectedObject>> {
        let tensor = preprocess::preprocess(image, self.shortest_edge, self.longest_edge);
        let (height, width) = (tensor.shape()[2] as i64, tensor.shape()[3] as i64);

        let pixel_values = image_tensor(&tensor).map_err(|e| PipelineError::Detection {
            message: format!("Failed to create input tensor: {e}"),
        })?;

        let mut session = self
            .session
            .lock()
            .map_err(|message| PipelineError::Detection { message })?;

        let outputs = if self.needs_pixel_mask {
            let mask = vec![1i64; (height * width) as usize];
            let pixel_mask = Value::from_array((vec![1i64, height, width], mask)).map_err(|e| {
                PipelineError::Detection {
                    message: format!("Failed to create pixel_mask tensor: {e}"),
                }
            })?;
            session.run(ort::inputs![
                self.input_name.as_str() => pixel_values,
                "pixel_mask" => pixel_mask
            ])
        } else {
            session.run(ort::inputs![self.input_name.as_str() => pixel_values])
        }
        .map_err(|e| PipelineError::Detection {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let extract = |name: &str| {
            let output = outputs
                .iter()
                .find(|(n, _)| *n == name)
                .ok_or_else(|| PipelineError::Detection {
                    message: format!("Detector did not produce {name}"),
                })?;
            let (shape, data) =
                output
                    .1
                    .try_extract_tensor::<f32>()
                    .map_err(|e| PipelineError::Detection {
                        message: format!("Failed to extract {name}: {e}"),
                    })?;
            Ok::<_, PipelineError>((shape.to_vec(), data.to_vec()))
        };

        let (logits_shape, logits) = extract(LOGITS_OUTPUT)?;
        let (_, boxes) = extract(BOXES_OUTPUT)?;

        // [1, queries, classes]
        if logits_shape.len() != 3 {
            return Err(PipelineError::Detection {
                message: format!("Unexpected logits shape: {:?}", logits_shape),
            });
        }
        let head = DetectionHead {
            logits: &logits,
            boxes: &boxes,
            num_queries: logits_shape[1] as usize,
            logits_per_query: logits_shape[2] as usize,
        };

        let detections = postprocess(
            &head,
            self.activation,
            threshold,
            (image.width(), image.height()),
            &self.labels,
        );
        tracing::debug!("Detected {} objects", detections.len());
        Ok(detections)
    }
}
