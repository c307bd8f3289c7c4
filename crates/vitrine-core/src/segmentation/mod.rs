//! Human-body part segmentation and mask compositing.
//!
//! Two parsing networks run on the same image: one trained on ATR (18
//! classes) and one on LIP (20 classes). Each produces a per-pixel label
//! mask that is mapped through its taxonomy and painted into a color overlay.

pub mod composite;
pub mod schp;
pub mod taxonomy;

pub use composite::{encode_png_base64, render_color_mask, ColorMask, LabelMask};
pub use schp::SchpParser;
pub use taxonomy::{label_color, label_priority, Taxonomy, ATR, LIP};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::config::SegmentationConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::SegmentationReport;

/// Produces a per-pixel class mask the size of the input image.
pub trait HumanParser: Send + Sync {
    fn parse(&self, image: &DynamicImage) -> PipelineResult<LabelMask>;
}

/// Runs both parsers and composites their masks.
pub struct SegmentationEngine {
    atr: Arc<dyn HumanParser>,
    lip: Arc<dyn HumanParser>,
}

/// Mapped labels, encoded overlay and color map for one mask.
struct Composited {
    labels: Vec<String>,
    mask_base64: String,
    color_map: std::collections::BTreeMap<String, String>,
}

impl SegmentationEngine {
    pub fn new(atr: Arc<dyn HumanParser>, lip: Arc<dyn HumanParser>) -> Self {
        Self { atr, lip }
    }

    /// Load the ATR and LIP networks from `{model_dir}/{model}/`.
    pub fn load_parsers(
        config: &SegmentationConfig,
        model_dir: &Path,
    ) -> Result<(SchpParser, SchpParser), PipelineError> {
        let dir = Self::model_path(config, model_dir);
        let atr = SchpParser::load(&dir.join(&config.atr_file), config.atr_input_size, ATR.len())?;
        let lip = SchpParser::load(&dir.join(&config.lip_file), config.lip_input_size, LIP.len())?;
        Ok((atr, lip))
    }

    /// Directory the parser files are expected in.
    pub fn model_path(config: &SegmentationConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model)
    }

    /// Check whether both parser files exist on disk.
    pub fn model_exists(config: &SegmentationConfig, model_dir: &Path) -> bool {
        let dir = Self::model_path(config, model_dir);
        dir.join(&config.atr_file).exists() && dir.join(&config.lip_file).exists()
    }

    /// Segment an image under both taxonomies.
    pub fn segment(&self, image: &DynamicImage) -> PipelineResult<SegmentationReport> {
        let atr = self.composite(image, self.atr.as_ref(), &ATR)?;
        let lip = self.composite(image, self.lip.as_ref(), &LIP)?;

        tracing::debug!(
            atr = atr.labels.len(),
            lip = lip.labels.len(),
            "Segmentation complete"
        );

        Ok(SegmentationReport {
            detected_labels_atr: atr.labels,
            detected_labels_lip: lip.labels,
            mask_color_atr_base64: atr.mask_base64,
            mask_color_lip_base64: lip.mask_base64,
            color_map_atr: atr.color_map,
            color_map_lip: lip.color_map,
        })
    }

    fn composite(
        &self,
        image: &DynamicImage,
        parser: &dyn HumanParser,
        taxonomy: &Taxonomy,
    ) -> PipelineResult<Composited> {
        let mask = parser.parse(image)?;
        if (mask.width, mask.height) != (image.width(), image.height()) {
            return Err(PipelineError::Segmentation {
                message: format!(
                    "{} mask is {}x{} but the image is {}x{}",
                    taxonomy.name,
                    mask.width,
                    mask.height,
                    image.width(),
                    image.height()
                ),
            });
        }

        let colored = render_color_mask(&mask, taxonomy);
        Ok(Composited {
            labels: mask.detected_labels(taxonomy),
            mask_base64: encode_png_base64(&colored.image)?,
            color_map: colored.color_map,
        })
    }
}
