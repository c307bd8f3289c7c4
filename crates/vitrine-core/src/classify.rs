//! Zero-shot multi-label classification.
//!
//! Each candidate label is rendered through a prompt template, encoded with
//! the text tower and compared to the image embedding. Scaled cosines are
//! softmax-normalized across the candidates, CLIP style.

use std::collections::HashSet;
use std::sync::Arc;

use image::DynamicImage;

use crate::config::ClassificationConfig;
use crate::embedding::Embedder;
use crate::error::{PipelineError, PipelineResult};
use crate::math;
use crate::types::LabelScore;

/// Split a comma-separated label list. Blanks and repeats are dropped,
/// first occurrences keep their order.
pub fn parse_labels(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_string()))
        .map(str::to_string)
        .collect()
}

/// Scores candidate labels against an image.
pub struct ZeroShotClassifier {
    embedder: Arc<dyn Embedder>,
    template: String,
    logit_scale: f32,
}

impl ZeroShotClassifier {
    pub fn new(embedder: Arc<dyn Embedder>, config: &ClassificationConfig) -> Self {
        Self {
            embedder,
            template: config.hypothesis_template.clone(),
            logit_scale: config.logit_scale,
        }
    }

    /// Render one label through the hypothesis template.
    pub fn prompt(&self, label: &str) -> String {
        self.template.replace("{}", label)
    }

    /// Score every label. Results sum to 1 and are sorted best first.
    pub fn classify(&self, image: &DynamicImage, labels: &[String]) -> PipelineResult<Vec<LabelScore>> {
        if labels.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "At least one label is required".to_string(),
            ));
        }

        let image_vec = math::l2_normalize(&self.embedder.embed_image(image)?);
        let prompts: Vec<String> = labels.iter().map(|l| self.prompt(l)).collect();
        let text_vecs = self.embedder.embed_texts(&prompts)?;
        if text_vecs.len() != labels.len() {
            return Err(PipelineError::Embedding {
                message: format!(
                    "Text encoder returned {} vectors for {} labels",
                    text_vecs.len(),
                    labels.len()
                ),
            });
        }

        let logits: Vec<f32> = text_vecs
            .iter()
            .map(|t| self.logit_scale * math::dot(&image_vec, &math::l2_normalize(t)))
            .collect();
        let probs = math::softmax(&logits);

        let mut results: Vec<LabelScore> = labels
            .iter()
            .zip(probs)
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!("Classified image against {} labels", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_drops_blanks() {
        assert_eq!(parse_labels("jacket, coat, , shirt"), vec!["jacket", "coat", "shirt"]);
    }

    #[test]
    fn test_parse_labels_dedupes_in_order() {
        assert_eq!(parse_labels("coat,shirt,coat, shirt ,hat"), vec!["coat", "shirt", "hat"]);
        assert!(parse_labels(" , ,").is_empty());
        assert!(parse_labels("").is_empty());
    }

    /// Image always points along axis 0; "match" prompts do too.
    struct AxisEmbedder;

    impl Embedder for AxisEmbedder {
        fn embed_image(&self, _image: &DynamicImage) -> PipelineResult<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("match") {
                        vec![1.0, 0.0, 0.0]
                    } else if t.contains("close") {
                        vec![0.8, 0.6, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    fn classifier() -> ZeroShotClassifier {
        ZeroShotClassifier::new(Arc::new(AxisEmbedder), &ClassificationConfig::default())
    }

    #[test]
    fn test_prompt_uses_template() {
        assert_eq!(classifier().prompt("coat"), "This is a photo of coat.");
    }

    #[test]
    fn test_scores_form_distribution_sorted_desc() {
        let labels = parse_labels("other, close, match");
        let results = classifier()
            .classify(&DynamicImage::new_rgb8(2, 2), &labels)
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label, "match");
        assert_eq!(results[1].label, "close");
        let total: f32 = results.iter().map(|r| r.score).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_empty_labels_is_client_error() {
        let err = classifier()
            .classify(&DynamicImage::new_rgb8(2, 2), &[])
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
