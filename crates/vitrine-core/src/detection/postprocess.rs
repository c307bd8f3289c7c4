//! DETR-style output decoding.
//!
//! Turns per-query class logits and normalized `(cx, cy, w, h)` boxes into
//! scored, labeled boxes in the original image's pixel space.

use crate::config::ScoreActivation;
use crate::math;
use crate::types::DetectedObject;

use super::labels::LabelMap;

/// Raw detection head outputs for a single image.
pub struct DetectionHead<'a> {
    /// `[queries × logits_per_query]`, row-major
    pub logits: &'a [f32],
    /// `[queries × 4]` normalized `(cx, cy, w, h)`
    pub boxes: &'a [f32],
    pub num_queries: usize,
    pub logits_per_query: usize,
}

/// Decode detections above `threshold`, best first.
///
/// With [`ScoreActivation::Softmax`] the last logit is the "no object" class:
/// it takes part in the softmax but is never reported.
pub fn postprocess(
    head: &DetectionHead<'_>,
    activation: ScoreActivation,
    threshold: f32,
    image_size: (u32, u32),
    labels: &LabelMap,
) -> Vec<DetectedObject> {
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);
    let mut detections = Vec::new();

    for q in 0..head.num_queries {
        let Some(row) = head
            .logits
            .get(q * head.logits_per_query..(q + 1) * head.logits_per_query)
        else {
            break;
        };
        let Some(bbox) = head.boxes.get(q * 4..q * 4 + 4) else {
            break;
        };

        let Some((class_id, score)) = best_class(row, activation) else {
            continue;
        };
        if !(score > threshold) {
            continue;
        }

        let (cx, cy, w, h) = (bbox[0], bbox[1], bbox[2], bbox[3]);
        let x1 = round2(((cx - w / 2.0) * width).clamp(0.0, width));
        let y1 = round2(((cy - h / 2.0) * height).clamp(0.0, height));
        let x2 = round2(((cx + w / 2.0) * width).clamp(0.0, width));
        let y2 = round2(((cy + h / 2.0) * height).clamp(0.0, height));

        detections.push(DetectedObject {
            label: labels.name(class_id),
            score,
            bbox: [x1, y1, x2, y2],
        });
    }

    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    detections
}

/// Highest scoring real class for one query.
fn best_class(logits: &[f32], activation: ScoreActivation) -> Option<(usize, f32)> {
    let scores: Vec<f32> = match activation {
        ScoreActivation::Softmax => {
            let mut probs = math::softmax(logits);
            probs.pop();
            probs
        }
        ScoreActivation::Sigmoid => logits.iter().map(|&l| math::sigmoid(l)).collect(),
    };

    scores
        .into_iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
