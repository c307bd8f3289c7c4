//! Core data types returned by the Vitrine services.
//!
//! These serialize directly into the HTTP response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One catalog item, positioned like its row in the embedding index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Display label of the item
    pub label: String,

    /// Image path, relative to the data directory unless absolute
    #[serde(rename = "path")]
    pub image_path: String,
}

/// A ranked retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub label: String,
    pub image_path: String,
    /// Cosine similarity between the query and the catalog item
    pub score: f32,
}

/// A candidate label and its classification probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// An object found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub score: f32,
    /// `[x1, y1, x2, y2]` in pixels of the original image
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
}

/// Output of the segmentation compositing step for both taxonomies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationReport {
    /// Labels present in the ATR mask, in ascending index order
    pub detected_labels_atr: Vec<String>,

    /// Labels present in the LIP mask, in ascending index order
    pub detected_labels_lip: Vec<String>,

    /// Base64 PNG of the ATR color mask
    pub mask_color_atr_base64: String,

    /// Base64 PNG of the LIP color mask
    pub mask_color_lip_base64: String,

    /// Label → `#RRGGBB` for every label painted in the ATR mask
    pub color_map_atr: BTreeMap<String, String>,

    /// Label → `#RRGGBB` for every label painted in the LIP mask
    pub color_map_lip: BTreeMap<String, String>,
}
