//! Label mask → colored overlay.

use std::collections::BTreeMap;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};

use crate::error::PipelineError;

use super::taxonomy::{label_color, parse_hex, Taxonomy, BACKGROUND_INDEX, FALLBACK_COLOR};

/// Per-pixel class indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LabelMask {
    /// Wrap raw indices, checking the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PipelineError> {
        if data.len() != width as usize * height as usize {
            return Err(PipelineError::Segmentation {
                message: format!(
                    "Mask buffer has {} values for {}x{}",
                    data.len(),
                    width,
                    height
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask filled with one index.
    pub fn filled(width: u32, height: u32, index: u8) -> Self {
        Self {
            width,
            height,
            data: vec![index; width as usize * height as usize],
        }
    }

    /// Distinct indices present, ascending.
    pub fn distinct_indices(&self) -> Vec<u8> {
        let mut present = [false; 256];
        for &idx in &self.data {
            present[idx as usize] = true;
        }
        (0..=255u8).filter(|&i| present[i as usize]).collect()
    }

    /// Labels present in the mask, ascending by index. Unknown indices are skipped.
    pub fn detected_labels(&self, taxonomy: &Taxonomy) -> Vec<String> {
        self.distinct_indices()
            .into_iter()
            .filter_map(|idx| taxonomy.label(idx))
            .map(str::to_string)
            .collect()
    }
}

/// A colored mask and the labels painted into it.
pub struct ColorMask {
    pub image: RgbImage,
    pub color_map: BTreeMap<String, String>,
}

/// Paint each mapped non-background index with its label's color.
///
/// Background and unmapped indices stay black and stay out of the color map.
pub fn render_color_mask(mask: &LabelMask, taxonomy: &Taxonomy) -> ColorMask {
    let mut palette: [Option<[u8; 3]>; 256] = [None; 256];
    let mut color_map = BTreeMap::new();

    for idx in mask.distinct_indices() {
        if idx == BACKGROUND_INDEX {
            continue;
        }
        let Some(label) = taxonomy.label(idx) else {
            continue;
        };
        let hex = label_color(label);
        let rgb = parse_hex(hex).or_else(|| parse_hex(FALLBACK_COLOR));
        palette[idx as usize] = rgb;
        color_map.insert(label.to_string(), hex.to_string());
    }

    let mut image = RgbImage::new(mask.width, mask.height);
    for (pixel, &idx) in image.pixels_mut().zip(&mask.data) {
        if let Some(rgb) = palette[idx as usize] {
            *pixel = Rgb(rgb);
        }
    }

    ColorMask { image, color_map }
}

/// PNG-encode an image and base64 it (standard alphabet).
pub fn encode_png_base64(image: &RgbImage) -> Result<String, PipelineError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| PipelineError::Segmentation {
            message: format!("Failed to encode mask as PNG: {e}"),
        })?;
    Ok(STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::taxonomy::{ATR, LIP};

    #[test]
    fn test_all_background_mask() {
        let mask = LabelMask::filled(5, 3, BACKGROUND_INDEX);
        assert_eq!(mask.detected_labels(&ATR), vec!["Background"]);

        let colored = render_color_mask(&mask, &ATR);
        assert!(colored.color_map.is_empty());
        assert!(colored.image.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_paints_mapped_indices_only() {
        // 0 background, 2 hair, 5 skirt (ATR), 40 unmapped
        let mask = LabelMask::new(2, 2, vec![0, 2, 5, 40]).unwrap();
        assert_eq!(mask.distinct_indices(), vec![0, 2, 5, 40]);
        assert_eq!(mask.detected_labels(&ATR), vec!["Background", "Hair", "Skirt"]);

        let colored = render_color_mask(&mask, &ATR);
        assert_eq!(colored.image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(colored.image.get_pixel(1, 0).0, [0x80, 0x3E, 0x75]);
        assert_eq!(colored.image.get_pixel(0, 1).0, [0x53, 0x37, 0x7A]);
        assert_eq!(colored.image.get_pixel(1, 1).0, [0, 0, 0]);

        let keys: Vec<&str> = colored.color_map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Hair", "Skirt"]);
        assert_eq!(colored.color_map["Hair"], "#803E75");
    }

    #[test]
    fn test_same_index_differs_by_taxonomy() {
        let mask = LabelMask::new(1, 1, vec![5]).unwrap();
        assert_eq!(mask.detected_labels(&ATR), vec!["Skirt"]);
        assert_eq!(mask.detected_labels(&LIP), vec!["Upper-clothes"]);
    }

    #[test]
    fn test_mask_buffer_must_match_dimensions() {
        assert!(LabelMask::new(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn test_base64_png_decodes_to_input_dimensions() {
        let mask = LabelMask::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        let encoded = encode_png_base64(&render_color_mask(&mask, &LIP).image).unwrap();

        let bytes = STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
