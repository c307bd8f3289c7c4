//! Image preprocessing for DETR-family detectors.
//!
//! - Resize so the shorter side hits `shortest_edge` unless that pushes the
//!   longer side past `longest_edge` (aspect ratio kept)
//! - Rescale to [0, 1], normalize with ImageNet mean/std
//! - Tensor layout: NCHW [1, 3, height, width]

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Output size for an input of `width × height`.
pub fn target_size(width: u32, height: u32, shortest_edge: u32, longest_edge: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let (short, long) = (w.min(h), w.max(h));

    let mut scale = shortest_edge as f32 / short;
    if long * scale > longest_edge as f32 {
        scale = longest_edge as f32 / long;
    }

    let new_w = ((w * scale).round() as u32).max(1);
    let new_h = ((h * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Preprocess an image for detection.
pub fn preprocess(image: &DynamicImage, shortest_edge: u32, longest_edge: u32) -> Array4<f32> {
    let (new_w, new_h) = target_size(image.width(), image.height(), shortest_edge, longest_edge);
    let rgb = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    let mut tensor = Array4::<f32>::zeros((1, 3, new_h as usize, new_w as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    tensor
}
