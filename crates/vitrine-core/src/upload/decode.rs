//! Image decoding with format detection, validation, and timeout support.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::validate::Validator;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
    validator: Validator,
}

/// Result of decoding an upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded image, converted to RGB
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Upload size in bytes
    pub byte_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Decode an uploaded byte buffer with validation and timeout.
    ///
    /// The actual decode runs on the blocking pool.
    pub async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedImage, PipelineError> {
        self.validator.validate(&bytes)?;

        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);
        let max_dim = self.limits.max_image_dimension;

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || decode_bytes_sync(bytes, max_dim)).await
        })
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Decode {
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }
}

fn decode_bytes_sync(bytes: Vec<u8>, max_dim: u32) -> Result<DecodedImage, PipelineError> {
    let byte_size = bytes.len() as u64;
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::NotAnImage {
            message: format!("cannot detect image format: {}", e),
        })?;
    let format = reader.format().ok_or_else(|| PipelineError::NotAnImage {
        message: "cannot detect image format".to_string(),
    })?;

    let image = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => PipelineError::UnsupportedFormat {
            format: format_to_string(format),
        },
        other => PipelineError::Decode {
            message: other.to_string(),
        },
    })?;

    let (width, height) = image.dimensions();
    if width > max_dim || height > max_dim {
        return Err(PipelineError::ImageTooLarge {
            width,
            height,
            max_dim,
        });
    }
    if width == 0 || height == 0 {
        return Err(PipelineError::Decode {
            message: "image has no pixels".to_string(),
        });
    }

    let image = match image {
        rgb @ DynamicImage::ImageRgb8(_) => rgb,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        byte_size,
    })
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
