//! Cheap checks on an upload before it reaches the decoder.

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates uploaded bytes before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - Upload is within the size limit
    /// - Upload starts with the magic bytes of a known image format
    pub fn validate(&self, bytes: &[u8]) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(PipelineError::PayloadTooLarge {
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        if bytes.len() < 4 {
            return Err(PipelineError::NotAnImage {
                message: "file too small to be an image".to_string(),
            });
        }

        if !is_valid_image_header(bytes) {
            return Err(PipelineError::NotAnImage {
                message: "unrecognized image signature".to_string(),
            });
        }

        Ok(())
    }
}

/// Check if the leading bytes match a known image format.
pub fn is_valid_image_header(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // JPEG: FF D8 FF
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    // PNG: 89 50 4E 47
    if header.starts_with(&[0x89, b'P', b'N', b'G']) {
        return true;
    }

    // GIF: GIF8
    if header.starts_with(b"GIF8") {
        return true;
    }

    // WebP: RIFF....WEBP
    if header.starts_with(b"RIFF") {
        if header.len() >= 12 {
            return &header[8..12] == b"WEBP";
        }
        return true;
    }

    // BMP: BM
    if header.starts_with(b"BM") {
        return true;
    }

    // TIFF: II (little-endian) or MM (big-endian) followed by version 42
    if header.starts_with(&[b'I', b'I', 0x2A, 0x00]) || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
    {
        return true;
    }

    // HEIC/HEIF/AVIF: ftyp box at offset 4
    header.len() >= 12 && &header[4..8] == b"ftyp"
}
