//! Error types for Vitrine.
//!
//! Errors are organized by stage so callers can tell a bad upload apart from a
//! failing model without string matching. The HTTP layer relies on
//! [`PipelineError::is_client_error`] to pick a status code.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Vitrine operations.
#[derive(Error, Debug)]
pub enum VitrineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The payload is not an image at all
    #[error("Uploaded file is not a valid image: {message}")]
    NotAnImage { message: String },

    /// The payload looks like an image but failed to decode
    #[error("Failed to open image: {message}")]
    Decode { message: String },

    /// Image format recognized but not supported by the decoder
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {width}x{height} > {max_dim}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Upload exceeds size limit
    #[error("Upload too large: {size_mb}MB > {max_mb}MB")]
    PayloadTooLarge { size_mb: u64, max_mb: u64 },

    /// A request field is missing or out of range
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// A model could not be loaded or produced unusable output
    #[error("Model error: {message}")]
    Model { message: String },

    /// Embedding generation failed
    #[error("Embedding failed: {message}")]
    Embedding { message: String },

    /// Vector index load or query failed
    #[error("Index error: {message}")]
    Index { message: String },

    /// Catalog metadata could not be loaded or does not match the index
    #[error("Catalog error for {path}: {message}")]
    Catalog { path: PathBuf, message: String },

    /// Object detection failed
    #[error("Detection failed: {message}")]
    Detection { message: String },

    /// Human parsing or mask compositing failed
    #[error("Segmentation failed: {message}")]
    Segmentation { message: String },
}

impl PipelineError {
    /// Whether the error was caused by the caller's input rather than by a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::NotAnImage { .. }
                | PipelineError::Decode { .. }
                | PipelineError::UnsupportedFormat { .. }
                | PipelineError::ImageTooLarge { .. }
                | PipelineError::PayloadTooLarge { .. }
                | PipelineError::InvalidRequest(_)
        )
    }
}

/// Credit gate failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreditError {
    /// No `Authorization: Bearer` header
    #[error("Missing bearer token")]
    MissingToken,

    /// Token failed signature, audience or expiry checks
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The user has no credits left
    #[error("No credits remaining")]
    Exhausted,

    /// No profile exists for the token's subject
    #[error("Unknown user")]
    UnknownUser,

    /// The profile store could not be reached or answered unexpectedly
    #[error("Credit store error: {0}")]
    Upstream(String),
}

/// Convenience type alias for Vitrine results.
pub type Result<T> = std::result::Result<T, VitrineError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
