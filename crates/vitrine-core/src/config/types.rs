//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where ONNX models are stored
    pub model_dir: PathBuf,

    /// Directory holding the catalog metadata, the embedding index and catalog images
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.vitrine/models"),
            data_dir: PathBuf::from("~/.vitrine/data"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Allow any origin, method and header
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// CLIP embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Square input size of the vision encoder
    pub image_size: u32,

    /// Token sequence length of the text encoder
    pub max_text_length: usize,

    /// Output tensor carrying the projected image embedding
    pub image_output: String,

    /// Output tensor carrying the projected text embedding
    pub text_output: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "fashion-clip".to_string(),
            image_size: 224,
            max_text_length: 77,
            image_output: "image_embeds".to_string(),
            text_output: "text_embeds".to_string(),
        }
    }
}

/// Catalog search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Text weight used when the request does not set `alpha`
    pub default_alpha: f32,

    /// Result count used when the request does not set `top_k`
    pub default_top_k: usize,

    /// Catalog metadata file, relative to `general.data_dir`
    pub metadata_file: String,

    /// Embedding matrix file, relative to `general.data_dir`
    pub embeddings_file: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_alpha: 0.5,
            default_top_k: 6,
            metadata_file: "metadata.json".to_string(),
            embeddings_file: "embeddings.bin".to_string(),
        }
    }
}

/// Zero-shot classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Prompt each candidate label is rendered into; `{}` is replaced by the label
    pub hypothesis_template: String,

    /// Multiplier applied to cosine similarities before the softmax
    pub logit_scale: f32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            hypothesis_template: "This is a photo of {}.".to_string(),
            logit_scale: 100.0,
        }
    }
}

/// How raw detection logits become class scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreActivation {
    /// Softmax across classes; the last class is "no object" and is dropped
    Softmax,
    /// Independent sigmoid per class
    Sigmoid,
}

/// Object detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Minimum score for a detection to be reported
    pub threshold: f32,

    /// Target length of the shorter image side before inference
    pub shortest_edge: u32,

    /// Upper bound on the longer image side before inference
    pub longest_edge: u32,

    /// Logit activation used by the model head
    pub activation: ScoreActivation,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: "fashion-detection".to_string(),
            threshold: 0.3,
            shortest_edge: 800,
            longest_edge: 1333,
            activation: ScoreActivation::Softmax,
        }
    }
}

/// Human parsing settings for the two segmentation networks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// ATR network file name
    pub atr_file: String,

    /// ATR network square input size
    pub atr_input_size: u32,

    /// LIP network file name
    pub lip_file: String,

    /// LIP network square input size
    pub lip_input_size: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            model: "schp".to_string(),
            atr_file: "atr.onnx".to_string(),
            atr_input_size: 512,
            lip_file: "lip.onnx".to_string(),
            lip_input_size: 473,
        }
    }
}

/// Credit gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    /// Require a bearer token and a credit for every API call
    pub enabled: bool,

    /// Base URL of the PostgREST profile store
    pub api_url: String,

    /// Service role key (supports ${ENV_VAR} syntax)
    pub service_role_key: String,

    /// HS256 secret used to verify bearer tokens (supports ${ENV_VAR} syntax)
    pub jwt_secret: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Stored function that atomically consumes one credit
    pub rpc_function: String,

    /// Timeout for store calls in milliseconds
    pub timeout_ms: u64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "${SUPABASE_API_URL}".to_string(),
            service_role_key: "${SUPABASE_SERVICE_ROLE_KEY}".to_string(),
            jwt_secret: "${SUPABASE_JWT_SECRET}".to_string(),
            audience: "authenticated".to_string(),
            rpc_function: "consume_credit".to_string(),
            timeout_ms: 10000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Returns `None` for empty values and for references to unset variables.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
