//! Configuration management for Vitrine.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Vitrine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Upload limits
    pub limits: LimitsConfig,

    /// Embedding model settings
    pub embedding: EmbeddingConfig,

    /// Catalog search settings
    pub search: SearchConfig,

    /// Zero-shot classification settings
    pub classification: ClassificationConfig,

    /// Object detection settings
    pub detection: DetectionConfig,

    /// Human parsing settings
    pub segmentation: SegmentationConfig,

    /// Credit gate settings
    pub credits: CreditsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.vitrine.vitrine/config.toml
    /// - Linux: ~/.config/vitrine/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\vitrine\config\config.toml
    ///
    /// Falls back to ~/.vitrine/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "vitrine", "vitrine")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".vitrine").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand(&self.general.model_dir)
    }

    /// Get the resolved data directory path (with ~ expansion).
    pub fn data_dir(&self) -> PathBuf {
        expand(&self.general.data_dir)
    }

    /// Path of the catalog metadata file.
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir().join(&self.search.metadata_file)
    }

    /// Path of the embedding matrix file.
    pub fn embeddings_path(&self) -> PathBuf {
        self.data_dir().join(&self.search.embeddings_file)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.default_top_k, 6);
        assert_eq!(config.search.default_alpha, 0.5);
        assert_eq!(config.detection.threshold, 0.3);
        assert!(!config.credits.enabled);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[segmentation]"));
        assert!(toml.contains("[credits]"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\n\n[search]\ndefault_top_k = 3").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.search.default_top_k, 3);
        assert_eq!(config.search.default_alpha, 0.5);
        assert_eq!(config.segmentation.lip_input_size, 473);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\ndefault_alpha = 1.5").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("default_alpha"));
    }

    #[test]
    fn test_data_paths_join_data_dir() {
        let mut config = Config::default();
        config.general.data_dir = PathBuf::from("/srv/catalog");
        assert_eq!(
            config.metadata_path(),
            PathBuf::from("/srv/catalog/metadata.json")
        );
        assert_eq!(
            config.embeddings_path(),
            PathBuf::from("/srv/catalog/embeddings.bin")
        );
    }
}
