//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Reject values no request could succeed with.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        check(limits.max_file_size_mb > 0, "limits.max_file_size_mb must be > 0")?;
        check(limits.max_image_dimension > 0, "limits.max_image_dimension must be > 0")?;
        check(limits.decode_timeout_ms > 0, "limits.decode_timeout_ms must be > 0")?;

        check(self.embedding.image_size > 0, "embedding.image_size must be > 0")?;
        check(
            self.embedding.max_text_length > 0,
            "embedding.max_text_length must be > 0",
        )?;

        let search = &self.search;
        check(
            (0.0..=1.0).contains(&search.default_alpha),
            "search.default_alpha must be between 0.0 and 1.0",
        )?;
        check(search.default_top_k > 0, "search.default_top_k must be > 0")?;

        check(
            self.classification.hypothesis_template.contains("{}"),
            "classification.hypothesis_template must contain {}",
        )?;

        let detection = &self.detection;
        check(
            (0.0..=1.0).contains(&detection.threshold),
            "detection.threshold must be between 0.0 and 1.0",
        )?;
        check(
            detection.shortest_edge > 0 && detection.shortest_edge <= detection.longest_edge,
            "detection.shortest_edge must be > 0 and <= detection.longest_edge",
        )?;

        check(
            self.segmentation.atr_input_size > 0 && self.segmentation.lip_input_size > 0,
            "segmentation input sizes must be > 0",
        )?;

        check(
            !self.credits.enabled || self.credits.timeout_ms > 0,
            "credits.timeout_ms must be > 0",
        )
    }
}

fn check(ok: bool, message: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.limits.max_file_size_mb = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size_mb"));
    }

    #[test]
    fn test_validate_rejects_zero_default_top_k() {
        let mut config = Config::default();
        config.search.default_top_k = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_top_k"));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.classification.hypothesis_template = "a photo".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hypothesis_template"));
    }

    #[test]
    fn test_validate_rejects_invalid_threshold() {
        let mut config = Config::default();
        config.detection.threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));

        config.detection.threshold = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }
}
